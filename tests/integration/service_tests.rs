//! Integration tests for the IrrigationService → channel task → board path.

use std::sync::Arc;

use autogarden::adapters::time::Esp32TimeAdapter;
use autogarden::app::commands::AppCommand;
use autogarden::app::events::AppEvent;
use autogarden::app::ports::{BoardPort, SettingsPort};
use autogarden::app::service::IrrigationService;
use autogarden::channel::{ChannelMode, ChannelSettings};
use autogarden::config::ControllerConfig;
use autogarden::error::Error;

use crate::mock_hw::{MemorySettings, MockBoard, RecordingSink, VirtualClock, wait_for};

type Service = IrrigationService<MockBoard, MemorySettings, VirtualClock>;

fn make_service(settings: MemorySettings) -> (Service, RecordingSink) {
    let clock = VirtualClock::new();
    let board = Arc::new(MockBoard::new(clock.clone()));
    let service = IrrigationService::new(board, settings, clock, ControllerConfig::default());
    (service, RecordingSink::new())
}

fn all_manual() -> MemorySettings {
    (1..=4).fold(MemorySettings::new(), |s, ch| s.with(ch, ChannelMode::Manual, 0.0, 0.0))
}

fn drain(service: &Service) {
    for ch in 1..=4 {
        assert!(wait_for(|| !service.is_running(ch).unwrap()), "ch{ch} never exited");
    }
}

#[test]
fn manual_start_drives_motor_and_stop_all_releases_it() {
    let (mut service, mut sink) = make_service(all_manual());

    assert_eq!(service.start_event(1, &mut sink), Ok(true));
    assert!(wait_for(|| service.board().is_on(1)));
    assert!(service.is_running(1).unwrap());
    assert_eq!(sink.started(), 1);

    service.stop_all_events(&mut sink);
    drain(&service);
    assert_eq!(service.board().actuator_state(1), Ok(false));
    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::StopRequested(None))));
}

#[test]
fn stop_all_leaves_every_channel_off() {
    let (mut service, mut sink) = make_service(all_manual());
    for ch in 1..=4 {
        assert_eq!(service.start_event(ch, &mut sink), Ok(true));
    }
    assert!(wait_for(|| (1..=4).all(|ch| service.board().is_on(ch))));

    service.stop_all_events(&mut sink);
    drain(&service);
    for ch in 1..=4 {
        assert_eq!(service.board().actuator_state(ch), Ok(false), "ch{ch}");
    }
}

#[test]
fn stop_all_on_a_real_clock_returns_with_every_motor_off() {
    let board = Arc::new(MockBoard::new(VirtualClock::new()));
    let mut service = IrrigationService::new(
        Arc::clone(&board),
        all_manual(),
        Esp32TimeAdapter::new(),
        ControllerConfig::default(),
    );
    let mut sink = RecordingSink::new();

    for round in 0..5 {
        for ch in 1..=4 {
            assert_eq!(service.start_event(ch, &mut sink), Ok(true), "round {round} ch{ch}");
        }
        assert!(wait_for(|| (1..=4).all(|ch| board.is_on(ch))));

        // Two real polling ticks pass inside stop_all_events.
        service.stop_all_events(&mut sink);
        for ch in 1..=4 {
            assert_eq!(board.actuator_state(ch), Ok(false), "round {round} ch{ch}");
        }

        for ch in 1..=4 {
            assert!(wait_for(|| !service.is_running(ch).unwrap()));
        }
    }
}

#[test]
fn genius_mode_creates_no_task_and_touches_nothing() {
    let settings = MemorySettings::new().with(3, ChannelMode::Genius, 1_000.0, 1.0);
    let (mut service, mut sink) = make_service(settings);

    assert_eq!(service.start_event(3, &mut sink), Ok(false));
    assert!(!service.is_running(3).unwrap());
    assert!(service.board().calls.lock().unwrap().is_empty());
    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::EventSkipped {
            mode: ChannelMode::Genius,
            ..
        }]
    ));
}

#[test]
fn invalid_channels_are_rejected_without_side_effects() {
    let (mut service, mut sink) = make_service(all_manual());

    assert_eq!(service.start_event(0, &mut sink), Err(Error::InvalidChannel(0)));
    assert_eq!(service.start_event(5, &mut sink), Err(Error::InvalidChannel(5)));
    assert_eq!(service.stop_event(9, &mut sink), Err(Error::InvalidChannel(9)));
    assert_eq!(service.is_running(0), Err(Error::InvalidChannel(0)));
    assert!(sink.events.is_empty());
    assert!(service.board().calls.lock().unwrap().is_empty());
}

#[test]
fn second_start_on_a_running_channel_is_refused() {
    let (mut service, mut sink) = make_service(all_manual());

    assert_eq!(service.start_event(2, &mut sink), Ok(true));
    assert_eq!(service.start_event(2, &mut sink), Err(Error::ChannelBusy(2)));
    assert_eq!(sink.started(), 1);

    service.stop_event(2, &mut sink).unwrap();
    assert!(wait_for(|| !service.is_running(2).unwrap()));
    assert_eq!(service.start_event(2, &mut sink), Ok(true), "free again after exit");

    service.stop_all_events(&mut sink);
    drain(&service);
}

#[test]
fn stopping_one_channel_leaves_the_others_running() {
    let (mut service, mut sink) = make_service(all_manual());
    service.start_event(1, &mut sink).unwrap();
    service.start_event(4, &mut sink).unwrap();
    assert!(wait_for(|| service.board().is_on(1) && service.board().is_on(4)));

    service.stop_event(1, &mut sink).unwrap();
    assert!(wait_for(|| !service.is_running(1).unwrap()));
    assert!(!service.board().is_on(1));
    assert!(service.board().is_on(4));
    assert!(service.is_running(4).unwrap());

    service.stop_all_events(&mut sink);
    drain(&service);
}

#[test]
fn faulted_board_refuses_commands_but_task_still_stops() {
    let (mut service, mut sink) = make_service(all_manual());
    service.board().set_fault(true);

    assert_eq!(service.start_event(1, &mut sink), Ok(true));
    let status = service.status();
    assert!(status.faulted);
    assert!(!status.channels[0].status);

    service.stop_all_events(&mut sink);
    drain(&service);
    assert!(service.board().history(1).is_empty());
}

#[test]
fn settings_are_snapshotted_at_start() {
    let settings = MemorySettings::new().with(1, ChannelMode::Manual, 0.0, 0.0);
    let (mut service, mut sink) = make_service(settings);
    service.start_event(1, &mut sink).unwrap();
    assert!(wait_for(|| service.board().is_on(1)));

    let update = AppCommand::UpdateSettings {
        channel: 1,
        settings: ChannelSettings::new(ChannelMode::Timed, 60_000.0, 1_000.0),
    };
    service.handle_command(update, &mut sink).unwrap();
    assert_eq!(service.settings().mode(1), ChannelMode::Timed);

    // Timed would switch the motor off for 59s first; the running manual
    // event keeps holding it on.
    let now = service.board().history(1).len();
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert!(service.board().is_on(1));
    assert_eq!(service.board().history(1).len(), now);

    service.handle_command(AppCommand::StopAll, &mut sink).unwrap();
    drain(&service);
}

#[test]
fn update_settings_rejects_invalid_channel() {
    let (mut service, mut sink) = make_service(MemorySettings::new());
    let cmd = AppCommand::UpdateSettings {
        channel: 7,
        settings: ChannelSettings::new(ChannelMode::Smart, 1.0, 1.0),
    };
    assert_eq!(service.handle_command(cmd, &mut sink), Err(Error::InvalidChannel(7)));
    assert!(sink.events.is_empty());
}

#[test]
fn status_report_covers_sensors_and_every_channel() {
    let settings = all_manual().with(2, ChannelMode::Smart, 5_000.0, 2.0);
    let (mut service, mut sink) = make_service(settings);
    service.board().pour(3.5);
    service.start_event(1, &mut sink).unwrap();
    assert!(wait_for(|| service.board().is_on(1)));

    service.handle_command(AppCommand::ReportStatus, &mut sink).unwrap();
    let Some(AppEvent::Status(status)) = sink.events.last() else {
        panic!("no status emitted");
    };
    assert_eq!(status.temperature, 21.5);
    assert_eq!(status.moisture, 612);
    assert_eq!(status.water, 3.5);
    assert!(!status.faulted);
    assert!(status.channels[0].status && status.channels[0].running);
    assert_eq!(status.channels[1].mode, ChannelMode::Smart);
    assert_eq!(status.channels[1].frequency, 5_000.0);
    assert!(!status.channels[1].running);

    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json["temp"], 21.5);
    assert_eq!(json["moisture"], 612);
    assert_eq!(json["water"], 3.5);
    assert_eq!(json["ch1"]["status"], true);
    assert_eq!(json["ch2"]["channel"], 2);
    assert_eq!(json["ch2"]["goal"], 2.0);
    assert!(json["ch4"].is_object());
    assert!(json.get("temperature").is_none() && json.get("channels").is_none());

    service.stop_all_events(&mut sink);
    drain(&service);
}
