//! Channel tasks driven on a real thread against a virtual clock.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use autogarden::app::ports::Clock;
use autogarden::channel::{ChannelId, ChannelMode, ChannelSettings};
use autogarden::config::ControllerConfig;
use autogarden::runtime::{ChannelSlot, Program, WaterEvent, run_event};

use crate::mock_hw::{MockBoard, VirtualClock, wait_for};

const TICK: Duration = Duration::from_millis(30);

struct Harness {
    clock: VirtualClock,
    board: Arc<MockBoard>,
    slot: Arc<ChannelSlot>,
    task: Option<JoinHandle<()>>,
}

impl Harness {
    fn start(mode: ChannelMode, frequency: f64, goal: f64) -> Self {
        Self::start_with(mode, frequency, goal, &ControllerConfig::default())
    }

    fn start_with(mode: ChannelMode, frequency: f64, goal: f64, config: &ControllerConfig) -> Self {
        let clock = VirtualClock::new();
        let board = Arc::new(MockBoard::new(clock.clone()));
        let slot = Arc::new(ChannelSlot::new());
        assert!(slot.try_claim());
        slot.arm();

        let settings = ChannelSettings::new(mode, frequency, goal);
        let program = Program::from_settings(&settings, config).expect("mode has a program");
        let event = WaterEvent::new(ChannelId::new(1).unwrap(), program);

        let task = {
            let (board, slot, clock) = (Arc::clone(&board), Arc::clone(&slot), clock.clone());
            std::thread::spawn(move || run_event(board.as_ref(), &slot, &clock, event, TICK))
        };
        Self {
            clock,
            board,
            slot,
            task: Some(task),
        }
    }

    fn run_until(&self, ms: u64) {
        assert!(wait_for(|| self.clock.now_ms() >= ms), "task stalled before {ms}ms");
    }

    /// Raise stop and join.  Returns the virtual time just after the stop.
    fn stop(&mut self) -> u64 {
        self.slot.request_stop();
        let after = self.clock.now_ms();
        if let Some(task) = self.task.take() {
            task.join().unwrap();
        }
        after
    }
}

#[test]
fn manual_task_is_on_until_stop_then_off_within_a_tick() {
    let mut h = Harness::start(ChannelMode::Manual, 0.0, 0.0);
    assert!(wait_for(|| h.board.is_on(1)));
    h.run_until(3_000);
    assert!(h.board.is_on(1), "still holding");

    let stopped_at = h.stop();
    let last = *h.board.history(1).last().unwrap();
    assert!(!last.on);
    assert!(last.at_ms <= stopped_at + 30, "released at {} after stop at {}", last.at_ms, stopped_at);
    assert!(!h.slot.is_running());
}

#[test]
fn timed_task_duty_cycle_matches_settings() {
    let mut h = Harness::start(ChannelMode::Timed, 10_000.0, 4_000.0);
    h.run_until(25_000);
    h.stop();

    let t = h.board.transitions(1);
    assert!(t.len() >= 4, "transitions: {t:?}");
    let (on1, off1, on2) = (t[0], t[1], t[2]);
    assert!(on1.1 && !off1.1 && on2.1);
    assert!((6_000..6_030).contains(&on1.0), "first on at {}", on1.0);
    assert!((4_000..=4_030).contains(&(off1.0 - on1.0)), "on for {}", off1.0 - on1.0);
    assert!((6_000..=6_030).contains(&(on2.0 - off1.0)), "off for {}", on2.0 - off1.0);
    assert!(!h.board.is_on(1), "released on stop");
}

#[test]
fn smart_task_fills_goal_volume_then_rests() {
    let mut h = Harness::start(ChannelMode::Smart, 5_000.0, 2.0);
    assert!(wait_for(|| h.board.is_on(1)));

    h.board.pour(1.5);
    let t0 = h.clock.now_ms();
    h.run_until(t0 + 300);
    assert!(h.board.is_on(1), "goal not reached yet");

    h.board.pour(0.5);
    assert!(wait_for(|| !h.board.is_on(1)));
    assert!(wait_for(|| h.board.transitions(1).len() >= 3), "second fill never started");
    h.stop();

    let t = h.board.transitions(1);
    let rest = t[2].0 - t[1].0;
    assert!((5_000..=5_030).contains(&rest), "rested {rest}ms");
}

#[test]
fn smart_fill_ceiling_rests_a_dry_channel() {
    let config = ControllerConfig {
        smart_max_on_ms: Some(1_000),
        ..ControllerConfig::default()
    };
    let mut h = Harness::start_with(ChannelMode::Smart, 2_000.0, 5.0, &config);
    h.run_until(4_000);
    h.stop();

    let t = h.board.transitions(1);
    assert!(t.len() >= 3, "transitions: {t:?}");
    let fill = t[1].0 - t[0].0;
    assert!((1_000..=1_030).contains(&fill), "filled for {fill}ms");
}

#[test]
fn zero_length_timed_cycle_still_stops() {
    let mut h = Harness::start(ChannelMode::Timed, 0.0, 0.0);
    h.run_until(300);
    h.stop();
    assert!(!h.board.is_on(1));
    assert!(!h.slot.is_running());
}

#[test]
fn fault_at_start_keeps_motor_off_and_task_exits_cleanly() {
    let clock = VirtualClock::new();
    let board = MockBoard::new(clock.clone());
    board.set_fault(true);
    let slot = ChannelSlot::new();
    assert!(slot.try_claim());
    slot.arm();

    let event = WaterEvent::new(ChannelId::new(2).unwrap(), Program::Manual);
    std::thread::scope(|s| {
        let task = s.spawn(|| run_event(&board, &slot, &clock, event, TICK));
        assert!(wait_for(|| clock.now_ms() >= 300));
        slot.request_stop();
        task.join().unwrap();
    });

    assert!(board.history(2).is_empty(), "every command was refused");
    assert!(!slot.is_running());
    board.set_fault(false);
    assert!(!board.is_on(2));
}
