//! Application service — the hexagonal core.
//!
//! [`IrrigationService`] owns the per-channel stop signals and decides
//! which watering task, if any, a start request produces.  The board is
//! shared with every running task; settings, clock and event sink are only
//! touched from the thread that owns the service.
//!
//! ```text
//!  SettingsPort ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                   │  IrrigationService   │
//!         Clock ──▶ │  signals · lifecycle │ ──spawn──▶ channel task ×4
//!                   └──────────────────────┘                 │
//!                              │                             ▼
//!                              └────────────────────────▶ BoardPort
//! ```

use std::sync::Arc;

use log::{error, info, warn};

use crate::channel::{ChannelId, ChannelSettings};
use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::runtime::{self, ChannelSignals, Program, WaterEvent};

use super::commands::AppCommand;
use super::events::{AppEvent, ChannelStatus, ControllerStatus};
use super::ports::{BoardPort, Clock, EventSink, SettingsPort};

// ───────────────────────────────────────────────────────────────
// IrrigationService
// ───────────────────────────────────────────────────────────────

/// Event lifecycle manager for all channels.
pub struct IrrigationService<B, S, C> {
    board: Arc<B>,
    settings: S,
    clock: C,
    signals: ChannelSignals,
    config: ControllerConfig,
}

impl<B, S, C> IrrigationService<B, S, C>
where
    B: BoardPort + 'static,
    S: SettingsPort,
    C: Clock,
{
    pub fn new(board: Arc<B>, settings: S, clock: C, config: ControllerConfig) -> Self {
        Self {
            board,
            settings,
            clock,
            signals: ChannelSignals::new(),
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start a watering event on `channel` using its stored settings.
    ///
    /// The settings are read once here; later changes apply to the next
    /// start.  Returns `Ok(false)` when the channel's mode has no program
    /// (nothing is driven, no task is created), `Ok(true)` once the task
    /// exists.
    pub fn start_event(&mut self, channel: u8, sink: &mut impl EventSink) -> Result<bool> {
        let id = ChannelId::new(channel)?;
        let snapshot = self.settings.settings(channel);

        let Some(program) = Program::from_settings(&snapshot, &self.config) else {
            info!("{}: mode {:?} has no program, not started", id, snapshot.mode);
            sink.emit(&AppEvent::EventSkipped {
                channel: id,
                mode: snapshot.mode,
            });
            return Ok(false);
        };

        let slot = self.signals.slot(id);
        if !slot.try_claim() {
            warn!("{}: start refused, event already running", id);
            return Err(Error::ChannelBusy(channel));
        }
        slot.arm();

        let event = WaterEvent::new(id, program);
        let spawned = runtime::spawn_event(
            Arc::clone(&self.board),
            Arc::clone(slot),
            self.clock.clone(),
            event,
            &self.config,
        );
        if let Err(e) = spawned {
            error!("{}: task spawn failed ({})", id, e);
            slot.request_stop();
            slot.finish();
            return Err(Error::TaskSpawn);
        }

        info!(
            "{}: {:?} event started (freq={} goal={})",
            id, snapshot.mode, snapshot.frequency, snapshot.goal
        );
        sink.emit(&AppEvent::EventStarted {
            channel: id,
            mode: snapshot.mode,
        });
        Ok(true)
    }

    /// Signal one channel's task to stop.  Returns without waiting.
    pub fn stop_event(&mut self, channel: u8, sink: &mut impl EventSink) -> Result<()> {
        let id = ChannelId::new(channel)?;
        self.signals.slot(id).request_stop();
        info!("{}: stop requested", id);
        sink.emit(&AppEvent::StopRequested(Some(id)));
        Ok(())
    }

    /// Signal every channel to stop, then wait the configured number of
    /// polling ticks for the tasks to switch their motors off.
    ///
    /// Best effort: a task that misses the window is not waited for.
    pub fn stop_all_events(&mut self, sink: &mut impl EventSink) {
        self.signals.stop_all();
        sink.emit(&AppEvent::StopRequested(None));
        self.clock.sleep(self.config.drain_delay());
        if self.signals.any_running() {
            warn!("stop all: some tasks still draining");
        } else {
            info!("stop all: every channel idle");
        }
    }

    /// Persist new settings.  A running event keeps its snapshot.
    pub fn update_settings(
        &mut self,
        channel: u8,
        settings: ChannelSettings,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let id = ChannelId::new(channel)?;
        self.settings.set_settings(channel, settings);
        sink.emit(&AppEvent::SettingsUpdated {
            channel: id,
            settings,
        });
        Ok(())
    }

    // ── Command dispatch ──────────────────────────────────────

    /// Interpret one inbound command.
    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            AppCommand::StartEvent(channel) => self.start_event(channel, sink).map(|_| ()),
            AppCommand::StopEvent(channel) => self.stop_event(channel, sink),
            AppCommand::StopAll => {
                self.stop_all_events(sink);
                Ok(())
            }
            AppCommand::UpdateSettings { channel, settings } => {
                self.update_settings(channel, settings, sink)
            }
            AppCommand::ReportStatus => {
                sink.emit(&AppEvent::Status(self.status()));
                Ok(())
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot of sensors, delivered water, and every channel.
    pub fn status(&self) -> ControllerStatus {
        let channels = ChannelId::ALL.map(|channel| {
            let settings = self.settings.settings(channel.get());
            ChannelStatus {
                channel,
                mode: settings.mode,
                frequency: settings.frequency,
                goal: settings.goal,
                status: self.board.actuator_state(channel.get()).unwrap_or(false),
                running: self.signals.slot(channel).is_running(),
            }
        });
        ControllerStatus {
            temperature: self.board.temperature(),
            moisture: self.board.moisture(),
            water: self.board.delivered_volume(),
            faulted: self.board.is_faulted(),
            channels,
        }
    }

    /// Whether a task is alive on `channel`.
    pub fn is_running(&self, channel: u8) -> Result<bool> {
        let id = ChannelId::new(channel)?;
        Ok(self.signals.slot(id).is_running())
    }

    pub fn board(&self) -> &Arc<B> {
        &self.board
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }
}
