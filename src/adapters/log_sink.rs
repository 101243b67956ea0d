//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production).  Status snapshots are rendered as
//! one JSON line, the same document a web front end would poll.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::EventStarted { channel, mode } => {
                info!("EVENT | {} started ({:?})", channel, mode);
            }
            AppEvent::EventSkipped { channel, mode } => {
                info!("EVENT | {} not started, {:?} has no program", channel, mode);
            }
            AppEvent::StopRequested(Some(channel)) => {
                info!("STOP  | {}", channel);
            }
            AppEvent::StopRequested(None) => {
                info!("STOP  | all channels");
            }
            AppEvent::SettingsUpdated { channel, settings } => {
                info!(
                    "CONF  | {} mode={:?} freq={} goal={}",
                    channel, settings.mode, settings.frequency, settings.goal
                );
            }
            AppEvent::Status(status) => match serde_json::to_string(status) {
                Ok(json) => info!("STATUS| {}", json),
                Err(e) => warn!("STATUS| not serialisable ({})", e),
            },
        }
    }
}
