//! Inbound commands to the irrigation service.
//!
//! These represent requests from the outside world (web UI, serial console)
//! that [`IrrigationService`](super::service::IrrigationService) interprets.
//! Channel numbers are raw; the service validates them.

use crate::channel::ChannelSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Arm a channel using its stored settings.
    StartEvent(u8),

    /// Halt one channel.
    StopEvent(u8),

    /// Halt every channel and wait for tasks to drain.
    StopAll,

    /// Persist new settings for a channel.  Takes effect on the next start.
    UpdateSettings { channel: u8, settings: ChannelSettings },

    /// Emit a status snapshot.
    ReportStatus,
}
