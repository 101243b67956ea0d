//! Unified error type for the irrigation controller.
//!
//! Every fallible core operation returns [`Result`].  All variants are
//! `Copy` so they can be handed across task boundaries and logged without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Channel id outside `1..=CHANNEL_COUNT`.  Always checked first; the
    /// carried value is the rejected raw id.
    InvalidChannel(u8),
    /// The motor driver's fault line is asserted.  Actuator commands are
    /// rejected, not queued or retried.
    FaultCondition,
    /// The environmental sensor did not answer its probe at start-up.
    SensorUnavailable,
    /// A watering task is still alive on this channel.
    ChannelBusy(u8),
    /// The scheduler refused to create a channel task.
    TaskSpawn,
    /// Non-volatile storage returned an error code.
    Storage(i32),
    /// A configuration field failed range validation.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel(raw) => write!(f, "invalid channel {raw}"),
            Self::FaultCondition => write!(f, "motor driver fault asserted"),
            Self::SensorUnavailable => write!(f, "soil sensor unavailable"),
            Self::ChannelBusy(raw) => write!(f, "channel {raw} already has a running event"),
            Self::TaskSpawn => write!(f, "channel task could not be created"),
            Self::Storage(rc) => write!(f, "storage error (rc={rc})"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
