//! Port traits — the hexagonal boundary between controller logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ IrrigationService / channel tasks
//! ```
//!
//! Channel tasks run concurrently and share one board, so [`BoardPort`]
//! takes `&self` and must be `Send + Sync`.  Every other port is only
//! touched from the thread that owns the service.

use core::time::Duration;

use crate::channel::{ChannelMode, ChannelSettings};
use crate::error::Result;

// ───────────────────────────────────────────────────────────────
// Board port (motor outputs, fault line, flow, soil sensor)
// ───────────────────────────────────────────────────────────────

/// The motor board as seen by channel tasks and the service.
///
/// Channel ids are raw so that range validation happens here, before any
/// hardware write.
pub trait BoardPort: Send + Sync {
    /// Drive one channel's motor output.
    ///
    /// Fails with `InvalidChannel` for ids outside the board, and with
    /// `FaultCondition` while the driver reports a fault; in both cases the
    /// output and the recorded state are untouched.  Returns the applied
    /// state on success.
    fn set_actuator(&self, channel: u8, enable: bool) -> Result<bool>;

    /// Last commanded state of a channel (not a live pin read).
    fn actuator_state(&self, channel: u8) -> Result<bool>;

    /// Read the driver's fault line.
    fn is_faulted(&self) -> bool;

    /// Cumulative flow-meter pulses since boot.  Never decreases.
    fn delivered_pulses(&self) -> u64;

    /// Cumulative delivered volume since boot.  Never decreases.
    fn delivered_volume(&self) -> f64;

    /// Whether the soil sensor answered its start-up probe.
    fn sensor_connected(&self) -> bool;

    /// Soil temperature (°C), or 0 when the sensor is unavailable.
    fn temperature(&self) -> f32;

    /// Capacitive moisture reading, or 0 when the sensor is unavailable.
    fn moisture(&self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Settings port (persistent per-channel settings)
// ───────────────────────────────────────────────────────────────

/// Per-channel settings store.
///
/// Invalid channels read back as Manual/0/0 and writes to them are
/// ignored; callers get no error signal from this boundary.
pub trait SettingsPort {
    fn mode(&self, channel: u8) -> ChannelMode;

    fn frequency(&self, channel: u8) -> f64;

    fn goal(&self, channel: u8) -> f64;

    fn set_settings(&mut self, channel: u8, settings: ChannelSettings);

    /// Snapshot all three fields of a channel.
    fn settings(&self, channel: u8) -> ChannelSettings {
        ChannelSettings {
            mode: self.mode(channel),
            frequency: self.frequency(channel),
            goal: self.goal(channel),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port (monotonic time + task suspension)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock handed to every channel task.
pub trait Clock: Clone + Send + 'static {
    /// Milliseconds since boot, 64-bit so it never wraps in practice.
    fn now_ms(&self) -> u64;

    /// Suspend the calling task, yielding the CPU.
    fn sleep(&self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (service → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The service emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
