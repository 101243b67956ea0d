//! Controller configuration parameters
//!
//! All tunable timing and calibration values for the irrigation core.
//! Per-channel watering settings are not here; they belong to the
//! settings service (see [`crate::adapters::nvs`]).

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Channel tasks ---
    /// Interval at which a running task re-checks its stop signal (ms)
    pub poll_tick_ms: u32,
    /// Ticks `stop_all_events` waits for tasks to drain
    pub drain_ticks: u32,
    /// Upper bound on a Smart-mode fill phase (ms).  `None` keeps filling
    /// until the goal volume is reached or the event is stopped.
    pub smart_max_on_ms: Option<u64>,
    /// Stack size for each channel task (KiB)
    pub task_stack_kb: usize,
    /// Scheduler priority for channel tasks
    pub task_priority: u8,

    // --- Flow sensor ---
    /// Flow-meter pulses per delivered volume unit
    pub pulses_per_unit: f64,

    // --- Soil sensor ---
    /// Period of the timer that marks cached readings stale (ms)
    pub sensor_refresh_ms: u32,
    /// 7-bit I2C address of the seesaw soil sensor
    pub soil_sensor_addr: u8,
    /// I2C bus clock (Hz)
    pub i2c_baudrate_hz: u32,

    // --- Reporting ---
    /// Status report interval of the main loop (ms)
    pub status_interval_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Channel tasks
            poll_tick_ms: 30,
            drain_ticks: 2,
            smart_max_on_ms: None,
            task_stack_kb: 4,
            task_priority: 5,

            // Flow sensor
            pulses_per_unit: 450.0,

            // Soil sensor
            sensor_refresh_ms: 200,
            soil_sensor_addr: 0x36,
            i2c_baudrate_hz: 100_000,

            // Reporting
            status_interval_ms: 1000,
        }
    }
}

impl ControllerConfig {
    /// Polling tick as a [`Duration`].
    pub fn poll_tick(&self) -> Duration {
        Duration::from_millis(self.poll_tick_ms as u64)
    }

    /// Time `stop_all_events` waits after raising every stop signal.
    pub fn drain_delay(&self) -> Duration {
        self.poll_tick() * self.drain_ticks
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.poll_tick_ms) {
            return Err(Error::Config("poll_tick_ms must be 1–1000"));
        }
        if !(1..=10).contains(&self.drain_ticks) {
            return Err(Error::Config("drain_ticks must be 1–10"));
        }
        if self.smart_max_on_ms == Some(0) {
            return Err(Error::Config("smart_max_on_ms must be positive when set"));
        }
        if !(2..=64).contains(&self.task_stack_kb) {
            return Err(Error::Config("task_stack_kb must be 2–64"));
        }
        if !(1..=24).contains(&self.task_priority) {
            return Err(Error::Config("task_priority must be 1–24"));
        }
        if !(self.pulses_per_unit.is_finite() && self.pulses_per_unit > 0.0) {
            return Err(Error::Config("pulses_per_unit must be positive"));
        }
        if !(10..=60_000).contains(&self.sensor_refresh_ms) {
            return Err(Error::Config("sensor_refresh_ms must be 10–60000"));
        }
        if self.soil_sensor_addr > 0x7F {
            return Err(Error::Config("soil_sensor_addr must be a 7-bit address"));
        }
        if !(10_000..=1_000_000).contains(&self.i2c_baudrate_hz) {
            return Err(Error::Config("i2c_baudrate_hz must be 10k–1M"));
        }
        if self.status_interval_ms < self.poll_tick_ms {
            return Err(Error::Config("status_interval_ms must be >= poll_tick_ms"));
        }
        Ok(())
    }
}
