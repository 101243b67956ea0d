//! Sensor subsystem — flow meter, soil sensor, and the lazily refreshed
//! [`SensorCache`].
//!
//! Soil readings are slow I2C transactions, so they are cached.  A periodic
//! timer marks the cache stale; the next reader that observes the flag
//! clears it and performs one refresh.  Between timer periods every read is
//! served from memory.

pub mod flow;
pub mod soil;

use core::sync::atomic::{AtomicBool, Ordering};

use log::warn;

use crate::error::Result;

/// Stale flag written by the periodic sensor timer.  Starts `true` so the
/// first read after boot goes to the sensor.
static SENSOR_DATA_STALE: AtomicBool = AtomicBool::new(true);

/// Mark cached soil readings as outdated.  Lock-free; safe to call from
/// interrupt or timer-callback context.
pub fn mark_sensor_data_stale() {
    SENSOR_DATA_STALE.store(true, Ordering::Release);
}

/// Environmental sensor driver seam.
pub trait EnvironmentSensor: Send {
    /// Check that the device is present and answering.
    fn probe(&mut self) -> Result<()>;

    /// Soil temperature in °C.
    fn read_temperature(&mut self) -> Result<f32>;

    /// Raw capacitive moisture value.
    fn read_moisture(&mut self) -> Result<u16>;
}

/// Last known soil readings plus the driver that refreshes them.
pub struct SensorCache<S> {
    sensor: S,
    stale: &'static AtomicBool,
    connected: bool,
    temperature: f32,
    moisture: u16,
}

impl<S: EnvironmentSensor> SensorCache<S> {
    /// Cache driven by the global stale flag that [`mark_sensor_data_stale`]
    /// sets.
    pub fn timer_driven(sensor: S) -> Self {
        Self::new(sensor, &SENSOR_DATA_STALE)
    }

    pub fn new(sensor: S, stale: &'static AtomicBool) -> Self {
        Self {
            sensor,
            stale,
            connected: false,
            temperature: 0.0,
            moisture: 0,
        }
    }

    /// Probe the sensor.  On failure the cache stays disconnected and every
    /// reading degrades to zero.
    pub fn connect(&mut self) -> Result<()> {
        let result = self.sensor.probe();
        self.connected = result.is_ok();
        result
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn temperature(&mut self) -> f32 {
        if !self.connected {
            return 0.0;
        }
        self.refresh_if_stale();
        self.temperature
    }

    pub fn moisture(&mut self) -> u16 {
        if !self.connected {
            return 0;
        }
        self.refresh_if_stale();
        self.moisture
    }

    /// The flag is consumed before the bus transaction so that concurrent
    /// readers between two timer periods never trigger a second refresh.
    /// Failed reads keep the previous value.
    fn refresh_if_stale(&mut self) {
        if !self.stale.swap(false, Ordering::AcqRel) {
            return;
        }
        match self.sensor.read_temperature() {
            Ok(t) => self.temperature = t,
            Err(e) => warn!("soil: temperature refresh failed ({e}), keeping {:.1}", self.temperature),
        }
        match self.sensor.read_moisture() {
            Ok(m) => self.moisture = m,
            Err(e) => warn!("soil: moisture refresh failed ({e}), keeping {}", self.moisture),
        }
    }
}
