//! Hardware adapter — the motor board behind [`BoardPort`].
//!
//! Combines the motor lines, the flow meter and the soil sensor cache.
//! Channel tasks share one `MotorBoard` through an `Arc`, so every method
//! takes `&self`; the motor lines and the sensor cache each sit behind
//! their own mutex, and the commanded per-channel states are atomics.
//!
//! Checks run before any write: channel range first, then the fault line.
//! A rejected command leaves both the pin and the recorded state alone.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{info, warn};

use crate::app::ports::BoardPort;
use crate::channel::{CHANNEL_COUNT, ChannelId};
use crate::drivers::motor::MotorLines;
use crate::error::{Error, Result};
use crate::sensors::flow::FlowMeter;
use crate::sensors::{EnvironmentSensor, SensorCache};

/// Concrete board combining motor driver, flow meter and soil sensor.
pub struct MotorBoard<L, S> {
    lines: Mutex<L>,
    states: [AtomicBool; CHANNEL_COUNT],
    flow: FlowMeter,
    sensor: Mutex<SensorCache<S>>,
}

impl<L: MotorLines, S: EnvironmentSensor> MotorBoard<L, S> {
    pub fn new(lines: L, sensor: SensorCache<S>, flow: FlowMeter) -> Self {
        Self {
            lines: Mutex::new(lines),
            states: Default::default(),
            flow,
            sensor: Mutex::new(sensor),
        }
    }

    /// Probe the soil sensor.
    ///
    /// A missing sensor is reported as `SensorUnavailable`, but the board
    /// stays usable: motors and flow work, soil readings degrade to zero.
    pub fn begin(&self) -> Result<()> {
        let mut sensor = self.sensor.lock().unwrap_or_else(PoisonError::into_inner);
        match sensor.connect() {
            Ok(()) => {
                info!("board: soil sensor online");
                Ok(())
            }
            Err(e) => {
                warn!("board: soil sensor offline ({}), readings will be 0", e);
                Err(Error::SensorUnavailable)
            }
        }
    }

    /// Validate a raw id, then refuse while the driver reports a fault.
    fn checked(&self, lines: &mut L, channel: u8) -> Result<ChannelId> {
        let id = ChannelId::new(channel)?;
        if lines.fault_asserted() {
            return Err(Error::FaultCondition);
        }
        Ok(id)
    }
}

impl<L: MotorLines, S: EnvironmentSensor> BoardPort for MotorBoard<L, S> {
    fn set_actuator(&self, channel: u8, enable: bool) -> Result<bool> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        let id = match self.checked(&mut lines, channel) {
            Ok(id) => id,
            Err(Error::FaultCondition) => {
                warn!("board: ch{} {} refused, driver fault", channel, if enable { "on" } else { "off" });
                return Err(Error::FaultCondition);
            }
            Err(e) => return Err(e),
        };
        lines.drive(id, enable);
        self.states[id.index()].store(enable, Ordering::Release);
        Ok(enable)
    }

    fn actuator_state(&self, channel: u8) -> Result<bool> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        let id = self.checked(&mut lines, channel)?;
        Ok(self.states[id.index()].load(Ordering::Acquire))
    }

    fn is_faulted(&self) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fault_asserted()
    }

    fn delivered_pulses(&self) -> u64 {
        self.flow.pulses()
    }

    fn delivered_volume(&self) -> f64 {
        self.flow.volume()
    }

    fn sensor_connected(&self) -> bool {
        self.sensor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_connected()
    }

    fn temperature(&self) -> f32 {
        self.sensor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .temperature()
    }

    fn moisture(&self) -> u16 {
        self.sensor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .moisture()
    }
}
