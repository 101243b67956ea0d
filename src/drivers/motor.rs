//! Quad motor driver: four channel outputs, a shared active-low enable, and
//! an open-drain fault output.
//!
//! The driver is a dumb actuator.  Channel validation and fault gating are
//! done one level up, in [`MotorBoard`](crate::adapters::hardware::MotorBoard).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real GPIO via hw_init helpers.
//! On host: `gpio_write` is a no-op and `gpio_read` reports HIGH, i.e. no
//! fault.

use crate::channel::{CHANNEL_COUNT, ChannelId};
use crate::drivers::hw_init;
use crate::pins;

/// Output/fault lines of the motor driver.
pub trait MotorLines: Send {
    /// Set one channel's output level.
    fn drive(&mut self, channel: ChannelId, on: bool);

    /// Sample the fault input.  `true` = driver has cut motor power.
    fn fault_asserted(&mut self) -> bool;
}

/// Motor lines wired to the board's GPIOs.
pub struct GpioMotorLines {
    channel_gpios: [i32; CHANNEL_COUNT],
    enable_gpio: i32,
    fault_gpio: i32,
}

impl GpioMotorLines {
    pub fn new() -> Self {
        Self {
            channel_gpios: pins::MOTOR_CHANNEL_GPIOS,
            enable_gpio: pins::MOTOR_ENABLE_GPIO,
            fault_gpio: pins::MOTOR_FAULT_GPIO,
        }
    }

    /// Drive every output low, then release the driver's enable line.
    pub fn enable(&mut self) {
        for &gpio in &self.channel_gpios {
            hw_init::gpio_write(gpio, false);
        }
        hw_init::gpio_write(self.enable_gpio, false);
        log::info!("motor: driver enabled, {} channels low", CHANNEL_COUNT);
    }
}

impl Default for GpioMotorLines {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorLines for GpioMotorLines {
    fn drive(&mut self, channel: ChannelId, on: bool) {
        hw_init::gpio_write(self.channel_gpios[channel.index()], on);
    }

    fn fault_asserted(&mut self) -> bool {
        !hw_init::gpio_read(self.fault_gpio)
    }
}
