//! GPIO / peripheral pin assignments for the four-channel motor board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

use crate::channel::CHANNEL_COUNT;

// ---------------------------------------------------------------------------
// Motor driver (quad low-side driver with shared enable and fault lines)
// ---------------------------------------------------------------------------

/// Digital outputs, one per channel (index 0 = channel 1).  HIGH = motor on.
pub const MOTOR_CHANNEL_GPIOS: [i32; CHANNEL_COUNT] = [23, 22, 21, 19];
/// Digital output: driver enable, active LOW.
pub const MOTOR_ENABLE_GPIO: i32 = 18;
/// Digital input: open-drain fault output of the driver.  LOW = fault.
pub const MOTOR_FAULT_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Flow sensor
// ---------------------------------------------------------------------------

/// Hall-effect flow meter — pulse output, rising-edge interrupt.
pub const FLOW_PULSE_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// I²C bus (STEMMA header, seesaw soil sensor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 17;
pub const I2C_SCL_GPIO: i32 = 16;
