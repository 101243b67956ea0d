//! Motor driver, hardware initialisation, timers, and task spawning.

pub mod hw_init;
pub mod hw_timer;
pub mod motor;
pub mod task_pin;
