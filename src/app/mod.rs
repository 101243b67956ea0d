//! Application core — lifecycle management and the port boundary.
//!
//! The service decides *which* watering task runs on a channel; the tasks
//! themselves live in [`crate::runtime`].  All interaction with hardware
//! and storage goes through the **port traits** in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
