//! AutoGarden irrigation controller library.
//!
//! Exposes the controller core for the firmware binary and for host-side
//! integration tests.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module and has a simulation
//! twin, so the whole crate builds and tests on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channel;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod runtime;
pub mod sensors;
