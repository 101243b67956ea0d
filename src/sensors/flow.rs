//! Hall-effect water flow meter.
//!
//! The meter emits one pulse per fixed quantity of water.  A GPIO ISR
//! increments a 32-bit atomic counter on each rising edge.  [`FlowMeter`]
//! folds that counter into a 64-bit running total on every read, so the
//! delivered volume keeps growing across counter wrap-around as long as
//! fewer than 2^32 pulses arrive between two reads.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

/// Global pulse counter incremented by the GPIO ISR.
/// `static` because ISR callbacks in ESP-IDF cannot capture closures.
static FLOW_PULSE_COUNT: AtomicU32 = AtomicU32::new(0);

/// Called from the GPIO ISR on each rising edge.  One relaxed add, no
/// blocking.
pub fn flow_isr_handler() {
    FLOW_PULSE_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Raw counter value at the previous read and the total folded so far.
#[derive(Debug, Default)]
struct Tally {
    last_raw: u32,
    total: u64,
}

/// Monotonic view over a wrapping pulse counter.
pub struct FlowMeter {
    pulses: &'static AtomicU32,
    tally: Mutex<Tally>,
    pulses_per_unit: f64,
}

impl FlowMeter {
    /// Meter backed by the counter that [`flow_isr_handler`] increments.
    pub fn isr_backed(pulses_per_unit: f64) -> Self {
        Self::new(&FLOW_PULSE_COUNT, pulses_per_unit)
    }

    /// Meter over an arbitrary counter (host tests inject pulses here).
    ///
    /// Pulses already on the counter count as delivered.
    pub fn new(pulses: &'static AtomicU32, pulses_per_unit: f64) -> Self {
        Self {
            pulses,
            tally: Mutex::new(Tally::default()),
            pulses_per_unit,
        }
    }

    /// Pulses since boot.
    pub fn pulses(&self) -> u64 {
        let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        let raw = self.pulses.load(Ordering::Acquire);
        tally.total += u64::from(raw.wrapping_sub(tally.last_raw));
        tally.last_raw = raw;
        tally.total
    }

    /// Delivered volume since boot.
    pub fn volume(&self) -> f64 {
        self.pulses() as f64 / self.pulses_per_unit
    }
}

/// Pulses a meter calibrated at `pulses_per_unit` counts for `units` of
/// water, rounded up so a fill never stops short.  Non-positive amounts
/// need no pulses.
pub fn pulses_for(units: f64, pulses_per_unit: f64) -> u64 {
    let exact = units * pulses_per_unit;
    if exact.is_nan() || exact <= 0.0 {
        return 0;
    }
    let nearest = exact.round();
    // 0.1 * 450 lands a hair above 45; that is still 45 pulses.
    if (exact - nearest).abs() < 1e-6 {
        nearest as u64
    } else {
        exact.ceil() as u64
    }
}
