//! ESP32 time adapter.
//!
//! Implements [`Clock`] for channel tasks.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` (64-bit
//!   microseconds since boot, never wraps in practice).  `sleep` goes
//!   through `std::thread::sleep`, which ESP-IDF maps to `vTaskDelay`.
//! - **`not(target_os = "espidf")`** — `std::time::Instant` relative to
//!   adapter creation.

use core::time::Duration;

use crate::app::ports::Clock;

/// Monotonic clock for the ESP32 platform.
#[derive(Debug, Clone, Copy)]
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a lock-free read of the system timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
