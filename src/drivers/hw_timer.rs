//! Periodic sensor-invalidate timer using ESP-IDF's esp_timer API.
//!
//! The callback does one thing: set the soil-cache stale flag.  Refreshing
//! happens later, on the next reader, outside timer context.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
static mut SENSOR_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: SENSOR_TIMER is written once in `start_sensor_timer()` from the
/// main task, before the callback can fire.
#[cfg(target_os = "espidf")]
unsafe fn sensor_timer() -> esp_timer_handle_t { unsafe { SENSOR_TIMER } }

#[cfg(target_os = "espidf")]
unsafe extern "C" fn sensor_stale_cb(_arg: *mut core::ffi::c_void) {
    crate::sensors::mark_sensor_data_stale();
}

/// Start the periodic stale timer with the given period.
#[cfg(target_os = "espidf")]
pub fn start_sensor_timer(period_ms: u32) {
    // SAFETY: SENSOR_TIMER is written here once at boot from the main task.
    // The callback only stores to an atomic.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(sensor_stale_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"soil-stale\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut SENSOR_TIMER);
        if ret != ESP_OK {
            log::error!("hw_timer: stale timer create failed (rc={}) — soil readings will not refresh", ret);
            return;
        }
        let ret = esp_timer_start_periodic(sensor_timer(), u64::from(period_ms) * 1000);
        if ret != ESP_OK {
            log::error!("hw_timer: stale timer start failed (rc={})", ret);
            return;
        }
    }
    info!("hw_timer: soil stale timer every {}ms", period_ms);
}

/// Host builds: mark the cache stale from a plain thread.
#[cfg(not(target_os = "espidf"))]
pub fn start_sensor_timer(period_ms: u32) {
    let period = std::time::Duration::from_millis(u64::from(period_ms));
    let spawned = std::thread::Builder::new()
        .name("soil-stale".into())
        .spawn(move || {
            loop {
                std::thread::sleep(period);
                crate::sensors::mark_sensor_data_stale();
            }
        });
    match spawned {
        Ok(_) => log::info!("hw_timer(sim): soil stale thread every {}ms", period_ms),
        Err(e) => log::warn!("hw_timer(sim): stale thread not started ({})", e),
    }
}
