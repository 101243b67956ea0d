//! AutoGarden Firmware — Main Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                    │
//! │                                                             │
//! │  MotorBoard          NvsSettings    Esp32Time   LogEventSink │
//! │  (BoardPort)         (Settings)     (Clock)     (EventSink)  │
//! │                                                             │
//! │  ─────────────── Port Trait Boundary ──────────────────     │
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────┐      │
//! │  │  IrrigationService → channel tasks wtr1..wtr4     │      │
//! │  └───────────────────────────────────────────────────┘      │
//! │                                                             │
//! │  ISRs: flow pulse counter · soil stale timer                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use autogarden::adapters::hardware::MotorBoard;
use autogarden::adapters::log_sink::LogEventSink;
use autogarden::adapters::nvs::NvsSettings;
use autogarden::adapters::time::Esp32TimeAdapter;
use autogarden::app::commands::AppCommand;
use autogarden::app::service::IrrigationService;
use autogarden::config::ControllerConfig;
use autogarden::drivers::{hw_init, hw_timer, motor::GpioMotorLines};
use autogarden::pins;
use autogarden::sensors::flow::FlowMeter;
use autogarden::sensors::soil::SeesawSoilSensor;
use autogarden::sensors::SensorCache;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("AutoGarden v{}", env!("CARGO_PKG_VERSION"));

    let config = ControllerConfig::default();
    config.validate()?;

    // ── 2. Peripherals and interrupt sources ──────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without motor GPIO nothing can run safely.
        error!("GPIO init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::init_isr_service() {
        warn!("ISR service init failed: {}, delivered volume will stay 0", e);
    }
    hw_timer::start_sensor_timer(config.sensor_refresh_ms);

    let peripherals = Peripherals::take()?;
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(config.i2c_baudrate_hz));
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        &i2c_cfg,
    )?;
    info!(
        "I2C up on SDA={} SCL={} at {}Hz",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        config.i2c_baudrate_hz
    );

    // ── 3. Board ──────────────────────────────────────────────
    let mut lines = GpioMotorLines::new();
    lines.enable();
    let soil = SeesawSoilSensor::new(i2c, FreeRtos, config.soil_sensor_addr);
    let board = Arc::new(MotorBoard::new(
        lines,
        SensorCache::timer_driven(soil),
        FlowMeter::isr_backed(config.pulses_per_unit),
    ));
    if board.begin().is_err() {
        warn!("Continuing without soil readings");
    }

    // ── 4. Settings ───────────────────────────────────────────
    let mut settings = NvsSettings::new()?;
    settings.attach()?;
    if settings.requires_setup() {
        warn!("Channel settings were reset; configure every channel before use");
    }

    // ── 5. Service ────────────────────────────────────────────
    let status_every = Duration::from_millis(u64::from(config.status_interval_ms));
    let mut service = IrrigationService::new(board, settings, Esp32TimeAdapter::new(), config);
    let mut sink = LogEventSink::new();

    info!("Controller ready");
    loop {
        if let Err(e) = service.handle_command(AppCommand::ReportStatus, &mut sink) {
            warn!("status report failed: {}", e);
        }
        std::thread::sleep(status_every);
    }
}
