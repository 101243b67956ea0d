//! Capacitive soil sensor on the seesaw I2C protocol.
//!
//! Every read is a two-step transaction: write the module base and
//! function register, wait for the sensor firmware to prepare the answer,
//! then read the payload.  All multi-byte values are big-endian.
//!
//! Generic over any `embedded-hal` 1.0 I2C bus and delay provider so the
//! same driver runs against `esp-idf-hal` on the board and a scripted bus
//! on the host.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{info, warn};

use super::EnvironmentSensor;
use crate::error::{Error, Result};

const STATUS_BASE: u8 = 0x00;
const STATUS_HW_ID: u8 = 0x01;
const STATUS_TEMP: u8 = 0x04;
const STATUS_SWRST: u8 = 0x7F;

const TOUCH_BASE: u8 = 0x0F;
const TOUCH_CHANNEL_OFFSET: u8 = 0x10;

/// Hardware ids reported by the two seesaw chip generations.
const HW_ID_SAMD09: u8 = 0x55;
const HW_ID_TINY8X7: u8 = 0x87;

const RESET_SETTLE_MS: u32 = 500;
const TEMP_DELAY_US: u32 = 1000;
const TOUCH_DELAY_US: u32 = 3000;

/// The touch peripheral answers 0xFFFF while a conversion is in flight.
const TOUCH_BUSY: u16 = 0xFFFF;
const TOUCH_RETRIES: usize = 5;

/// Soil sensor driver.
pub struct SeesawSoilSensor<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> SeesawSoilSensor<I, D> {
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    fn read_register(&mut self, base: u8, reg: u8, buf: &mut [u8], delay_us: u32) -> Result<()> {
        if let Err(e) = self.i2c.write(self.address, &[base, reg]) {
            warn!("soil: register write {:02x}:{:02x} failed ({:?})", base, reg, e.kind());
            return Err(Error::SensorUnavailable);
        }
        self.delay.delay_us(delay_us);
        if let Err(e) = self.i2c.read(self.address, buf) {
            warn!("soil: register read {:02x}:{:02x} failed ({:?})", base, reg, e.kind());
            return Err(Error::SensorUnavailable);
        }
        Ok(())
    }
}

impl<I, D> EnvironmentSensor for SeesawSoilSensor<I, D>
where
    I: I2c + Send,
    D: DelayNs + Send,
{
    fn probe(&mut self) -> Result<()> {
        // A missing device NAKs the reset; that alone is not conclusive, the
        // hardware-id read below decides.
        let _ = self
            .i2c
            .write(self.address, &[STATUS_BASE, STATUS_SWRST, 0xFF]);
        self.delay.delay_ms(RESET_SETTLE_MS);

        let mut id = [0u8; 1];
        self.read_register(STATUS_BASE, STATUS_HW_ID, &mut id, TEMP_DELAY_US)?;
        match id[0] {
            HW_ID_SAMD09 | HW_ID_TINY8X7 => {
                info!("soil: seesaw found at 0x{:02x} (hw id 0x{:02x})", self.address, id[0]);
                Ok(())
            }
            other => {
                warn!("soil: unexpected hw id 0x{:02x} at 0x{:02x}", other, self.address);
                Err(Error::SensorUnavailable)
            }
        }
    }

    fn read_temperature(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_register(STATUS_BASE, STATUS_TEMP, &mut buf, TEMP_DELAY_US)?;
        // 16.16 fixed point
        let raw = i32::from_be_bytes(buf);
        Ok(raw as f32 / 65536.0)
    }

    fn read_moisture(&mut self) -> Result<u16> {
        for _ in 0..TOUCH_RETRIES {
            let mut buf = [0u8; 2];
            self.read_register(TOUCH_BASE, TOUCH_CHANNEL_OFFSET, &mut buf, TOUCH_DELAY_US)?;
            let value = u16::from_be_bytes(buf);
            if value != TOUCH_BUSY {
                return Ok(value);
            }
        }
        warn!("soil: touch channel stayed busy after {} reads", TOUCH_RETRIES);
        Err(Error::SensorUnavailable)
    }
}
