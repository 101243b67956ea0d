//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`SettingsPort`] over the `autog` namespace.  Each channel
//! has three keys:
//!
//! | Key         | Type | Value                          |
//! |-------------|------|--------------------------------|
//! | `ch<N>mode` | u8   | [`ChannelMode`] discriminant   |
//! | `ch<N>freq` | u64  | frequency, `f64` bit pattern   |
//! | `ch<N>goal` | u64  | goal, `f64` bit pattern        |
//!
//! A `valid` marker (0xAB) records that the namespace was written by this
//! firmware.  Without it the namespace is wiped and every channel reset to
//! Manual/0/0 on attach.  Host builds keep the same layout in a map.

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::ports::SettingsPort;
use crate::channel::{ChannelId, ChannelMode, ChannelSettings};
use crate::error::Result;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use crate::error::Error;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const SETTINGS_NAMESPACE: &str = "autog";
const VALID_KEY: &str = "valid";
const VALID_MARKER: u8 = 0xAB;

/// NVS keys are limited to 15 characters.
type NvsKey = heapless::String<15>;

fn channel_key(channel: ChannelId, field: &str) -> NvsKey {
    let mut key = NvsKey::new();
    // "ch4freq" is well under the key limit.
    let _ = write!(key, "ch{}{}", channel.get(), field);
    key
}

/// NUL-terminated copy of a namespace or key for the C API.
#[cfg(target_os = "espidf")]
fn c_str(s: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    let len = s.len().min(15);
    buf[..len].copy_from_slice(&s.as_bytes()[..len]);
    buf
}

/// Per-channel settings persisted in NVS.
pub struct NvsSettings {
    #[cfg(target_os = "espidf")]
    handle: nvs_handle_t,
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, u64>,
    requires_setup: bool,
}

impl NvsSettings {
    /// Initialise NVS flash and open the settings namespace.
    ///
    /// On a full or version-mismatched partition the flash is erased and
    /// re-initialised, which also drops the validity marker.
    pub fn new() -> Result<Self> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret = unsafe { nvs_flash_erase() };
                if ret != ESP_OK {
                    return Err(Error::Storage(ret));
                }
                let ret = unsafe { nvs_flash_init() };
                if ret != ESP_OK {
                    return Err(Error::Storage(ret));
                }
            } else if ret != ESP_OK {
                return Err(Error::Storage(ret));
            }

            let ns = c_str(SETTINGS_NAMESPACE);
            let mut handle: nvs_handle_t = 0;
            // SAFETY: `ns` is NUL-terminated and outlives the call.
            let ret = unsafe { nvs_open(ns.as_ptr() as *const _, nvs_open_mode_t_NVS_READWRITE, &mut handle) };
            if ret != ESP_OK {
                return Err(Error::Storage(ret));
            }
            info!("NvsSettings: namespace '{}' open", SETTINGS_NAMESPACE);
            Ok(Self {
                handle,
                requires_setup: false,
            })
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NvsSettings: simulation backend");
            Ok(Self {
                store: HashMap::new(),
                requires_setup: false,
            })
        }
    }

    /// Check the validity marker; reset every channel if it is missing.
    pub fn attach(&mut self) -> Result<()> {
        if self.read_u8(VALID_KEY) == Some(VALID_MARKER) {
            self.requires_setup = false;
            info!("NvsSettings: stored settings valid");
            return Ok(());
        }

        warn!("NvsSettings: no valid settings, resetting all channels");
        self.erase_all()?;
        for channel in ChannelId::all() {
            self.write_channel(channel, &ChannelSettings::default())?;
        }
        self.commit()?;
        self.requires_setup = true;
        Ok(())
    }

    /// `true` after [`attach`](Self::attach) found no valid settings and
    /// [`mark_valid`](Self::mark_valid) has not been called since.
    pub fn requires_setup(&self) -> bool {
        self.requires_setup
    }

    /// Record that the stored settings are complete.
    pub fn mark_valid(&mut self) -> Result<()> {
        self.write_u8(VALID_KEY, VALID_MARKER)?;
        self.commit()?;
        self.requires_setup = false;
        info!("NvsSettings: settings marked valid");
        Ok(())
    }

    fn write_channel(&mut self, channel: ChannelId, settings: &ChannelSettings) -> Result<()> {
        self.write_u8(&channel_key(channel, "mode"), settings.mode as u8)?;
        self.write_u64(&channel_key(channel, "freq"), settings.frequency.to_bits())?;
        self.write_u64(&channel_key(channel, "goal"), settings.goal.to_bits())
    }

    fn read_f64(&self, channel: u8, field: &str) -> f64 {
        ChannelId::new(channel)
            .ok()
            .and_then(|id| self.read_u64(&channel_key(id, field)))
            .map_or(0.0, f64::from_bits)
    }

    // ── Backend: ESP-IDF ──────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn read_u8(&self, key: &str) -> Option<u8> {
        let k = c_str(key);
        let mut value = 0u8;
        // SAFETY: handle is open for the adapter's lifetime; `k` is NUL-terminated.
        let ret = unsafe { nvs_get_u8(self.handle, k.as_ptr() as *const _, &mut value) };
        (ret == ESP_OK).then_some(value)
    }

    #[cfg(target_os = "espidf")]
    fn read_u64(&self, key: &str) -> Option<u64> {
        let k = c_str(key);
        let mut value = 0u64;
        // SAFETY: as in read_u8.
        let ret = unsafe { nvs_get_u64(self.handle, k.as_ptr() as *const _, &mut value) };
        (ret == ESP_OK).then_some(value)
    }

    #[cfg(target_os = "espidf")]
    fn write_u8(&mut self, key: &str, value: u8) -> Result<()> {
        let k = c_str(key);
        // SAFETY: as in read_u8.
        let ret = unsafe { nvs_set_u8(self.handle, k.as_ptr() as *const _, value) };
        if ret != ESP_OK {
            return Err(Error::Storage(ret));
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn write_u64(&mut self, key: &str, value: u64) -> Result<()> {
        let k = c_str(key);
        // SAFETY: as in read_u8.
        let ret = unsafe { nvs_set_u64(self.handle, k.as_ptr() as *const _, value) };
        if ret != ESP_OK {
            return Err(Error::Storage(ret));
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn erase_all(&mut self) -> Result<()> {
        // SAFETY: handle is open read-write.
        let ret = unsafe { nvs_erase_all(self.handle) };
        if ret != ESP_OK {
            return Err(Error::Storage(ret));
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn commit(&mut self) -> Result<()> {
        // SAFETY: handle is open read-write.
        let ret = unsafe { nvs_commit(self.handle) };
        if ret != ESP_OK {
            return Err(Error::Storage(ret));
        }
        Ok(())
    }

    // ── Backend: simulation ───────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn read_u8(&self, key: &str) -> Option<u8> {
        self.store.get(key).map(|&v| v as u8)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_u64(&self, key: &str) -> Option<u64> {
        self.store.get(key).copied()
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_u8(&mut self, key: &str, value: u8) -> Result<()> {
        self.write_u64(key, u64::from(value))
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_u64(&mut self, key: &str, value: u64) -> Result<()> {
        self.store.insert(key.to_owned(), value);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn erase_all(&mut self) -> Result<()> {
        self.store.clear();
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl Drop for NvsSettings {
    fn drop(&mut self) {
        // SAFETY: handle was opened in new() and is closed exactly once.
        unsafe { nvs_close(self.handle) };
    }
}

impl SettingsPort for NvsSettings {
    fn mode(&self, channel: u8) -> ChannelMode {
        let Ok(id) = ChannelId::new(channel) else {
            return ChannelMode::default();
        };
        match self.read_u8(&channel_key(id, "mode")) {
            None => ChannelMode::default(),
            Some(raw) => ChannelMode::from_u8(raw).unwrap_or_else(|| {
                warn!("NvsSettings: {} has unknown mode {}", id, raw);
                ChannelMode::Genius
            }),
        }
    }

    fn frequency(&self, channel: u8) -> f64 {
        self.read_f64(channel, "freq")
    }

    fn goal(&self, channel: u8) -> f64 {
        self.read_f64(channel, "goal")
    }

    fn set_settings(&mut self, channel: u8, settings: ChannelSettings) {
        let Ok(id) = ChannelId::new(channel) else {
            warn!("NvsSettings: ignoring settings for channel {}", channel);
            return;
        };
        let written = self.write_channel(id, &settings).and_then(|()| self.commit());
        match written {
            Ok(()) => info!(
                "NvsSettings: {} = {:?} freq={} goal={}",
                id, settings.mode, settings.frequency, settings.goal
            ),
            Err(e) => warn!("NvsSettings: {} not saved ({})", id, e),
        }
    }
}
