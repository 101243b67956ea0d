//! Channel identity and per-channel settings.
//!
//! A channel is one irrigation line: one motor output, one settings record,
//! at most one watering task.  Raw ids arrive from the command surface as
//! plain integers and are validated into a [`ChannelId`] before anything
//! touches hardware.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of irrigation channels on the motor board.
pub const CHANNEL_COUNT: usize = 4;

/// A validated channel id in `1..=CHANNEL_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ChannelId(u8);

impl ChannelId {
    /// Every channel on the board, in order.
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [ChannelId(1), ChannelId(2), ChannelId(3), ChannelId(4)];

    /// Validate a raw channel number.
    pub fn new(raw: u8) -> Result<Self> {
        if raw >= 1 && raw as usize <= CHANNEL_COUNT {
            Ok(Self(raw))
        } else {
            Err(Error::InvalidChannel(raw))
        }
    }

    /// The 1-based channel number.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index for per-channel arrays.
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = ChannelId> {
        Self::ALL.into_iter()
    }
}

impl TryFrom<u8> for ChannelId {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<ChannelId> for u8 {
    fn from(id: ChannelId) -> u8 {
        id.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Watering algorithm selected for a channel.
///
/// The discriminants are the values persisted in settings storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChannelMode {
    /// Motor held on until stopped.
    #[default]
    Manual = 0,
    /// Fixed off/on duty cycle.
    Timed = 1,
    /// Fill a measured volume, then rest.
    Smart = 2,
    /// Reserved.  Never produces a task.
    Genius = 3,
}

impl ChannelMode {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Manual),
            1 => Some(Self::Timed),
            2 => Some(Self::Smart),
            3 => Some(Self::Genius),
            _ => None,
        }
    }
}

/// Settings snapshot for one channel, as stored by the settings service.
///
/// `frequency` is a duration in milliseconds.  `goal` is milliseconds of
/// watering for [`ChannelMode::Timed`] and volume units for
/// [`ChannelMode::Smart`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub mode: ChannelMode,
    pub frequency: f64,
    pub goal: f64,
}

impl ChannelSettings {
    pub const fn new(mode: ChannelMode, frequency: f64, goal: f64) -> Self {
        Self {
            mode,
            frequency,
            goal,
        }
    }
}
