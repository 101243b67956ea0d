//! Outbound application events.
//!
//! The [`IrrigationService`](super::service::IrrigationService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::channel::{CHANNEL_COUNT, ChannelId, ChannelMode, ChannelSettings};

/// Structured events emitted by the service.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A watering task was created.
    EventStarted { channel: ChannelId, mode: ChannelMode },

    /// The channel's mode defines no watering algorithm; nothing ran.
    EventSkipped { channel: ChannelId, mode: ChannelMode },

    /// Stop was signalled to one channel, or to all when `None`.
    StopRequested(Option<ChannelId>),

    /// Settings for a channel were written.
    SettingsUpdated {
        channel: ChannelId,
        settings: ChannelSettings,
    },

    /// Periodic status snapshot.
    Status(ControllerStatus),
}

/// Point-in-time view of the whole controller.
///
/// Serialises flat, the way the web front end polls it: `temp`,
/// `moisture`, `water`, `faulted`, then one `ch1`..`ch4` object per
/// channel.
#[derive(Debug, Clone)]
pub struct ControllerStatus {
    pub temperature: f32,
    pub moisture: u16,
    /// Cumulative delivered volume since boot.
    pub water: f64,
    pub faulted: bool,
    pub channels: [ChannelStatus; CHANNEL_COUNT],
}

const CHANNEL_KEYS: [&str; CHANNEL_COUNT] = ["ch1", "ch2", "ch3", "ch4"];

impl Serialize for ControllerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4 + CHANNEL_COUNT))?;
        map.serialize_entry("temp", &self.temperature)?;
        map.serialize_entry("moisture", &self.moisture)?;
        map.serialize_entry("water", &self.water)?;
        map.serialize_entry("faulted", &self.faulted)?;
        for channel in &self.channels {
            map.serialize_entry(CHANNEL_KEYS[channel.channel.index()], channel)?;
        }
        map.end()
    }
}

/// Per-channel part of [`ControllerStatus`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChannelStatus {
    pub channel: ChannelId,
    pub mode: ChannelMode,
    pub frequency: f64,
    pub goal: f64,
    /// Motor output as last commanded; `false` while faulted.
    pub status: bool,
    /// A watering task is alive on this channel.
    pub running: bool,
}
