//! Mock adapters for integration tests.
//!
//! `MockBoard` records every actuator command with the virtual time it was
//! issued, so tests can assert on the full on/off history without GPIO.
//! `VirtualClock` advances on `sleep` instead of waiting, yielding the real
//! CPU briefly so concurrent tasks still interleave.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use autogarden::app::events::AppEvent;
use autogarden::app::ports::{BoardPort, Clock, EventSink, SettingsPort};
use autogarden::channel::{CHANNEL_COUNT, ChannelId, ChannelMode, ChannelSettings};
use autogarden::error::{Error, Result};
use autogarden::sensors::flow::pulses_for;

/// Calibration the mock board reports volume with.
pub const PULSES_PER_UNIT: f64 = 450.0;

// ── VirtualClock ──────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct VirtualClock {
    now: Arc<AtomicU64>,
}

#[allow(dead_code)]
impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration.as_millis() as u64);
        std::thread::sleep(Duration::from_micros(100));
    }
}

// ── MockBoard ─────────────────────────────────────────────────

/// One accepted actuator command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorCall {
    pub at_ms: u64,
    pub channel: u8,
    pub on: bool,
}

pub struct MockBoard {
    clock: VirtualClock,
    states: Mutex<[bool; CHANNEL_COUNT]>,
    fault: AtomicBool,
    pulses: AtomicU64,
    pub calls: Mutex<Vec<ActuatorCall>>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            states: Mutex::new([false; CHANNEL_COUNT]),
            fault: AtomicBool::new(false),
            pulses: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_fault(&self, faulted: bool) {
        self.fault.store(faulted, Ordering::SeqCst);
    }

    pub fn pour(&self, units: f64) {
        self.pulses
            .fetch_add(pulses_for(units, PULSES_PER_UNIT), Ordering::SeqCst);
    }

    pub fn is_on(&self, channel: u8) -> bool {
        self.states.lock().unwrap()[usize::from(channel - 1)]
    }

    pub fn history(&self, channel: u8) -> Vec<ActuatorCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.channel == channel)
            .copied()
            .collect()
    }

    /// Times at which `channel` changed state, paired with the new state.
    pub fn transitions(&self, channel: u8) -> Vec<(u64, bool)> {
        let mut last = false;
        let mut out = Vec::new();
        for call in self.history(channel) {
            if call.on != last {
                out.push((call.at_ms, call.on));
                last = call.on;
            }
        }
        out
    }
}

impl BoardPort for MockBoard {
    fn set_actuator(&self, channel: u8, enable: bool) -> Result<bool> {
        let id = ChannelId::new(channel)?;
        if self.is_faulted() {
            return Err(Error::FaultCondition);
        }
        self.states.lock().unwrap()[id.index()] = enable;
        self.calls.lock().unwrap().push(ActuatorCall {
            at_ms: self.clock.now_ms(),
            channel,
            on: enable,
        });
        Ok(enable)
    }

    fn actuator_state(&self, channel: u8) -> Result<bool> {
        let id = ChannelId::new(channel)?;
        if self.is_faulted() {
            return Err(Error::FaultCondition);
        }
        Ok(self.states.lock().unwrap()[id.index()])
    }

    fn is_faulted(&self) -> bool {
        self.fault.load(Ordering::SeqCst)
    }

    fn delivered_pulses(&self) -> u64 {
        self.pulses.load(Ordering::SeqCst)
    }

    fn delivered_volume(&self) -> f64 {
        self.delivered_pulses() as f64 / PULSES_PER_UNIT
    }

    fn sensor_connected(&self) -> bool {
        true
    }

    fn temperature(&self) -> f32 {
        21.5
    }

    fn moisture(&self) -> u16 {
        612
    }
}

// ── MemorySettings ────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySettings {
    store: HashMap<u8, ChannelSettings>,
}

#[allow(dead_code)]
impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: u8, mode: ChannelMode, frequency: f64, goal: f64) -> Self {
        self.set_settings(channel, ChannelSettings::new(mode, frequency, goal));
        self
    }
}

impl SettingsPort for MemorySettings {
    fn mode(&self, channel: u8) -> ChannelMode {
        self.store.get(&channel).map(|s| s.mode).unwrap_or_default()
    }

    fn frequency(&self, channel: u8) -> f64 {
        self.store.get(&channel).map_or(0.0, |s| s.frequency)
    }

    fn goal(&self, channel: u8) -> f64 {
        self.store.get(&channel).map_or(0.0, |s| s.goal)
    }

    fn set_settings(&mut self, channel: u8, settings: ChannelSettings) {
        if ChannelId::new(channel).is_ok() {
            self.store.insert(channel, settings);
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::EventStarted { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Poll `cond` in real time until it holds or two seconds pass.
#[allow(dead_code)]
pub fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}
