//! Per-channel stop signals and liveness flags.
//!
//! Each channel owns one [`ChannelSlot`], shared by reference count between
//! the service (which raises stop) and the channel's task (which polls it
//! and clears `running` on exit).  No locks: every field is a single atomic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::channel::{CHANNEL_COUNT, ChannelId};

/// Stop signal plus "task alive" flag for one channel.
#[derive(Debug)]
pub struct ChannelSlot {
    stop: AtomicBool,
    running: AtomicBool,
}

impl ChannelSlot {
    /// Idle slot: stop raised, nothing running.
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(true),
            running: AtomicBool::new(false),
        }
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Lower the stop signal ahead of a new task.
    pub fn arm(&self) {
        self.stop.store(false, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Reserve the channel for a new task.  `false` if one is still alive.
    pub fn try_claim(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the reservation.  Called from the task's exit path, or by the
    /// service when spawning fails.
    pub fn finish(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Default for ChannelSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// One [`ChannelSlot`] per channel.
#[derive(Debug, Default)]
pub struct ChannelSignals {
    slots: [Arc<ChannelSlot>; CHANNEL_COUNT],
}

impl ChannelSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to one channel's slot, for handing to its task.
    pub fn slot(&self, channel: ChannelId) -> &Arc<ChannelSlot> {
        &self.slots[channel.index()]
    }

    /// Raise stop on every channel.
    pub fn stop_all(&self) {
        for slot in &self.slots {
            slot.request_stop();
        }
    }

    pub fn any_running(&self) -> bool {
        self.slots.iter().any(|s| s.is_running())
    }
}
