//! Channel task runtime.
//!
//! One task per active channel.  A task owns its [`WaterEvent`], polls the
//! channel's stop signal once per tick, and sleeps in between through the
//! [`Clock`] port so the scheduler gets the CPU back.  Whatever ends the
//! loop, the motor is switched off and the channel's running flag cleared
//! on the way out.

pub mod signal;
pub mod task;

use core::time::Duration;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, warn};

use crate::app::ports::{BoardPort, Clock};
use crate::channel::{CHANNEL_COUNT, ChannelId};
use crate::config::ControllerConfig;
use crate::drivers::task_pin::{self, Core, TaskSpec};

pub use signal::{ChannelSignals, ChannelSlot};
pub use task::{Phase, Program, Step, WaterEvent};

/// FreeRTOS task names, NUL-terminated, indexed by channel.
const TASK_NAMES: [&str; CHANNEL_COUNT] = ["wtr1\0", "wtr2\0", "wtr3\0", "wtr4\0"];

/// Switches the motor off and frees the slot when the task body unwinds
/// or returns.
struct ActuatorRelease<'a, B: BoardPort + ?Sized> {
    board: &'a B,
    slot: &'a ChannelSlot,
    channel: ChannelId,
}

impl<B: BoardPort + ?Sized> Drop for ActuatorRelease<'_, B> {
    fn drop(&mut self) {
        if let Err(e) = self.board.set_actuator(self.channel.get(), false) {
            warn!("{}: release failed ({})", self.channel, e);
        }
        self.slot.finish();
    }
}

/// Task body: step the event every `tick` until stop is observed.
pub fn run_event<B, C>(board: &B, slot: &ChannelSlot, clock: &C, mut event: WaterEvent, tick: Duration)
where
    B: BoardPort + ?Sized,
    C: Clock,
{
    let channel = event.channel();
    let _release = ActuatorRelease {
        board,
        slot,
        channel,
    };
    info!("{}: {:?} event running", channel, event.program());

    while event.step(board, clock.now_ms(), slot.stop_requested()) == Step::Continue {
        clock.sleep(tick);
    }
    info!("{}: event stopped", channel);
}

/// Start `event` as its own task with the configured stack and priority.
///
/// The slot must already be claimed and armed by the caller.
pub fn spawn_event<B, C>(
    board: Arc<B>,
    slot: Arc<ChannelSlot>,
    clock: C,
    event: WaterEvent,
    config: &ControllerConfig,
) -> io::Result<JoinHandle<()>>
where
    B: BoardPort + 'static,
    C: Clock,
{
    let spec = TaskSpec {
        name: TASK_NAMES[event.channel().index()],
        core: Core::App,
        priority: config.task_priority,
        stack_kb: config.task_stack_kb,
    };
    let tick = config.poll_tick();
    task_pin::spawn_on_core(spec, move || {
        run_event(board.as_ref(), &slot, &clock, event, tick);
    })
}
