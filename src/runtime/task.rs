//! Watering algorithms as explicit per-channel state machines.
//!
//! A [`WaterEvent`] is advanced by [`WaterEvent::step`] once per polling
//! tick.  The step never blocks; the caller owns the sleep between ticks,
//! which keeps the state machine testable against a fake clock.
//!
//! ```text
//!   Manual:  Start ─▶ Holding ───────────────────────────────▶ (stop)
//!   Timed:   Start ─▶ Off(freq-goal) ─▶ On(goal) ─▶ Off ─▶ …   (stop)
//!   Smart:   Start ─▶ Filling(+goal) ─▶ Off(freq) ─▶ Filling ─▶ … (stop)
//! ```

use log::{debug, warn};

use crate::app::ports::BoardPort;
use crate::channel::{ChannelId, ChannelMode, ChannelSettings};
use crate::config::ControllerConfig;
use crate::sensors::flow::pulses_for;

/// Upper bound on phase transitions taken in a single step.  Zero-length
/// phases complete immediately, but a channel configured with
/// `goal == frequency == 0` must still yield once per tick.
const MAX_TRANSITIONS_PER_STEP: usize = 3;

/// Algorithm parameters resolved from a settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Program {
    Manual,
    Timed {
        off_ms: u64,
        on_ms: u64,
    },
    Smart {
        /// Flow pulses to deliver per fill.
        goal_pulses: u64,
        rest_ms: u64,
        /// Optional ceiling on one fill phase.
        max_on_ms: Option<u64>,
    },
}

impl Program {
    /// Resolve the algorithm for a settings snapshot.  `None` for modes that
    /// define no behaviour.
    pub fn from_settings(settings: &ChannelSettings, config: &ControllerConfig) -> Option<Self> {
        match settings.mode {
            ChannelMode::Manual => Some(Self::Manual),
            ChannelMode::Timed => Some(Self::Timed {
                off_ms: non_negative_ms(settings.frequency - settings.goal),
                on_ms: non_negative_ms(settings.goal),
            }),
            ChannelMode::Smart => Some(Self::Smart {
                goal_pulses: pulses_for(settings.goal, config.pulses_per_unit),
                rest_ms: non_negative_ms(settings.frequency),
                max_on_ms: config.smart_max_on_ms,
            }),
            ChannelMode::Genius => None,
        }
    }

    pub fn mode(&self) -> ChannelMode {
        match self {
            Self::Manual => ChannelMode::Manual,
            Self::Timed { .. } => ChannelMode::Timed,
            Self::Smart { .. } => ChannelMode::Smart,
        }
    }
}

/// Negative and NaN durations collapse to zero.
fn non_negative_ms(value: f64) -> u64 {
    if value > 0.0 { value as u64 } else { 0 }
}

/// Where a running event currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Nothing driven yet.
    Start,
    /// Manual: motor on until stopped.
    Holding,
    /// Motor off until the deadline.
    Off { until_ms: u64 },
    /// Timed: motor on until the deadline.
    On { until_ms: u64 },
    /// Smart: motor on until the pulse count reaches `target`.
    Filling { target: u64, started_ms: u64 },
}

/// Result of one [`WaterEvent::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// Stop was observed.  The caller releases the actuator.
    Finished,
}

/// One watering run on one channel.
#[derive(Debug, Clone)]
pub struct WaterEvent {
    channel: ChannelId,
    program: Program,
    phase: Phase,
}

impl WaterEvent {
    pub fn new(channel: ChannelId, program: Program) -> Self {
        Self {
            channel,
            program,
            phase: Phase::Start,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn program(&self) -> Program {
        self.program
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance by one polling tick.
    ///
    /// `stop` is checked before anything else, so a stopped event never
    /// drives the motor again.
    pub fn step<B: BoardPort + ?Sized>(&mut self, board: &B, now_ms: u64, stop: bool) -> Step {
        if stop {
            return Step::Finished;
        }
        for _ in 0..MAX_TRANSITIONS_PER_STEP {
            if !self.advance(board, now_ms) {
                break;
            }
        }
        Step::Continue
    }

    /// Take at most one transition.  Returns whether the phase changed.
    fn advance<B: BoardPort + ?Sized>(&mut self, board: &B, now_ms: u64) -> bool {
        let next = match (self.program, self.phase) {
            (Program::Manual, Phase::Start) => {
                self.drive(board, true);
                Phase::Holding
            }
            (Program::Timed { off_ms, .. }, Phase::Start) => {
                self.drive(board, false);
                Phase::Off {
                    until_ms: now_ms.saturating_add(off_ms),
                }
            }
            (Program::Timed { on_ms, .. }, Phase::Off { until_ms }) if now_ms >= until_ms => {
                self.drive(board, true);
                Phase::On {
                    until_ms: now_ms.saturating_add(on_ms),
                }
            }
            (Program::Timed { off_ms, .. }, Phase::On { until_ms }) if now_ms >= until_ms => {
                self.drive(board, false);
                Phase::Off {
                    until_ms: now_ms.saturating_add(off_ms),
                }
            }
            (Program::Smart { goal_pulses, .. }, Phase::Start) => {
                self.begin_fill(board, now_ms, goal_pulses)
            }
            (Program::Smart { goal_pulses, .. }, Phase::Off { until_ms }) if now_ms >= until_ms => {
                self.begin_fill(board, now_ms, goal_pulses)
            }
            (
                Program::Smart {
                    rest_ms, max_on_ms, ..
                },
                Phase::Filling { target, started_ms },
            ) => {
                let elapsed = now_ms.saturating_sub(started_ms);
                if board.delivered_pulses() >= target {
                    debug!("{}: fill reached pulse {} after {}ms", self.channel, target, elapsed);
                } else if max_on_ms.is_some_and(|max| elapsed >= max) {
                    warn!(
                        "{}: no fill to pulse {} within {}ms, resting",
                        self.channel, target, elapsed
                    );
                } else {
                    return false;
                }
                self.drive(board, false);
                Phase::Off {
                    until_ms: now_ms.saturating_add(rest_ms),
                }
            }
            _ => return false,
        };
        self.phase = next;
        true
    }

    fn begin_fill<B: BoardPort + ?Sized>(&self, board: &B, now_ms: u64, goal_pulses: u64) -> Phase {
        let target = board.delivered_pulses().saturating_add(goal_pulses);
        self.drive(board, true);
        Phase::Filling {
            target,
            started_ms: now_ms,
        }
    }

    /// Actuator failures are logged and the event carries on; the command is
    /// not retried.
    fn drive<B: BoardPort + ?Sized>(&self, board: &B, on: bool) {
        if let Err(e) = board.set_actuator(self.channel.get(), on) {
            warn!("{}: motor {} rejected ({})", self.channel, if on { "on" } else { "off" }, e);
        }
    }
}
