//! Countdown state machine for focus/break intervals.
//!
//! The timer itself is a plain value type; the 1-second cadence is driven by
//! the main event loop. Only the two interval durations survive a restart.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FOCUS_SECS: u64 = 25 * 60;
pub const DEFAULT_BREAK_SECS: u64 = 5 * 60;

/// Durations below one minute are raised to it.
pub const MIN_DURATION_SECS: u64 = 60;

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Timer is not running; nothing happened.
    Skipped,
    /// One second elapsed.
    Ticked,
    /// The countdown just reached zero and stopped.
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownTimer {
    #[serde(skip)]
    remaining: u64,
    #[serde(skip)]
    running: bool,
    #[serde(skip)]
    target: u64,
    #[serde(skip)]
    on_break: bool,
    focus_secs: u64,
    break_secs: u64,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            remaining: DEFAULT_FOCUS_SECS,
            running: false,
            target: DEFAULT_FOCUS_SECS,
            on_break: false,
            focus_secs: DEFAULT_FOCUS_SECS,
            break_secs: DEFAULT_BREAK_SECS,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop counting down; the remaining time is kept.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by one second. Completion fires exactly once: the tick that
    /// finds zero remaining stops the timer, and stopped timers never tick.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Skipped;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            Tick::Ticked
        } else {
            self.running = false;
            Tick::Completed
        }
    }

    /// Stop and rewind to the focus or break duration.
    pub fn reset(&mut self, to_focus: bool) {
        self.running = false;
        self.on_break = !to_focus;
        self.target = if to_focus {
            self.focus_secs
        } else {
            self.break_secs
        };
        self.remaining = self.target;
    }

    /// Takes effect on the next reset; an in-progress countdown is untouched.
    pub fn set_focus_minutes(&mut self, minutes: u64) {
        self.focus_secs = (minutes * 60).max(MIN_DURATION_SECS);
    }

    /// Takes effect on the next reset; an in-progress countdown is untouched.
    pub fn set_break_minutes(&mut self, minutes: u64) {
        self.break_secs = (minutes * 60).max(MIN_DURATION_SECS);
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_on_break(&self) -> bool {
        self.on_break
    }

    /// Duration of the interval currently counted down, in seconds.
    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn focus_secs(&self) -> u64 {
        self.focus_secs
    }

    pub fn break_secs(&self) -> u64 {
        self.break_secs
    }

    /// Fraction of the current interval already elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.target == 0 {
            return 0.0;
        }
        let elapsed = self.target.saturating_sub(self.remaining) as f64;
        (elapsed / self.target as f64).min(1.0)
    }
}
