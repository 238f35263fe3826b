//! Cancellable notice timers.
//!
//! Host timers carry no identifier: each `set_timeout` call produces one
//! `Timer` event later, in scheduling order for equal durations. [`Timers`]
//! keeps the scheduled entries in a FIFO and pairs every host firing with the
//! oldest entry. Cancellation is done by the owner forgetting its token; the
//! entry still fires but no longer matches anything.

use std::collections::VecDeque;

/// Seconds a success notice stays visible.
pub const NOTICE_DISPLAY_SECS: f64 = 3.0;

/// Identifies one scheduled firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// Workflow that scheduled a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    Submission,
    Profile,
    Login,
}

/// A timer the host has been asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub owner: TimerOwner,
    pub token: TimerToken,
}

#[derive(Debug, Clone, Default)]
pub struct Timers {
    next_token: u64,
    queued: VecDeque<Scheduled>,
    unstarted: Vec<f64>,
}

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a firing after `seconds` and returns its token.
    pub fn schedule(&mut self, owner: TimerOwner, seconds: f64) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.queued.push_back(Scheduled { owner, token });
        self.unstarted.push(seconds);
        tracing::debug!(owner = ?owner, token = token.0, seconds, "timer scheduled");
        token
    }

    /// Durations of timers the host has not been asked to start yet.
    pub fn take_unstarted(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.unstarted)
    }

    /// Pairs a host firing with the oldest scheduled entry.
    pub fn fire(&mut self) -> Option<Scheduled> {
        let fired = self.queued.pop_front();
        if fired.is_none() {
            tracing::debug!("timer fired with nothing scheduled");
        }
        fired
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queued.len()
    }
}
