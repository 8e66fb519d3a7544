//! Scheduling signaler module
//!
//! The one cross-thread primitive the dispatcher waits on (§9 "Signal/
//! condition variables are the only cross-thread primitive; avoid
//! busy-polling"). All dispatcher state (`paused`, `halted`, `signaled`,
//! `signaledNextFireTime`) lives under this single lock (§5).

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};

struct SignalState {
    paused: bool,
    halted: bool,
    signaled: bool,
    /// `None` means "unknown, assume earliest".
    candidate_fire_time: Option<DateTime<Utc>>,
}

pub struct SchedulingSignaler {
    state: Mutex<SignalState>,
    condvar: Condvar,
}

impl Default for SchedulingSignaler {
    fn default() -> Self {
        Self {
            state: Mutex::new(SignalState {
                paused: true,
                halted: false,
                signaled: false,
                candidate_fire_time: None,
            }),
            condvar: Condvar::new(),
        }
    }
}

impl SchedulingSignaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_halted(&self) -> bool {
        self.state.lock().halted
    }

    pub fn set_paused(&self, paused: bool) {
        let mut state = self.state.lock();
        state.paused = paused;
        self.condvar.notify_all();
    }

    pub fn halt(&self) {
        let mut state = self.state.lock();
        state.halted = true;
        state.paused = false;
        self.condvar.notify_all();
    }

    /// External callers invoke this after any store mutation that could
    /// change the earliest fire time (§4.4 "Signalling").
    pub fn signal_scheduling_change(&self, candidate_fire_time: Option<DateTime<Utc>>) {
        let mut state = self.state.lock();
        state.signaled = true;
        state.candidate_fire_time = match (state.candidate_fire_time, candidate_fire_time) {
            (Some(existing), Some(new)) => Some(existing.min(new)),
            (None, _) | (_, None) => None,
        };
        self.condvar.notify_all();
    }

    /// Collapses pending signals to their earliest candidate and clears the
    /// flag. Level-triggered: prior signals are forgotten after this call.
    pub fn clear_signaled_scheduling_change(&self) -> Option<Option<DateTime<Utc>>> {
        let mut state = self.state.lock();
        if !state.signaled {
            return None;
        }
        state.signaled = false;
        Some(state.candidate_fire_time.take())
    }

    pub fn is_signaled(&self) -> bool {
        self.state.lock().signaled
    }

    /// Waits up to `timeout` for a wake-up signal or unpause, whichever
    /// comes first. Bounded at the caller's discretion; §9 requires every
    /// wait have a timeout of at most 1 s so a missed notification only
    /// delays, never deadlocks.
    pub fn wait_timeout(&self, timeout: Duration) {
        let mut state = self.state.lock();
        if state.signaled || state.halted {
            return;
        }
        self.condvar.wait_for(&mut state, timeout);
    }

    /// Sleeps until the signal fires or `deadline` elapses, whichever is
    /// first, re-checking in ≤1 s increments per §9.
    pub fn wait_until(&self, deadline: DateTime<Utc>, now: impl Fn() -> DateTime<Utc>) {
        loop {
            let remaining = deadline - now();
            if remaining <= chrono::Duration::zero() {
                return;
            }
            let step = remaining.min(chrono::Duration::seconds(1));
            let step_std = step.to_std().unwrap_or(Duration::from_millis(1));
            let mut state = self.state.lock();
            if state.signaled || state.halted {
                return;
            }
            self.condvar.wait_for(&mut state, step_std);
            drop(state);
            if self.is_signaled() || self.is_halted() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_sets_flag_and_candidate() {
        let signaler = SchedulingSignaler::new();
        assert!(!signaler.is_signaled());
        let t = Utc::now();
        signaler.signal_scheduling_change(Some(t));
        assert!(signaler.is_signaled());
        let candidate = signaler.clear_signaled_scheduling_change().flatten();
        assert_eq!(candidate, Some(t));
        assert!(!signaler.is_signaled());
    }

    #[test]
    fn unknown_candidate_collapses_to_none() {
        let signaler = SchedulingSignaler::new();
        signaler.signal_scheduling_change(Some(Utc::now()));
        signaler.signal_scheduling_change(None);
        let candidate = signaler.clear_signaled_scheduling_change().flatten();
        assert_eq!(candidate, None);
    }
}
