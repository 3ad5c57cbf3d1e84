use tracing::debug;

use crate::util::format_hms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum StopwatchPhase {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimerState {
    pub running: bool,
    pub paused: bool,
    /// Clock reading the stopwatch counts from. Shifted forward on every
    /// resume so paused time is skipped.
    pub reference_start_ms: i64,
    /// Elapsed time frozen at the last pause.
    pub accumulated_elapsed_ms: u64,
}

/// Start/pause/resume/reset stopwatch.
///
/// Elapsed time is always `now - reference`, never a count of ticks, so a
/// late or missed tick only delays the display. Callers pass the current
/// clock reading into every operation; the state-changing ones return
/// whether anything changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwatchEngine {
    state: TimerState,
    ticking: bool,
    published_ms: u64,
}

impl StopwatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.state.running {
            return false;
        }
        self.state.running = true;
        self.state.paused = false;
        self.state.reference_start_ms = now_ms as i64 - self.state.accumulated_elapsed_ms as i64;
        self.ticking = true;
        self.published_ms = self.state.accumulated_elapsed_ms;
        debug!(from_ms = self.state.accumulated_elapsed_ms, "stopwatch started");
        true
    }

    pub fn pause(&mut self, now_ms: u64) -> bool {
        if !self.state.running || self.state.paused {
            return false;
        }
        self.state.accumulated_elapsed_ms = self.live_elapsed_ms(now_ms);
        self.published_ms = self.state.accumulated_elapsed_ms;
        self.ticking = false;
        self.state.paused = true;
        debug!(at_ms = self.state.accumulated_elapsed_ms, "stopwatch paused");
        true
    }

    pub fn resume(&mut self, now_ms: u64) -> bool {
        if !self.state.running || !self.state.paused {
            return false;
        }
        self.state.reference_start_ms = now_ms as i64 - self.state.accumulated_elapsed_ms as i64;
        self.ticking = true;
        self.state.paused = false;
        debug!(at_ms = self.state.accumulated_elapsed_ms, "stopwatch resumed");
        true
    }

    pub fn reset(&mut self) {
        self.ticking = false;
        self.state = TimerState::default();
        self.published_ms = 0;
    }

    /// Periodic refresh. Returns the freshly published elapsed time, or
    /// `None` when the stopwatch is not ticking.
    pub fn on_tick(&mut self, now_ms: u64) -> Option<u64> {
        if !self.ticking {
            return None;
        }
        self.published_ms = self.live_elapsed_ms(now_ms);
        Some(self.published_ms)
    }

    /// Elapsed running time as of `now_ms`.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        if self.state.running && !self.state.paused {
            self.live_elapsed_ms(now_ms)
        } else {
            self.state.accumulated_elapsed_ms
        }
    }

    /// Value published by the last tick or state change.
    pub fn published_ms(&self) -> u64 {
        self.published_ms
    }

    pub fn formatted(&self) -> String {
        format_hms(self.published_ms)
    }

    pub fn phase(&self) -> StopwatchPhase {
        match (self.state.running, self.state.paused) {
            (false, _) => StopwatchPhase::Idle,
            (true, false) => StopwatchPhase::Running,
            (true, true) => StopwatchPhase::Paused,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    fn live_elapsed_ms(&self, now_ms: u64) -> u64 {
        (now_ms as i64 - self.state.reference_start_ms).max(0) as u64
    }
}
