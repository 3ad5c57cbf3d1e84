use tracing::debug;

/// A single per-frame classification, stamped with the clock reading it
/// was computed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusVerdict {
    pub focused: bool,
    pub at_ms: u64,
}

impl FocusVerdict {
    pub fn new(focused: bool, at_ms: u64) -> Self {
        Self { focused, at_ms }
    }
}

/// Emitted whenever the focus state flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub became_focused: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FocusState {
    pub is_focused: bool,
    /// Clock reading of the last transition, `None` until the first one
    pub last_transition_ms: Option<u64>,
    pub focused_secs: f64,
    pub distracted_secs: f64,
}

/// Debounces verdicts into transitions and charges the time between
/// transitions to the state that was active during it.
///
/// Time is only attributed when a transition arrives, so the stretch since
/// the latest transition is not part of either counter yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusAccumulator {
    state: FocusState,
}

impl FocusAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, verdict: bool, now_ms: u64) -> Option<TransitionEvent> {
        if verdict == self.state.is_focused {
            return None;
        }

        if let Some(last) = self.state.last_transition_ms {
            let dt = now_ms.saturating_sub(last) as f64 / 1000.0;
            if self.state.is_focused {
                self.state.focused_secs += dt;
            } else {
                self.state.distracted_secs += dt;
            }
        }

        self.state.is_focused = verdict;
        self.state.last_transition_ms = Some(now_ms);
        debug!(
            focused = verdict,
            at_ms = now_ms,
            focused_secs = self.state.focused_secs,
            distracted_secs = self.state.distracted_secs,
            "focus transition"
        );

        Some(TransitionEvent {
            became_focused: verdict,
        })
    }

    pub fn observe_verdict(&mut self, verdict: FocusVerdict) -> Option<TransitionEvent> {
        self.observe(verdict.focused, verdict.at_ms)
    }

    pub fn reset(&mut self) {
        self.state = FocusState::default();
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    pub fn is_focused(&self) -> bool {
        self.state.is_focused
    }

    pub fn focused_secs(&self) -> f64 {
        self.state.focused_secs
    }

    pub fn distracted_secs(&self) -> f64 {
        self.state.distracted_secs
    }

    /// Share of attributed time spent focused, rounded half away from zero.
    pub fn focus_percentage(&self) -> u32 {
        let total = self.state.focused_secs + self.state.distracted_secs;
        if total > 0.0 {
            (100.0 * self.state.focused_secs / total).round() as u32
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn first_focused_verdict_only_timestamps() {
        let mut acc = FocusAccumulator::new();

        let ev = acc.observe(true, 1_000);

        assert_eq!(
            ev,
            Some(TransitionEvent {
                became_focused: true
            })
        );
        assert!(acc.is_focused());
        assert_eq!(acc.state().last_transition_ms, Some(1_000));
        assert_eq!(acc.focused_secs(), 0.0);
        assert_eq!(acc.distracted_secs(), 0.0);
    }

    #[test]
    fn first_distracted_verdict_is_not_a_transition() {
        let mut acc = FocusAccumulator::new();

        assert_eq!(acc.observe(false, 1_000), None);
        assert_eq!(acc.state().last_transition_ms, None);
    }

    #[test]
    fn repeated_verdicts_are_no_ops() {
        let mut acc = FocusAccumulator::new();
        acc.observe(true, 1_000);
        let before = acc.clone();

        for t in [2_000, 3_000, 9_000] {
            assert_eq!(acc.observe(true, t), None);
        }

        assert_eq!(acc, before);
    }

    #[test]
    fn time_is_charged_to_the_previous_state() {
        let mut acc = FocusAccumulator::new();
        acc.observe(true, 0);
        acc.observe(false, 5_000);
        acc.observe(true, 8_000);

        assert!((acc.focused_secs() - 5.0).abs() < EPS);
        assert!((acc.distracted_secs() - 3.0).abs() < EPS);
    }

    #[test]
    fn charging_works_from_any_clock_origin() {
        let mut acc = FocusAccumulator::new();
        acc.observe(true, 1_000);
        acc.observe(false, 6_000);
        acc.observe(true, 9_000);

        assert!((acc.focused_secs() - 5.0).abs() < EPS);
        assert!((acc.distracted_secs() - 3.0).abs() < EPS);
    }

    #[test]
    fn time_since_last_transition_is_not_attributed() {
        let mut acc = FocusAccumulator::new();
        acc.observe(true, 1_000);
        acc.observe(false, 2_000);
        acc.observe(false, 60_000);

        assert!((acc.focused_secs() - 1.0).abs() < EPS);
        assert_eq!(acc.distracted_secs(), 0.0);
    }

    #[test]
    fn durations_conserve_transition_gaps() {
        let stamps = [1_000u64, 1_250, 4_000, 4_001, 10_500, 11_000, 30_000];
        let mut acc = FocusAccumulator::new();
        let mut focused = false;
        let mut last_f = (0.0, 0.0);

        for &t in &stamps {
            focused = !focused;
            acc.observe(focused, t);
            // counters never go down
            assert!(acc.focused_secs() >= last_f.0);
            assert!(acc.distracted_secs() >= last_f.1);
            last_f = (acc.focused_secs(), acc.distracted_secs());
        }

        let expected = (stamps[stamps.len() - 1] - stamps[0]) as f64 / 1000.0;
        let total = acc.focused_secs() + acc.distracted_secs();
        assert!((total - expected).abs() < EPS);
    }

    #[test]
    fn backwards_clock_charges_nothing() {
        let mut acc = FocusAccumulator::new();
        acc.observe(true, 5_000);
        acc.observe(false, 4_000);

        assert_eq!(acc.focused_secs(), 0.0);
        assert!(!acc.is_focused());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut acc = FocusAccumulator::new();
        acc.observe(true, 1_000);
        acc.observe(false, 3_000);

        acc.reset();
        let once = acc.clone();
        acc.reset();

        assert_eq!(acc, once);
        assert_eq!(acc, FocusAccumulator::new());
        assert!(!acc.is_focused());
    }

    #[test]
    fn percentage_with_no_time_is_zero() {
        assert_eq!(FocusAccumulator::new().focus_percentage(), 0);
    }

    #[test]
    fn percentage_rounds_half_up() {
        let mut acc = FocusAccumulator::new();
        acc.observe(true, 1_000);
        acc.observe(false, 2_000);
        acc.observe(true, 4_000);
        // 1 of 3 seconds focused: 33.33 -> 33
        assert_eq!(acc.focus_percentage(), 33);

        let mut acc = FocusAccumulator::new();
        acc.observe(true, 1_000);
        acc.observe(false, 2_000);
        acc.observe(true, 9_000);
        // 1 of 8 seconds focused: 12.5 -> 13
        assert_eq!(acc.focus_percentage(), 13);
    }

    #[test]
    fn observe_verdict_matches_observe() {
        let mut a = FocusAccumulator::new();
        let mut b = FocusAccumulator::new();

        a.observe(true, 1_500);
        b.observe_verdict(FocusVerdict::new(true, 1_500));

        assert_eq!(a, b);
    }
}
