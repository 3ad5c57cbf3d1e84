use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::accumulator::{FocusAccumulator, FocusVerdict, TransitionEvent};
use crate::classifier::FocusClassifier;
use crate::clock::Clock;
use crate::config::Config;
use crate::detection::DetectionResult;
use crate::landmarks::LandmarkSet;
use crate::stopwatch::{StopwatchEngine, StopwatchPhase};
use crate::util::format_secs;

/// Whether focus tracking is feeding the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionStatus {
    /// No frame processed yet
    Starting,
    Active,
    /// Tracking is off for good; the stopwatch keeps working on its own.
    Unavailable(String),
}

impl std::fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionStatus::Starting => write!(f, "Starting focus tracking..."),
            DetectionStatus::Active => write!(f, "Focus tracking active"),
            DetectionStatus::Unavailable(reason) => {
                write!(f, "Focus tracking unavailable ({}), timer only", reason)
            }
        }
    }
}

/// Read-only snapshot for whatever draws the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub elapsed: String,
    pub phase: StopwatchPhase,
    pub focused: bool,
    pub focused_time: String,
    pub distracted_time: String,
    pub focus_percentage: u32,
    pub can_start: bool,
    pub can_pause: bool,
    pub can_reset: bool,
    pub pause_label: &'static str,
    pub status: DetectionStatus,
    pub started_at: Option<DateTime<Local>>,
    /// Times focus tracking paused the stopwatch since the last reset
    pub auto_pauses: u32,
}

/// One study session: focus accounting, the stopwatch, and the policy
/// tying them together.
///
/// While the stopwatch is running, a transition to distracted pauses it and
/// a transition to focused resumes it. Manual pause/resume goes through the
/// same stopwatch operations, so whichever happens last wins: a user pause
/// is undone by the next focus transition and vice versa.
#[derive(Debug)]
pub struct FocusSession<C: Clock> {
    clock: C,
    classifier: FocusClassifier,
    accumulator: FocusAccumulator,
    stopwatch: StopwatchEngine,
    auto_pause: bool,
    status: DetectionStatus,
    started_at: Option<DateTime<Local>>,
    auto_pauses: u32,
    auto_resumes: u32,
}

impl<C: Clock> FocusSession<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            classifier: FocusClassifier::new(),
            accumulator: FocusAccumulator::new(),
            stopwatch: StopwatchEngine::new(),
            auto_pause: true,
            status: DetectionStatus::Starting,
            started_at: None,
            auto_pauses: 0,
            auto_resumes: 0,
        }
    }

    pub fn with_config(clock: C, config: &Config) -> Self {
        let mut session = Self::new(clock);
        session.auto_pause = config.auto_pause;
        session
    }

    pub fn start(&mut self) -> bool {
        let started = self.stopwatch.start(self.clock.now_ms());
        if started {
            self.started_at.get_or_insert_with(Local::now);
            info!("session started");
        }
        started
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.stopwatch.pause(self.clock.now_ms());
        if paused {
            info!(elapsed = %self.stopwatch.formatted(), "paused");
        }
        paused
    }

    pub fn resume(&mut self) -> bool {
        let resumed = self.stopwatch.resume(self.clock.now_ms());
        if resumed {
            info!(elapsed = %self.stopwatch.formatted(), "resumed");
        }
        resumed
    }

    /// The Pause/Resume button.
    pub fn toggle_pause(&mut self) -> bool {
        if self.stopwatch.is_paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Clears the stopwatch and both focus counters together.
    pub fn reset(&mut self) {
        self.stopwatch.reset();
        self.accumulator.reset();
        self.started_at = None;
        self.auto_pauses = 0;
        self.auto_resumes = 0;
        info!("session reset");
    }

    /// Periodic display refresh, see [`StopwatchEngine::on_tick`].
    pub fn on_tick(&mut self) -> Option<u64> {
        self.stopwatch.on_tick(self.clock.now_ms())
    }

    /// Feed one timestamped verdict. Durations are charged by `verdict.at_ms`;
    /// the stopwatch reacts at the current clock reading.
    pub fn record(&mut self, verdict: FocusVerdict) -> Option<TransitionEvent> {
        let event = self.accumulator.observe_verdict(verdict)?;
        self.apply_transition(event);
        Some(event)
    }

    /// Feed one focus verdict, stamped with the current clock reading.
    pub fn observe_verdict(&mut self, focused: bool) -> Option<TransitionEvent> {
        self.record(FocusVerdict::new(focused, self.clock.now_ms()))
    }

    /// Classify the faces found in one frame and feed the verdict, stamped
    /// with the current clock reading.
    pub fn observe_faces(&mut self, faces: &[LandmarkSet]) -> Option<TransitionEvent> {
        self.observe_faces_at(faces, self.clock.now_ms())
    }

    fn observe_faces_at(&mut self, faces: &[LandmarkSet], at_ms: u64) -> Option<TransitionEvent> {
        let focused = self.classifier.classify_faces(faces);
        self.record(FocusVerdict::new(focused, at_ms))
    }

    /// Handle one detection loop result captured at `at_ms`. Failures never
    /// reach the stopwatch: transient ones are skipped, fatal ones switch
    /// tracking off.
    pub fn observe_frame(&mut self, at_ms: u64, frame: DetectionResult) -> Option<TransitionEvent> {
        match frame {
            Ok(faces) => {
                if self.status != DetectionStatus::Active {
                    info!("focus tracking active");
                    self.status = DetectionStatus::Active;
                }
                self.observe_faces_at(&faces, at_ms)
            }
            Err(err) if err.is_fatal() => {
                warn!(%err, "focus tracking disabled");
                self.status = DetectionStatus::Unavailable(err.to_string());
                None
            }
            Err(err) => {
                debug!(%err, "skipping frame");
                None
            }
        }
    }

    fn apply_transition(&mut self, event: TransitionEvent) {
        if !self.auto_pause || !self.stopwatch.is_running() {
            return;
        }
        let now = self.clock.now_ms();
        if event.became_focused {
            if self.stopwatch.resume(now) {
                self.auto_resumes += 1;
                info!("focus regained, resumed");
            }
        } else if self.stopwatch.pause(now) {
            self.auto_pauses += 1;
            info!("distraction detected, paused");
        }
    }

    pub fn view(&self) -> SessionView {
        let running = self.stopwatch.is_running();
        let paused = self.stopwatch.is_paused();
        let has_focus_time =
            self.accumulator.focused_secs() + self.accumulator.distracted_secs() > 0.0;

        SessionView {
            elapsed: self.stopwatch.formatted(),
            phase: self.stopwatch.phase(),
            focused: self.accumulator.is_focused(),
            focused_time: format_secs(self.accumulator.focused_secs()),
            distracted_time: format_secs(self.accumulator.distracted_secs()),
            focus_percentage: self.accumulator.focus_percentage(),
            can_start: !running,
            can_pause: running,
            can_reset: running || has_focus_time,
            pause_label: if paused { "Resume" } else { "Pause" },
            status: self.status.clone(),
            started_at: self.started_at,
            auto_pauses: self.auto_pauses,
        }
    }

    /// (pauses, resumes) issued by focus transitions since the last reset
    pub fn auto_actions(&self) -> (u32, u32) {
        (self.auto_pauses, self.auto_resumes)
    }

    pub fn accumulator(&self) -> &FocusAccumulator {
        &self.accumulator
    }

    pub fn stopwatch(&self) -> &StopwatchEngine {
        &self.stopwatch
    }

    pub fn status(&self) -> &DetectionStatus {
        &self.status
    }

    pub fn auto_pause(&self) -> bool {
        self.auto_pause
    }

    pub fn set_auto_pause(&mut self, enabled: bool) {
        self.auto_pause = enabled;
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.stopwatch.elapsed_ms(self.clock.now_ms())
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
