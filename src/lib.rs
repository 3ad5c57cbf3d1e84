// Library surface for headless/integration tests and reuse.
// The binary only adds terminal setup and CLI parsing on top.
pub mod accumulator;
pub mod app;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod detection;
pub mod error;
pub mod landmarks;
pub mod runtime;
pub mod session;
pub mod stopwatch;
pub mod ui;
pub mod util;

pub use accumulator::{FocusAccumulator, FocusState, FocusVerdict, TransitionEvent};
pub use classifier::FocusClassifier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DetectionError, FocusError};
pub use landmarks::{LandmarkSet, Point};
pub use session::{DetectionStatus, FocusSession, SessionView};
pub use stopwatch::{StopwatchEngine, StopwatchPhase, TimerState};
