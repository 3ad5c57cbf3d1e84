//! Face detection boundary.
//!
//! The landmark model itself lives outside this crate. Anything that can
//! turn the next camera frame into landmark sets plugs in through
//! [`DetectionAdapter`]; the adapters here cover scripted replays, a
//! keyboard-steered simulation and the "no camera" case.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::error::DetectionError;
use crate::landmarks::LandmarkSet;

pub type DetectionResult = Result<Vec<LandmarkSet>, DetectionError>;

/// Produces the landmark sets for the next frame. The first set is the
/// primary face; an empty list means nobody is in view.
///
/// Calls may block for as long as acquiring and analysing a frame takes.
pub trait DetectionAdapter: Send + 'static {
    fn detect_frame(&mut self) -> DetectionResult;
}

/// Replays a fixed list of frame results, then reports empty frames.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    frames: VecDeque<DetectionResult>,
    delay: Duration,
}

impl ScriptedDetector {
    pub fn new<I: IntoIterator<Item = DetectionResult>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long per frame, mimicking a camera's frame rate.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl DetectionAdapter for ScriptedDetector {
    fn detect_frame(&mut self) -> DetectionResult {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.frames.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Always fails with the same fatal error. Used when no camera or model is
/// available so the app runs as a plain stopwatch.
#[derive(Debug, Clone)]
pub struct UnavailableDetector {
    error: DetectionError,
}

impl UnavailableDetector {
    pub fn new(error: DetectionError) -> Self {
        Self { error }
    }
}

impl DetectionAdapter for UnavailableDetector {
    fn detect_frame(&mut self) -> DetectionResult {
        Err(self.error.clone())
    }
}

/// Head position fed to the [`SimulatedDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum HeadPose {
    /// Looking down at the desk
    Down,
    /// Upright, looking at the screen or around the room
    Up,
    /// Nobody in front of the camera
    Away,
}

impl HeadPose {
    fn to_u8(self) -> u8 {
        match self {
            HeadPose::Down => 0,
            HeadPose::Up => 1,
            HeadPose::Away => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => HeadPose::Down,
            1 => HeadPose::Up,
            _ => HeadPose::Away,
        }
    }
}

/// Shared handle for steering a running [`SimulatedDetector`].
#[derive(Debug, Clone)]
pub struct HeadControl {
    pose: Arc<AtomicU8>,
}

impl HeadControl {
    pub fn new(pose: HeadPose) -> Self {
        Self {
            pose: Arc::new(AtomicU8::new(pose.to_u8())),
        }
    }

    pub fn set(&self, pose: HeadPose) {
        self.pose.store(pose.to_u8(), Ordering::SeqCst);
    }

    pub fn get(&self) -> HeadPose {
        HeadPose::from_u8(self.pose.load(Ordering::SeqCst))
    }

    /// Down <-> Up; Away comes back Down.
    pub fn toggle_tilt(&self) -> HeadPose {
        let next = match self.get() {
            HeadPose::Down => HeadPose::Up,
            HeadPose::Up | HeadPose::Away => HeadPose::Down,
        };
        self.set(next);
        next
    }

    /// Away <-> Down
    pub fn toggle_presence(&self) -> HeadPose {
        let next = match self.get() {
            HeadPose::Away => HeadPose::Down,
            HeadPose::Down | HeadPose::Up => HeadPose::Away,
        };
        self.set(next);
        next
    }
}

const SIM_CENTER_X: f64 = 320.0;
const SIM_EYE_Y: f64 = 200.0;
const SIM_TILT_PX: f64 = 12.0;

/// Synthesises a face from a [`HeadPose`] with a bit of positional noise,
/// standing in for a webcam and landmark model.
pub struct SimulatedDetector {
    control: HeadControl,
    frame_interval: Duration,
    jitter_px: f64,
    glitch_rate: f64,
}

impl SimulatedDetector {
    pub fn new(control: HeadControl, frame_interval: Duration) -> Self {
        Self {
            control,
            frame_interval,
            jitter_px: 4.0,
            glitch_rate: 0.0,
        }
    }

    /// Noise added to every landmark position. Above the tilt distance the
    /// verdict starts flickering. Non-finite values turn the noise off.
    pub fn with_jitter(mut self, jitter_px: f64) -> Self {
        self.jitter_px = if jitter_px.is_finite() {
            jitter_px.abs()
        } else {
            0.0
        };
        self
    }

    /// Probability that a frame fails with a transient cycle error.
    pub fn with_glitch_rate(mut self, rate: f64) -> Self {
        self.glitch_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn noisy_face(&self, nose_drop: f64) -> LandmarkSet {
        let mut rng = rand::thread_rng();
        let mut face = LandmarkSet::synthetic(SIM_CENTER_X, SIM_EYE_Y, nose_drop);
        if self.jitter_px > 0.0 {
            // shift the whole face and wobble the nose separately
            let dx = rng.gen_range(-self.jitter_px..=self.jitter_px);
            let dy = rng.gen_range(-self.jitter_px..=self.jitter_px);
            let wobble = rng.gen_range(-self.jitter_px..=self.jitter_px) / 4.0;
            for group in [
                &mut face.jaw,
                &mut face.left_eyebrow,
                &mut face.right_eyebrow,
                &mut face.nose,
                &mut face.left_eye,
                &mut face.right_eye,
                &mut face.mouth,
            ] {
                for p in group.iter_mut() {
                    p.x += dx;
                    p.y += dy;
                }
            }
            for p in face.nose.iter_mut() {
                p.y += wobble;
            }
        }
        face
    }
}

impl DetectionAdapter for SimulatedDetector {
    fn detect_frame(&mut self) -> DetectionResult {
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
        if self.glitch_rate > 0.0 && rand::thread_rng().gen_bool(self.glitch_rate) {
            return Err(DetectionError::Cycle("dropped frame".into()));
        }

        Ok(match self.control.get() {
            HeadPose::Down => vec![self.noisy_face(SIM_TILT_PX)],
            HeadPose::Up => vec![self.noisy_face(-SIM_TILT_PX)],
            HeadPose::Away => Vec::new(),
        })
    }
}
