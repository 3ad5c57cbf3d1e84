/// Errors reported by a detection adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectionError {
    #[error("detection model could not be loaded: {0}")]
    ModelLoad(String),

    #[error("camera access denied: {0}")]
    CameraAccessDenied(String),

    #[error("detection cycle failed: {0}")]
    Cycle(String),

    #[error("detector crashed: {0}")]
    Crashed(String),
}

impl DetectionError {
    /// Fatal errors switch focus tracking off for the rest of the process.
    /// Cycle failures are retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DetectionError::ModelLoad(_)
                | DetectionError::CameraAccessDenied(_)
                | DetectionError::Crashed(_)
        )
    }
}

/// Errors raised while classifying focus.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FocusError {
    #[error("landmark group `{group}` is missing point {index}")]
    MalformedLandmarks { group: &'static str, index: usize },

    #[error("landmark coordinate is not finite")]
    NonFiniteCoordinate,
}

pub type FocusResult<T> = Result<T, FocusError>;
