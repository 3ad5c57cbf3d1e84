use tracing::warn;

use crate::error::FocusResult;
use crate::landmarks::LandmarkSet;

/// Head-tilt heuristic: a nose tip below the eye line means the head is
/// tilted down towards a desk, which counts as focused.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusClassifier;

impl FocusClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the primary face. No face is never focused.
    pub fn try_classify(&self, landmarks: Option<&LandmarkSet>) -> FocusResult<bool> {
        let Some(landmarks) = landmarks else {
            return Ok(false);
        };

        let eye_level = (landmarks.left_eye_bottom()?.y + landmarks.right_eye_bottom()?.y) / 2.0;
        let nose_tip_y = landmarks.nose_tip()?.y;

        Ok(nose_tip_y > eye_level)
    }

    /// Like [`try_classify`](Self::try_classify) but malformed landmarks
    /// count as not focused; the next frame gets a fresh try.
    pub fn classify(&self, landmarks: Option<&LandmarkSet>) -> bool {
        self.try_classify(landmarks).unwrap_or_else(|err| {
            warn!(%err, "discarding malformed landmarks");
            false
        })
    }

    /// The first face a detector reports is treated as the user.
    pub fn classify_faces(&self, faces: &[LandmarkSet]) -> bool {
        self.classify(faces.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FocusError;
    use crate::landmarks::Point;
    use assert_matches::assert_matches;

    #[test]
    fn no_face_is_distracted() {
        let classifier = FocusClassifier::new();
        assert!(!classifier.classify(None));
        assert!(!classifier.classify_faces(&[]));
    }

    #[test]
    fn head_down_is_focused() {
        let face = LandmarkSet::synthetic(320.0, 200.0, 15.0);
        assert!(FocusClassifier.classify(Some(&face)));
    }

    #[test]
    fn head_up_is_distracted() {
        let face = LandmarkSet::synthetic(320.0, 200.0, -15.0);
        assert!(!FocusClassifier.classify(Some(&face)));
    }

    #[test]
    fn nose_exactly_on_eye_line_is_distracted() {
        let face = LandmarkSet::synthetic(320.0, 200.0, 0.0);
        assert!(!FocusClassifier.classify(Some(&face)));
    }

    #[test]
    fn eye_level_is_the_mean_of_both_eyes() {
        let mut face = LandmarkSet::synthetic(320.0, 200.0, 0.0);
        // left eye bottom 205 -> 195, right stays 205: mean 200, tip 205
        face.left_eye[4] = Point::new(280.0, 195.0);
        assert!(FocusClassifier.classify(Some(&face)));

        face.left_eye[4] = Point::new(280.0, 215.0);
        assert!(!FocusClassifier.classify(Some(&face)));
    }

    #[test]
    fn malformed_landmarks_fail_safe() {
        let mut face = LandmarkSet::synthetic(320.0, 200.0, 15.0);
        face.right_eye.clear();

        assert_matches!(
            FocusClassifier.try_classify(Some(&face)),
            Err(FocusError::MalformedLandmarks {
                group: "right_eye",
                ..
            })
        );
        assert!(!FocusClassifier.classify(Some(&face)));
    }

    #[test]
    fn only_the_primary_face_counts() {
        let focused = LandmarkSet::synthetic(320.0, 200.0, 15.0);
        let upright = LandmarkSet::synthetic(100.0, 200.0, -15.0);

        assert!(FocusClassifier.classify_faces(&[focused.clone(), upright.clone()]));
        assert!(!FocusClassifier.classify_faces(&[upright, focused]));
    }
}
