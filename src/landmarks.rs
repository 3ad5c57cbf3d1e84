use std::ops::Range;

use crate::error::{FocusError, FocusResult};

/// Number of points in the standard face landmark layout.
pub const FACE_POINT_COUNT: usize = 68;

const JAW: Range<usize> = 0..17;
const LEFT_EYEBROW: Range<usize> = 17..22;
const RIGHT_EYEBROW: Range<usize> = 22..27;
const NOSE: Range<usize> = 27..36;
const LEFT_EYE: Range<usize> = 36..42;
const RIGHT_EYE: Range<usize> = 42..48;
const MOUTH: Range<usize> = 48..68;

// Offsets inside the nose and eye groups
const NOSE_TIP: usize = 3;
const EYE_BOTTOM: usize = 4;

/// 2D image coordinate, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

/// Landmarks of a single detected face, grouped by facial feature.
///
/// Groups may be short or empty when a detector hands back a partial
/// result; the accessors report that instead of panicking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    pub jaw: Vec<Point>,
    pub left_eyebrow: Vec<Point>,
    pub right_eyebrow: Vec<Point>,
    pub nose: Vec<Point>,
    pub left_eye: Vec<Point>,
    pub right_eye: Vec<Point>,
    pub mouth: Vec<Point>,
}

impl LandmarkSet {
    /// Split a flat point list laid out on the 68-point scheme into groups.
    /// Missing trailing points leave the affected groups short.
    pub fn from_points(points: &[Point]) -> Self {
        let group = |range: Range<usize>| -> Vec<Point> {
            points
                .get(range.start.min(points.len())..range.end.min(points.len()))
                .map(<[Point]>::to_vec)
                .unwrap_or_default()
        };

        Self {
            jaw: group(JAW),
            left_eyebrow: group(LEFT_EYEBROW),
            right_eyebrow: group(RIGHT_EYEBROW),
            nose: group(NOSE),
            left_eye: group(LEFT_EYE),
            right_eye: group(RIGHT_EYE),
            mouth: group(MOUTH),
        }
    }

    /// Flatten back to the 68-point order.
    pub fn points(&self) -> Vec<Point> {
        [
            &self.jaw,
            &self.left_eyebrow,
            &self.right_eyebrow,
            &self.nose,
            &self.left_eye,
            &self.right_eye,
            &self.mouth,
        ]
        .into_iter()
        .flatten()
        .copied()
        .collect()
    }

    pub fn nose_tip(&self) -> FocusResult<Point> {
        pick(&self.nose, "nose", NOSE_TIP)
    }

    pub fn left_eye_bottom(&self) -> FocusResult<Point> {
        pick(&self.left_eye, "left_eye", EYE_BOTTOM)
    }

    pub fn right_eye_bottom(&self) -> FocusResult<Point> {
        pick(&self.right_eye, "right_eye", EYE_BOTTOM)
    }

    /// Build a rough frontal face centred on `center_x`, eyes at `eye_y`,
    /// with the nose tip `nose_drop` below the eye line (negative raises it).
    pub fn synthetic(center_x: f64, eye_y: f64, nose_drop: f64) -> Self {
        let eye = |cx: f64| -> Vec<Point> {
            vec![
                Point::new(cx - 15.0, eye_y),
                Point::new(cx - 5.0, eye_y - 5.0),
                Point::new(cx + 5.0, eye_y - 5.0),
                Point::new(cx + 15.0, eye_y),
                Point::new(cx + 5.0, eye_y + 5.0),
                Point::new(cx - 5.0, eye_y + 5.0),
            ]
        };
        // Eye bottom sits 5px under eye_y; keep the tip relative to that line.
        let tip_y = eye_y + 5.0 + nose_drop;
        let bridge_top = eye_y - 10.0;
        let nose = (0..9)
            .map(|i| {
                if i < NOSE_TIP {
                    let step = (tip_y - bridge_top) / NOSE_TIP as f64;
                    Point::new(center_x, bridge_top + step * i as f64)
                } else if i == NOSE_TIP {
                    Point::new(center_x, tip_y)
                } else {
                    Point::new(center_x - 20.0 + 8.0 * (i - 4) as f64, tip_y + 5.0)
                }
            })
            .collect();

        Self {
            jaw: (0..17)
                .map(|i| Point::new(center_x - 80.0 + 10.0 * i as f64, eye_y + 60.0))
                .collect(),
            left_eyebrow: (0..5)
                .map(|i| Point::new(center_x - 60.0 + 10.0 * i as f64, eye_y - 20.0))
                .collect(),
            right_eyebrow: (0..5)
                .map(|i| Point::new(center_x + 20.0 + 10.0 * i as f64, eye_y - 20.0))
                .collect(),
            nose,
            left_eye: eye(center_x - 35.0),
            right_eye: eye(center_x + 35.0),
            mouth: (0..20)
                .map(|i| Point::new(center_x - 25.0 + 2.5 * i as f64, tip_y + 30.0))
                .collect(),
        }
    }
}

fn pick(group: &[Point], name: &'static str, index: usize) -> FocusResult<Point> {
    let point = group
        .get(index)
        .copied()
        .ok_or(FocusError::MalformedLandmarks { group: name, index })?;

    if point.x.is_finite() && point.y.is_finite() {
        Ok(point)
    } else {
        Err(FocusError::NonFiniteCoordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn numbered_points() -> Vec<Point> {
        (0..FACE_POINT_COUNT)
            .map(|i| Point::new(i as f64, i as f64 * 2.0))
            .collect()
    }

    #[test]
    fn from_points_splits_groups() {
        let set = LandmarkSet::from_points(&numbered_points());

        assert_eq!(set.jaw.len(), 17);
        assert_eq!(set.nose.len(), 9);
        assert_eq!(set.left_eye.len(), 6);
        assert_eq!(set.right_eye.len(), 6);
        assert_eq!(set.mouth.len(), 20);
        assert_eq!(set.points().len(), FACE_POINT_COUNT);
    }

    #[test]
    fn named_points_follow_layout() {
        let set = LandmarkSet::from_points(&numbered_points());

        assert_eq!(set.nose_tip().unwrap(), Point::new(30.0, 60.0));
        assert_eq!(set.left_eye_bottom().unwrap(), Point::new(40.0, 80.0));
        assert_eq!(set.right_eye_bottom().unwrap(), Point::new(46.0, 92.0));
    }

    #[test]
    fn truncated_points_report_missing_group() {
        let points = numbered_points();
        let set = LandmarkSet::from_points(&points[..30]);

        assert!(set.left_eye.is_empty());
        assert_matches!(
            set.nose_tip(),
            Err(FocusError::MalformedLandmarks { group: "nose", .. })
        );
        assert_matches!(
            set.left_eye_bottom(),
            Err(FocusError::MalformedLandmarks {
                group: "left_eye",
                index: 4
            })
        );
    }

    #[test]
    fn nan_coordinate_is_rejected() {
        let mut set = LandmarkSet::synthetic(100.0, 100.0, 10.0);
        set.nose[NOSE_TIP].y = f64::NAN;

        assert_eq!(set.nose_tip(), Err(FocusError::NonFiniteCoordinate));
    }

    #[test]
    fn synthetic_face_places_nose_relative_to_eye_line() {
        let down = LandmarkSet::synthetic(100.0, 100.0, 12.0);
        let eye_bottom = down.left_eye_bottom().unwrap().y;
        assert_eq!(down.nose_tip().unwrap().y - eye_bottom, 12.0);

        let up = LandmarkSet::synthetic(100.0, 100.0, -12.0);
        assert!(up.nose_tip().unwrap().y < up.right_eye_bottom().unwrap().y);
        assert_eq!(up.points().len(), FACE_POINT_COUNT);
    }
}
