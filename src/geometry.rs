//! Eye geometry
//!
//! Pure functions deriving the Eye Aspect Ratio (EAR) from eye landmark
//! subsets. EAR is the ratio of vertical to horizontal eye-landmark
//! distances; low values indicate a closed or closing eye.

use crate::error::EngineError;
use crate::types::LandmarkPoint;

/// Horizontal extents below this are treated as unreadable geometry
const HORIZONTAL_EPSILON: f64 = 1e-6;

/// Planar Euclidean distance over (x, y); depth is ignored
pub fn distance(a: &LandmarkPoint, b: &LandmarkPoint) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Compute the EAR for one eye from its six landmarks.
///
/// Point order is fixed: `[p0..p5]` = (outer corner, upper lid 1, upper lid 2,
/// inner corner, lower lid 2, lower lid 1), so
///
/// ```text
/// EAR = (|p1 - p5| + |p2 - p4|) / (2 * |p0 - p3|)
/// ```
///
/// Returns `DegenerateGeometry` when the horizontal corner distance is at or
/// below epsilon; callers treat that as "no reliable reading" for the frame.
pub fn eye_aspect_ratio(points: &[LandmarkPoint; 6]) -> Result<f64, EngineError> {
    let horizontal = distance(&points[0], &points[3]);
    if horizontal <= HORIZONTAL_EPSILON {
        return Err(EngineError::DegenerateGeometry(horizontal));
    }

    let vertical1 = distance(&points[1], &points[5]);
    let vertical2 = distance(&points[2], &points[4]);

    Ok((vertical1 + vertical2) / (2.0 * horizontal))
}

/// Arithmetic mean of both eyes' EAR; the single signal the blink state
/// machine consumes.
pub fn averaged_ear(left: f64, right: f64) -> f64 {
    (left + right) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye(points: [(f64, f64); 6]) -> [LandmarkPoint; 6] {
        points.map(|(x, y)| LandmarkPoint::new(x, y))
    }

    #[test]
    fn test_distance_is_planar() {
        let mut a = LandmarkPoint::new(0.0, 0.0);
        let b = LandmarkPoint::new(3.0, 4.0);
        assert!((distance(&a, &b) - 5.0).abs() < 1e-12);

        // Depth must not contribute
        a.z = 10.0;
        assert!((distance(&a, &b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_open_eye_ear() {
        // Horizontal span 0.1, both vertical pairs 0.03 apart
        let points = eye([
            (0.30, 0.50),
            (0.33, 0.485),
            (0.37, 0.485),
            (0.40, 0.50),
            (0.37, 0.515),
            (0.33, 0.515),
        ]);

        let ear = eye_aspect_ratio(&points).unwrap();
        // (0.03 + 0.03) / (2 * 0.1) = 0.3
        assert!((ear - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_closed_eye_ear_near_zero() {
        let points = eye([
            (0.30, 0.50),
            (0.33, 0.50),
            (0.37, 0.50),
            (0.40, 0.50),
            (0.37, 0.50),
            (0.33, 0.50),
        ]);

        let ear = eye_aspect_ratio(&points).unwrap();
        assert!(ear.abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_horizontal_distance() {
        // All six points coincide: corner distance is zero
        let points = eye([(0.5, 0.5); 6]);

        match eye_aspect_ratio(&points) {
            Err(EngineError::DegenerateGeometry(h)) => assert!(h <= 1e-6),
            other => panic!("expected DegenerateGeometry, got {other:?}"),
        }
    }

    #[test]
    fn test_averaged_ear() {
        assert!((averaged_ear(0.3, 0.1) - 0.2).abs() < 1e-12);
        assert_eq!(averaged_ear(0.25, 0.25), 0.25);
    }
}
