//! Shared fixtures for unit tests: a compact 12-point topology and synthetic
//! eye landmark frames, so detection paths are driven without a camera or a
//! real inference engine.

use crate::config::{EngineConfig, LandmarkTopology};
use crate::types::{FrameSample, LandmarkPoint, TimestampMs};

/// Topology whose eyes are the first twelve landmark slots
pub const TEST_TOPOLOGY: LandmarkTopology = LandmarkTopology {
    left_eye: [0, 1, 2, 3, 4, 5],
    right_eye: [6, 7, 8, 9, 10, 11],
};

pub fn test_config() -> EngineConfig {
    EngineConfig::default()
}

/// Six landmarks for one eye at the given corner position and lid opening
fn eye(origin_x: f64, half_gap: f64) -> Vec<LandmarkPoint> {
    vec![
        LandmarkPoint::new(origin_x, 0.50),
        LandmarkPoint::new(origin_x + 0.03, 0.50 - half_gap),
        LandmarkPoint::new(origin_x + 0.07, 0.50 - half_gap),
        LandmarkPoint::new(origin_x + 0.10, 0.50),
        LandmarkPoint::new(origin_x + 0.07, 0.50 + half_gap),
        LandmarkPoint::new(origin_x + 0.03, 0.50 + half_gap),
    ]
}

/// Frame with both eyes open: averaged EAR = 0.3
pub fn open_eye_frame(timestamp_ms: TimestampMs) -> FrameSample {
    let mut landmarks = eye(0.30, 0.015);
    landmarks.extend(eye(0.60, 0.015));
    FrameSample::with_landmarks(timestamp_ms, landmarks)
}

/// Frame with both eyes nearly shut: averaged EAR = 0.1
pub fn closed_eye_frame(timestamp_ms: TimestampMs) -> FrameSample {
    let mut landmarks = eye(0.30, 0.005);
    landmarks.extend(eye(0.60, 0.005));
    FrameSample::with_landmarks(timestamp_ms, landmarks)
}
