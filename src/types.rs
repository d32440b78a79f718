//! Core types for the Blinksense pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! per-frame pipeline: landmark samples, derived geometry, blink events, and the
//! presentation-facing update payloads.

use serde::{Deserialize, Serialize};

/// Milliseconds on the host's monotonic frame clock
pub type TimestampMs = u64;

/// A single facial landmark, normalized to the frame.
///
/// `x` and `y` are in `[0, 1]` relative to frame width/height; `z` is the
/// model's relative depth and is ignored by all planar computations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// One inference callback's worth of data: a timestamp plus either the ordered
/// landmark list or `None` when no face was found in the frame.
///
/// Produced once per callback and consumed immediately, never retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSample {
    pub timestamp_ms: TimestampMs,
    pub landmarks: Option<Vec<LandmarkPoint>>,
}

impl FrameSample {
    /// A frame in which the inference collaborator found no face
    pub fn no_face(timestamp_ms: TimestampMs) -> Self {
        Self {
            timestamp_ms,
            landmarks: None,
        }
    }

    pub fn with_landmarks(timestamp_ms: TimestampMs, landmarks: Vec<LandmarkPoint>) -> Self {
        Self {
            timestamp_ms,
            landmarks: Some(landmarks),
        }
    }
}

/// Axis-aligned face bounding region, padded and clamped to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Center of the box, per axis
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Zoom/translate transform that re-centers the face box in the frame.
///
/// Translation is expressed as a percentage offset per axis, matching a CSS
/// `translate(x%, y%)` consumer on the presentation side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub scale: f64,
    pub translate_x_pct: f64,
    pub translate_y_pct: f64,
}

/// A confirmed blink. Immutable once created; appended to history and only
/// consulted through time-windowed queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkEvent {
    pub timestamp_ms: TimestampMs,
}

/// One bucket of the trailing blink-rate history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBucket {
    /// Human-readable offset label ("Now", "-30s", "-2m", "-1m30s")
    pub label: String,
    /// Bucket count normalized to a per-minute rate
    pub blinks_per_minute: f64,
}

/// Low-blink-rate alert surfaced to the presentation layer.
///
/// Stays asserted until the caller acknowledges it, independent of the
/// policy's internal cooldown clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueAlert {
    pub raised_at_ms: TimestampMs,
    /// Rate that triggered the alert (blinks per minute)
    pub rate_per_minute: u32,
    pub message: String,
}

/// Per-blink statistics delta, emitted only on frames where a blink confirmed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlinkUpdate {
    pub event: BlinkEvent,
    /// Lifetime session total
    pub total_blinks: u64,
    /// Blinks in the trailing 60 s window
    pub rate_per_minute: u32,
    pub history: Vec<RateBucket>,
    /// Present when this blink's evaluation raised the low-rate alert
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_raised: Option<FatigueAlert>,
}

/// Per-frame output for the presentation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameUpdate {
    pub timestamp_ms: TimestampMs,
    /// Frame was acknowledged but produced no state mutation
    pub paused: bool,
    pub face_detected: bool,
    /// Averaged EAR; `None` when no face or no reliable reading this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blink: Option<BlinkUpdate>,
}

impl FrameUpdate {
    /// Empty update for an acknowledged-but-skipped frame
    pub(crate) fn skipped(timestamp_ms: TimestampMs, paused: bool) -> Self {
        Self {
            timestamp_ms,
            paused,
            face_detected: false,
            ear: None,
            bounding_box: None,
            zoom: None,
            blink: None,
        }
    }
}
