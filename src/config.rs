//! Engine configuration
//!
//! All detection trade-offs are exposed here rather than hard-coded: the
//! debounce frame count, the minimum inter-blink interval, and the alert
//! thresholds are deployment tunables. Validation rejects out-of-range values
//! outright; nothing is silently clamped.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Settings-store key for the persisted EAR threshold (host-side persistence)
pub const PREF_KEY_EAR_THRESHOLD: &str = "blinksense.ear_threshold";

/// Settings-store key for the persisted low-rate alert threshold
pub const PREF_KEY_LOW_RATE_THRESHOLD: &str = "blinksense.low_rate_threshold";

/// Default averaged-EAR threshold below which the eyes count as closing.
/// 0.25 rather than the textbook 0.2 to stay sensitive to partial blinks.
pub const DEFAULT_EAR_THRESHOLD: f64 = 0.25;

/// Default low-blink-rate alert threshold (blinks per minute)
pub const DEFAULT_LOW_RATE_THRESHOLD: u32 = 10;

/// Trailing window for the current blink rate
pub const RATE_WINDOW_MS: u64 = 60_000;

/// Trailing window covered by the history buckets (10 minutes)
pub const HISTORY_WINDOW_MS: u64 = 600_000;

/// Width of one history bucket (30 seconds)
pub const HISTORY_BUCKET_MS: u64 = 30_000;

/// Landmark index mapping for one tracked subject.
///
/// Each eye is six indices into the inference collaborator's landmark list, in
/// the fixed order (outer corner, upper lid 1, upper lid 2, inner corner,
/// lower lid 2, lower lid 1). If the collaborator's model changes, only this
/// mapping changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkTopology {
    pub left_eye: [usize; 6],
    pub right_eye: [usize; 6],
}

impl Default for LandmarkTopology {
    /// MediaPipe FaceMesh eye contour indices
    fn default() -> Self {
        Self {
            left_eye: [33, 160, 158, 133, 153, 144],
            right_eye: [362, 385, 387, 263, 373, 380],
        }
    }
}

impl LandmarkTopology {
    /// Smallest landmark list length this topology can index into
    pub fn required_landmarks(&self) -> usize {
        self.left_eye
            .iter()
            .chain(self.right_eye.iter())
            .copied()
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }
}

/// Immutable per-session configuration, replaceable only by explicit
/// reconfiguration through the session API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Averaged EAR below this value counts as a closing eye, in (0, 1)
    pub ear_threshold: f64,
    /// Alert when the trailing-minute rate drops below this (blinks/min), >= 1
    pub low_rate_alert_threshold: u32,
    /// Consecutive sub-threshold frames required to confirm a blink, >= 1
    pub consecutive_frames_required: u32,
    /// Minimum spacing between two recorded blinks
    pub min_blink_interval_ms: u64,
    /// Open time required before the confirmed-blink latch re-arms
    pub settle_delay_ms: u64,
    /// Minimum spacing between two raised alerts
    pub alert_cooldown_ms: u64,
    /// Bounding-box padding as a fraction of the box's own extent, >= 0
    pub padding_fraction: f64,
    /// Zoom cap for the viewport transform, >= 1
    pub max_zoom: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ear_threshold: DEFAULT_EAR_THRESHOLD,
            low_rate_alert_threshold: DEFAULT_LOW_RATE_THRESHOLD,
            consecutive_frames_required: 2,
            min_blink_interval_ms: 100,
            settle_delay_ms: 50,
            alert_cooldown_ms: 60_000,
            padding_fraction: 0.2,
            max_zoom: 2.5,
        }
    }
}

impl EngineConfig {
    /// Validate all fields, rejecting rather than clamping out-of-range values
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.ear_threshold > 0.0 && self.ear_threshold < 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "ear_threshold must be in (0, 1), got {}",
                self.ear_threshold
            )));
        }
        if self.low_rate_alert_threshold < 1 {
            return Err(EngineError::InvalidConfig(
                "low_rate_alert_threshold must be >= 1".to_string(),
            ));
        }
        if self.consecutive_frames_required < 1 {
            return Err(EngineError::InvalidConfig(
                "consecutive_frames_required must be >= 1".to_string(),
            ));
        }
        if !(self.padding_fraction >= 0.0 && self.padding_fraction.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "padding_fraction must be finite and >= 0, got {}",
                self.padding_fraction
            )));
        }
        if !(self.max_zoom >= 1.0 && self.max_zoom.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "max_zoom must be finite and >= 1, got {}",
                self.max_zoom
            )));
        }
        Ok(())
    }

    /// Parse and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
