//! Session orchestration
//!
//! This module provides the public API for Blinksense. A `BlinkSession` owns
//! every piece of per-session state — detector, statistics, alert gate — and
//! processes each frame sample to completion before the next one is accepted:
//! geometry → state machine → aggregator → alert, synchronously, no I/O.
//! Sessions are fully isolated; hosts running several subjects create one
//! session each.

use crate::alert::AlertPolicy;
use crate::config::{EngineConfig, LandmarkTopology};
use crate::detector::{BlinkDetector, EarSample, EyeState};
use crate::error::EngineError;
use crate::geometry::{averaged_ear, eye_aspect_ratio};
use crate::stats::BlinkStats;
use crate::types::{
    BlinkEvent, BlinkUpdate, FatigueAlert, FrameSample, FrameUpdate, LandmarkPoint, RateBucket,
    TimestampMs,
};
use crate::viewport::{bounding_box, zoom_transform};

/// Process a frame sequence through a fresh session (stateless, one-shot).
///
/// # Arguments
/// * `config` - Validated engine configuration
/// * `frames` - Frame samples in arrival order
///
/// # Returns
/// One `FrameUpdate` per input frame
pub fn process_frames(
    config: EngineConfig,
    frames: &[FrameSample],
) -> Result<Vec<FrameUpdate>, EngineError> {
    let mut session = BlinkSession::new(config)?;
    Ok(frames.iter().map(|f| session.process_frame(f)).collect())
}

/// Stateful per-session processor.
///
/// Create one at session start (camera/inference up) and drop it at teardown;
/// blink history accumulates for the session's lifetime and is only consulted
/// through time-windowed queries.
#[derive(Debug, Clone)]
pub struct BlinkSession {
    config: EngineConfig,
    topology: LandmarkTopology,
    detector: BlinkDetector,
    stats: BlinkStats,
    alerts: AlertPolicy,
    paused: bool,
}

impl BlinkSession {
    /// Create a session with the default MediaPipe landmark topology
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_topology(config, LandmarkTopology::default())
    }

    /// Create a session with a custom eye-index mapping
    pub fn with_topology(
        config: EngineConfig,
        topology: LandmarkTopology,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            detector: BlinkDetector::new(&config),
            alerts: AlertPolicy::new(config.low_rate_alert_threshold, config.alert_cooldown_ms),
            stats: BlinkStats::new(),
            topology,
            config,
            paused: false,
        })
    }

    /// Process one frame sample to completion.
    ///
    /// Paused frames are acknowledged (so the inference pipeline is not
    /// starved) but produce no state mutation, event, or alert evaluation.
    /// No-face frames are valid signal, not errors: they reset the
    /// closing-episode state. A frame whose EAR is unreadable (degenerate
    /// geometry, short landmark list) is skipped for blink logic only —
    /// accumulated state is untouched.
    pub fn process_frame(&mut self, frame: &FrameSample) -> FrameUpdate {
        if self.paused {
            return FrameUpdate::skipped(frame.timestamp_ms, true);
        }

        let Some(landmarks) = frame.landmarks.as_deref() else {
            self.detector.step(EarSample {
                timestamp_ms: frame.timestamp_ms,
                ear: 0.0,
                face_present: false,
            });
            return FrameUpdate::skipped(frame.timestamp_ms, false);
        };

        let bbox = bounding_box(landmarks, self.config.padding_fraction);
        let zoom = bbox.map(|b| zoom_transform(&b, self.config.max_zoom));

        let ear = match self.read_averaged_ear(landmarks) {
            Ok(ear) => ear,
            Err(_) => {
                // No reliable reading this frame; keep the episode state.
                return FrameUpdate {
                    timestamp_ms: frame.timestamp_ms,
                    paused: false,
                    face_detected: true,
                    ear: None,
                    bounding_box: bbox,
                    zoom,
                    blink: None,
                };
            }
        };

        let event = self.detector.step(EarSample {
            timestamp_ms: frame.timestamp_ms,
            ear,
            face_present: true,
        });
        let blink = event.map(|e| self.on_blink(e));

        FrameUpdate {
            timestamp_ms: frame.timestamp_ms,
            paused: false,
            face_detected: true,
            ear: Some(ear),
            bounding_box: bbox,
            zoom,
            blink,
        }
    }

    /// Record a confirmed blink and run the alert gate, once per event
    fn on_blink(&mut self, event: BlinkEvent) -> BlinkUpdate {
        self.stats.record_blink(event.timestamp_ms);

        let total_blinks = self.stats.total_blinks();
        let rate_per_minute = self.stats.current_rate(event.timestamp_ms);
        let alert_raised = self
            .alerts
            .evaluate(total_blinks, rate_per_minute, event.timestamp_ms)
            .cloned();

        BlinkUpdate {
            event,
            total_blinks,
            rate_per_minute,
            history: self.stats.history_buckets(event.timestamp_ms),
            alert_raised,
        }
    }

    fn read_averaged_ear(&self, landmarks: &[LandmarkPoint]) -> Result<f64, EngineError> {
        let left = eye_points(landmarks, &self.topology.left_eye)?;
        let right = eye_points(landmarks, &self.topology.right_eye)?;
        Ok(averaged_ear(
            eye_aspect_ratio(&left)?,
            eye_aspect_ratio(&right)?,
        ))
    }

    // --- controls accepted from the presentation collaborator ---

    /// Stop processing without mutating state; resuming continues seamlessly
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Reconfigure the EAR threshold mid-session (validated, never clamped)
    pub fn set_ear_threshold(&mut self, threshold: f64) -> Result<(), EngineError> {
        let mut config = self.config.clone();
        config.ear_threshold = threshold;
        config.validate()?;
        self.config = config;
        self.detector.set_ear_threshold(threshold);
        Ok(())
    }

    /// Reconfigure the low-rate alert threshold mid-session
    pub fn set_low_rate_threshold(&mut self, threshold: u32) -> Result<(), EngineError> {
        let mut config = self.config.clone();
        config.low_rate_alert_threshold = threshold;
        config.validate()?;
        self.config = config;
        self.alerts.set_threshold(threshold);
        Ok(())
    }

    /// Replace the whole configuration. Detector state, blink history, and
    /// the alert cooldown clock all survive.
    pub fn reconfigure(&mut self, config: EngineConfig) -> Result<(), EngineError> {
        config.validate()?;
        self.detector.apply_config(&config);
        self.alerts.set_threshold(config.low_rate_alert_threshold);
        self.config = config;
        Ok(())
    }

    /// Dismiss the asserted low-rate alert
    pub fn acknowledge_alert(&mut self) {
        self.alerts.acknowledge();
    }

    // --- read accessors for the presentation collaborator ---

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn topology(&self) -> &LandmarkTopology {
        &self.topology
    }

    pub fn eye_state(&self) -> EyeState {
        self.detector.state()
    }

    pub fn total_blinks(&self) -> u64 {
        self.stats.total_blinks()
    }

    pub fn current_rate(&self, now: TimestampMs) -> u32 {
        self.stats.current_rate(now)
    }

    pub fn history_buckets(&self, now: TimestampMs) -> Vec<RateBucket> {
        self.stats.history_buckets(now)
    }

    pub fn last_blink_at(&self) -> Option<TimestampMs> {
        self.detector.last_blink_at()
    }

    pub fn active_alert(&self) -> Option<&FatigueAlert> {
        self.alerts.active_alert()
    }

    /// Lifetime count of raised alerts
    pub fn alerts_raised(&self) -> u64 {
        self.alerts.raised_count()
    }
}

/// Gather one eye's six landmarks by topology index
fn eye_points(
    landmarks: &[LandmarkPoint],
    indices: &[usize; 6],
) -> Result<[LandmarkPoint; 6], EngineError> {
    let mut points = [LandmarkPoint::new(0.0, 0.0); 6];
    for (slot, &index) in points.iter_mut().zip(indices.iter()) {
        *slot = *landmarks
            .get(index)
            .ok_or(EngineError::MissingLandmarks {
                index,
                available: landmarks.len(),
            })?;
    }
    Ok(points)
}
