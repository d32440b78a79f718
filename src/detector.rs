//! Blink detection state machine
//!
//! Converts the continuous averaged-EAR signal into discrete blink events.
//! A single-frame threshold crossing is unreliable at webcam frame rates, so
//! confirmation requires N consecutive sub-threshold frames plus a minimum
//! inter-blink interval, and the confirmed latch only re-arms after the eyes
//! have stayed open for a settle delay. The settle delay is evaluated against
//! the next sample's timestamp, never a scheduled callback, which keeps the
//! machine purely reactive and testable without wall-clock waits.

use crate::config::EngineConfig;
use crate::types::{BlinkEvent, TimestampMs};
use serde::{Deserialize, Serialize};

/// Detection state, explicit so synthetic frame sequences drive it in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeState {
    /// Eyes open, nothing accumulating
    EyesOpen,
    /// Accumulating consecutive sub-threshold frames
    EyesClosing { frames_below: u32 },
    /// Episode latched; further closures ignored until the eyes have been
    /// open for the settle delay. `reopened_at` is the first open sample of
    /// the current reopening, cleared if the EAR dips again mid-settle.
    BlinkConfirmed {
        reopened_at: Option<TimestampMs>,
    },
}

/// One sample of the signal the machine consumes
#[derive(Debug, Clone, Copy)]
pub struct EarSample {
    pub timestamp_ms: TimestampMs,
    pub ear: f64,
    pub face_present: bool,
}

/// The blink state machine. Lives for the session; has no terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlinkDetector {
    ear_threshold: f64,
    consecutive_frames_required: u32,
    min_blink_interval_ms: u64,
    settle_delay_ms: u64,
    state: EyeState,
    last_blink_at: Option<TimestampMs>,
}

impl BlinkDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ear_threshold: config.ear_threshold,
            consecutive_frames_required: config.consecutive_frames_required,
            min_blink_interval_ms: config.min_blink_interval_ms,
            settle_delay_ms: config.settle_delay_ms,
            state: EyeState::EyesOpen,
            last_blink_at: None,
        }
    }

    /// Current machine state, for presentation/diagnostics
    pub fn state(&self) -> EyeState {
        self.state
    }

    pub fn last_blink_at(&self) -> Option<TimestampMs> {
        self.last_blink_at
    }

    /// Replace the EAR threshold without disturbing accumulated state
    pub fn set_ear_threshold(&mut self, threshold: f64) {
        self.ear_threshold = threshold;
    }

    /// Adopt new tunables mid-session. Machine state and the inter-blink
    /// clock survive, so reconfiguring cannot fabricate or drop an episode.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        self.ear_threshold = config.ear_threshold;
        self.consecutive_frames_required = config.consecutive_frames_required;
        self.min_blink_interval_ms = config.min_blink_interval_ms;
        self.settle_delay_ms = config.settle_delay_ms;
    }

    /// Advance the machine by one sample, emitting at most one blink event.
    ///
    /// A frame without a face is not a blink: it resets the machine to
    /// `EyesOpen` and clears the consecutive-frame counter.
    pub fn step(&mut self, sample: EarSample) -> Option<BlinkEvent> {
        if !sample.face_present {
            self.state = EyeState::EyesOpen;
            return None;
        }

        if sample.ear < self.ear_threshold {
            self.step_below_threshold(sample.timestamp_ms)
        } else {
            self.step_above_threshold(sample.timestamp_ms);
            None
        }
    }

    fn step_below_threshold(&mut self, now: TimestampMs) -> Option<BlinkEvent> {
        match self.state {
            EyeState::EyesOpen => {
                self.state = EyeState::EyesClosing { frames_below: 1 };
                self.try_confirm(1, now)
            }
            EyeState::EyesClosing { frames_below } => {
                let frames_below = frames_below + 1;
                self.state = EyeState::EyesClosing { frames_below };
                self.try_confirm(frames_below, now)
            }
            EyeState::BlinkConfirmed { .. } => {
                // Still the same episode; a dip during the settle window
                // cancels the pending re-arm.
                self.state = EyeState::BlinkConfirmed { reopened_at: None };
                None
            }
        }
    }

    /// Latch once the counter first reaches the required frame count. The
    /// event is only emitted when the inter-blink interval also holds; a
    /// too-close episode latches silently so it collapses into the previous
    /// blink instead of re-triggering on a later frame of the same dip.
    fn try_confirm(&mut self, frames_below: u32, now: TimestampMs) -> Option<BlinkEvent> {
        if frames_below < self.consecutive_frames_required {
            return None;
        }

        self.state = EyeState::BlinkConfirmed { reopened_at: None };

        let interval_ok = match self.last_blink_at {
            Some(last) => now.saturating_sub(last) >= self.min_blink_interval_ms,
            None => true,
        };
        if !interval_ok {
            return None;
        }

        self.last_blink_at = Some(now);
        Some(BlinkEvent { timestamp_ms: now })
    }

    fn step_above_threshold(&mut self, now: TimestampMs) {
        match self.state {
            EyeState::EyesOpen => {}
            EyeState::EyesClosing { .. } => {
                // Dip was shorter than the required frame count: noise.
                self.state = EyeState::EyesOpen;
            }
            EyeState::BlinkConfirmed { reopened_at } => {
                let since = reopened_at.unwrap_or(now);
                if now.saturating_sub(since) >= self.settle_delay_ms {
                    self.state = EyeState::EyesOpen;
                } else {
                    self.state = EyeState::BlinkConfirmed {
                        reopened_at: Some(since),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(consecutive: u32, min_interval: u64) -> BlinkDetector {
        let config = EngineConfig {
            ear_threshold: 0.2,
            consecutive_frames_required: consecutive,
            min_blink_interval_ms: min_interval,
            settle_delay_ms: 50,
            ..Default::default()
        };
        BlinkDetector::new(&config)
    }

    fn feed(detector: &mut BlinkDetector, ears: &[f64], start_ms: u64, spacing_ms: u64) -> Vec<BlinkEvent> {
        ears.iter()
            .enumerate()
            .filter_map(|(i, &ear)| {
                detector.step(EarSample {
                    timestamp_ms: start_ms + i as u64 * spacing_ms,
                    ear,
                    face_present: true,
                })
            })
            .collect()
    }

    #[test]
    fn test_single_blink_confirmed_on_second_subthreshold_frame() {
        // Threshold 0.2, 2 consecutive frames, 33 ms webcam spacing
        let mut detector = detector(2, 100);
        let events = feed(&mut detector, &[0.3, 0.3, 0.15, 0.12, 0.3, 0.3], 1_000, 33);

        assert_eq!(events.len(), 1);
        // 4th frame (index 3) is the second consecutive sub-threshold frame
        assert_eq!(events[0].timestamp_ms, 1_000 + 3 * 33);
    }

    #[test]
    fn test_short_dip_rejected_as_noise() {
        let mut detector = detector(2, 100);
        let events = feed(&mut detector, &[0.3, 0.15, 0.3, 0.15, 0.3], 0, 33);
        assert!(events.is_empty());
        assert_eq!(detector.state(), EyeState::EyesOpen);
    }

    #[test]
    fn test_long_dip_emits_exactly_one_event() {
        // Latching, not per-frame counting: a 10-frame closure is one blink
        let mut detector = detector(2, 100);
        let ears: Vec<f64> = std::iter::once(0.3)
            .chain(std::iter::repeat(0.1).take(10))
            .chain(std::iter::once(0.3))
            .collect();
        let events = feed(&mut detector, &ears, 0, 33);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_blinks_closer_than_min_interval_collapse() {
        let mut detector = detector(1, 400);
        // Second dip at 300 ms: past the settle delay, inside the interval
        let events = feed(&mut detector, &[0.1, 0.3, 0.3, 0.1, 0.3], 0, 100);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp_ms, 0);
    }

    #[test]
    fn test_blinks_apart_by_more_than_min_interval_both_recorded() {
        let mut detector = detector(1, 100);
        let events = feed(&mut detector, &[0.1, 0.3, 0.3, 0.3, 0.3, 0.1], 0, 100);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp_ms, 0);
        assert_eq!(events[1].timestamp_ms, 500);
    }

    #[test]
    fn test_no_face_resets_episode_without_event() {
        let mut detector = detector(3, 100);

        // Two sub-threshold frames, then the face drops out
        for (i, ear) in [0.1, 0.1].iter().enumerate() {
            assert!(detector
                .step(EarSample {
                    timestamp_ms: i as u64 * 33,
                    ear: *ear,
                    face_present: true,
                })
                .is_none());
        }
        assert!(detector
            .step(EarSample {
                timestamp_ms: 66,
                ear: 0.0,
                face_present: false,
            })
            .is_none());
        assert_eq!(detector.state(), EyeState::EyesOpen);

        // Counter restarted: two more sub-threshold frames still confirm nothing
        let events = feed(&mut detector, &[0.1, 0.1], 99, 33);
        assert!(events.is_empty());
    }

    #[test]
    fn test_noisy_open_frame_does_not_split_blink() {
        // One open frame shorter than the settle delay lands mid-closure;
        // the latch must hold and the episode stays a single blink.
        let mut detector = detector(1, 0);
        let events = feed(&mut detector, &[0.1, 0.3, 0.1, 0.1, 0.3], 0, 33);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_latch_rearms_after_settle_delay() {
        let mut detector = detector(1, 0);
        // Blink, then 100 ms of open frames (two spacings beyond the 50 ms
        // settle), then a second dip: both events recorded.
        let events = feed(&mut detector, &[0.1, 0.3, 0.3, 0.3, 0.1], 0, 50);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_events_strictly_increasing_timestamps() {
        let mut detector = detector(2, 100);
        let mut ears = Vec::new();
        for _ in 0..5 {
            ears.extend_from_slice(&[0.1, 0.1, 0.1, 0.3, 0.3, 0.3, 0.3, 0.3]);
        }
        let events = feed(&mut detector, &ears, 0, 33);
        assert!(events.len() >= 2);
        for pair in events.windows(2) {
            assert!(pair[0].timestamp_ms < pair[1].timestamp_ms);
        }
    }

    #[test]
    fn test_threshold_change_preserves_state() {
        let mut detector = detector(3, 100);
        feed(&mut detector, &[0.1, 0.1], 0, 33);
        assert_eq!(detector.state(), EyeState::EyesClosing { frames_below: 2 });

        detector.set_ear_threshold(0.25);
        assert_eq!(detector.state(), EyeState::EyesClosing { frames_below: 2 });
    }
}
