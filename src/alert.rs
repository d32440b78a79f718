//! Low-blink-rate alert policy
//!
//! A stateful cooldown gate evaluated once per confirmed blink, never per
//! frame. The raised alert stays asserted until the presentation layer
//! acknowledges it; acknowledgement does not touch the cooldown clock, so a
//! dismissed alert cannot immediately re-fire.

use crate::types::{FatigueAlert, TimestampMs};
use serde::{Deserialize, Serialize};

/// Message template surfaced with a raised alert
pub fn alert_message(rate_per_minute: u32) -> String {
    format!(
        "Low blink rate detected ({rate_per_minute} blinks/min). \
         Take a break and blink more frequently to avoid eye strain!"
    )
}

/// The alert gate. One instance per session, owned by the processing path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPolicy {
    low_rate_threshold: u32,
    cooldown_ms: u64,
    last_alert_at: Option<TimestampMs>,
    active: Option<FatigueAlert>,
    raised_count: u64,
}

impl AlertPolicy {
    pub fn new(low_rate_threshold: u32, cooldown_ms: u64) -> Self {
        Self {
            low_rate_threshold,
            cooldown_ms,
            last_alert_at: None,
            active: None,
            raised_count: 0,
        }
    }

    /// Decide whether to raise the low-rate alert.
    ///
    /// Raises only when all three hold:
    /// - `total_blinks` has reached the threshold (suppresses spurious alerts
    ///   at session start before enough data exists);
    /// - the recent rate is non-zero but below the threshold (a rate of zero
    ///   usually means no face or a pause, not fatigue);
    /// - the cooldown has elapsed since the previous raise.
    pub fn evaluate(
        &mut self,
        total_blinks: u64,
        recent_rate: u32,
        now: TimestampMs,
    ) -> Option<&FatigueAlert> {
        if total_blinks < self.low_rate_threshold as u64 {
            return None;
        }
        if recent_rate == 0 || recent_rate >= self.low_rate_threshold {
            return None;
        }
        if let Some(last) = self.last_alert_at {
            if now.saturating_sub(last) <= self.cooldown_ms {
                return None;
            }
        }

        self.last_alert_at = Some(now);
        self.raised_count += 1;
        self.active = Some(FatigueAlert {
            raised_at_ms: now,
            rate_per_minute: recent_rate,
            message: alert_message(recent_rate),
        });
        self.active.as_ref()
    }

    /// The currently asserted alert, if the caller has not dismissed it
    pub fn active_alert(&self) -> Option<&FatigueAlert> {
        self.active.as_ref()
    }

    /// Lifetime count of raised alerts, acknowledged or not
    pub fn raised_count(&self) -> u64 {
        self.raised_count
    }

    /// Dismiss the asserted alert. The cooldown clock is unaffected.
    pub fn acknowledge(&mut self) {
        self.active = None;
    }

    /// Replace the rate threshold; cooldown and assertion state are kept
    pub fn set_threshold(&mut self, low_rate_threshold: u32) {
        self.low_rate_threshold = low_rate_threshold;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppressed_before_enough_session_data() {
        let mut policy = AlertPolicy::new(10, 60_000);
        assert!(policy.evaluate(9, 4, 100_000).is_none());
        assert!(policy.evaluate(10, 4, 100_000).is_some());
    }

    #[test]
    fn test_zero_rate_never_alerts() {
        let mut policy = AlertPolicy::new(10, 60_000);
        assert!(policy.evaluate(50, 0, 100_000).is_none());
        assert!(policy.active_alert().is_none());
    }

    #[test]
    fn test_healthy_rate_never_alerts() {
        let mut policy = AlertPolicy::new(10, 60_000);
        assert!(policy.evaluate(50, 10, 100_000).is_none());
        assert!(policy.evaluate(50, 15, 100_000).is_none());
    }

    #[test]
    fn test_cooldown_blocks_refire() {
        // 12 total blinks, only 4 of them in the last minute
        let mut policy = AlertPolicy::new(10, 60_000);

        let alert = policy.evaluate(12, 4, 100_000);
        assert!(alert.is_some());
        assert_eq!(alert.unwrap().rate_per_minute, 4);

        // 13th blink five seconds later: still cooling down
        assert!(policy.evaluate(13, 4, 105_000).is_none());

        // Past the cooldown, it may fire again
        assert!(policy.evaluate(20, 4, 160_001).is_some());
    }

    #[test]
    fn test_alert_asserted_until_acknowledged() {
        let mut policy = AlertPolicy::new(10, 60_000);
        policy.evaluate(12, 4, 100_000);
        assert!(policy.active_alert().is_some());

        // Acknowledgement clears the assertion but not the cooldown
        policy.acknowledge();
        assert!(policy.active_alert().is_none());
        assert!(policy.evaluate(13, 4, 110_000).is_none());
    }

    #[test]
    fn test_message_template() {
        let mut policy = AlertPolicy::new(10, 60_000);
        let alert = policy.evaluate(12, 4, 100_000).unwrap();
        assert_eq!(
            alert.message,
            "Low blink rate detected (4 blinks/min). \
             Take a break and blink more frequently to avoid eye strain!"
        );
    }

    #[test]
    fn test_threshold_reconfiguration() {
        let mut policy = AlertPolicy::new(10, 60_000);
        assert!(policy.evaluate(12, 11, 100_000).is_none());

        policy.set_threshold(15);
        assert!(policy.evaluate(15, 11, 100_000).is_some());
    }
}
