//! Blink rate and history aggregation
//!
//! Owns the session's blink record: a capped, time-ordered deque for windowed
//! queries plus a monotonic lifetime counter, so the display window can be
//! pruned without losing the exact session total. Rates and history buckets
//! are recomputed from raw timestamps on every call — there is no incremental
//! bucket state, so results stay consistent across pauses.

use crate::config::{HISTORY_BUCKET_MS, HISTORY_WINDOW_MS, RATE_WINDOW_MS};
use crate::types::{RateBucket, TimestampMs};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Session blink statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlinkStats {
    /// Timestamps inside the retention window, insertion order = time order
    recent: VecDeque<TimestampMs>,
    /// Exact lifetime total, never pruned
    total: u64,
}

impl BlinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed blink. Entries older than the maximum display
    /// window are dropped; the lifetime total is kept exact.
    pub fn record_blink(&mut self, timestamp_ms: TimestampMs) {
        self.recent.push_back(timestamp_ms);
        self.total += 1;

        let cutoff = timestamp_ms.saturating_sub(HISTORY_WINDOW_MS);
        while let Some(&front) = self.recent.front() {
            if front < cutoff {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }

    /// Lifetime session total
    pub fn total_blinks(&self) -> u64 {
        self.total
    }

    /// Blinks in the trailing minute: count of timestamps in
    /// `(now - 60_000, now]`.
    pub fn current_rate(&self, now: TimestampMs) -> u32 {
        let floor = now.saturating_sub(RATE_WINDOW_MS);
        self.recent
            .iter()
            .filter(|&&t| t > floor && t <= now)
            .count() as u32
    }

    /// Timestamps currently retained, oldest first
    pub fn recent_timestamps(&self) -> impl Iterator<Item = TimestampMs> + '_ {
        self.recent.iter().copied()
    }

    /// Bucketed view of the trailing history window with default sizing
    /// (10 minutes of 30-second buckets).
    pub fn history_buckets(&self, now: TimestampMs) -> Vec<RateBucket> {
        self.history_buckets_sized(now, HISTORY_WINDOW_MS, HISTORY_BUCKET_MS)
    }

    /// Partition the trailing `window_ms` into `window_ms / bucket_ms` fixed
    /// buckets, oldest first, each count scaled to a per-minute rate.
    pub fn history_buckets_sized(
        &self,
        now: TimestampMs,
        window_ms: u64,
        bucket_ms: u64,
    ) -> Vec<RateBucket> {
        if bucket_ms == 0 || window_ms < bucket_ms {
            return Vec::new();
        }

        let num_buckets = window_ms / bucket_ms;
        let per_minute_scale = 60_000.0 / bucket_ms as f64;
        let mut buckets = Vec::with_capacity(num_buckets as usize);

        for i in (0..num_buckets).rev() {
            let end = now.saturating_sub(i * bucket_ms);
            let start = end.saturating_sub(bucket_ms);
            let count = self
                .recent
                .iter()
                .filter(|&&t| t >= start && t < end)
                .count();

            buckets.push(RateBucket {
                label: bucket_label(now.saturating_sub(end)),
                blinks_per_minute: count as f64 * per_minute_scale,
            });
        }

        buckets
    }
}

/// Offset label for a bucket ending `age_ms` before now
fn bucket_label(age_ms: u64) -> String {
    let minutes_ago = age_ms / 60_000;
    let seconds_ago = (age_ms % 60_000) / 1_000;

    match (minutes_ago, seconds_ago) {
        (0, 0) => "Now".to_string(),
        (0, s) => format!("-{s}s"),
        (m, 0) => format!("-{m}m"),
        (m, s) => format!("-{m}m{s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_total_survives_pruning() {
        let mut stats = BlinkStats::new();
        // Blinks spread over 20 minutes: well past the retention window
        for i in 0..40u64 {
            stats.record_blink(i * 30_000);
        }

        assert_eq!(stats.total_blinks(), 40);
        assert!(stats.recent_timestamps().count() < 40);
    }

    #[test]
    fn test_current_rate_window_bounds() {
        let mut stats = BlinkStats::new();
        let now = 200_000;
        stats.record_blink(now - 60_000); // exactly at the floor: excluded
        stats.record_blink(now - 59_999); // just inside
        stats.record_blink(now - 1);
        stats.record_blink(now); // inclusive upper bound

        assert_eq!(stats.current_rate(now), 3);
    }

    #[test]
    fn test_rate_rises_and_falls_with_the_window() {
        let mut stats = BlinkStats::new();
        for i in 0..5u64 {
            stats.record_blink(100_000 + i * 1_000);
        }

        // All five inside the window
        assert_eq!(stats.current_rate(105_000), 5);
        // Window slid past the first two
        assert_eq!(stats.current_rate(161_500), 3);
        // Window slid past everything
        assert_eq!(stats.current_rate(300_000), 0);
    }

    #[test]
    fn test_rate_with_small_now_does_not_underflow() {
        let mut stats = BlinkStats::new();
        stats.record_blink(10);
        assert_eq!(stats.current_rate(20), 1);
    }

    #[test]
    fn test_history_bucket_count_and_labels() {
        let stats = BlinkStats::new();
        let buckets = stats.history_buckets(600_000);

        assert_eq!(buckets.len(), 20);
        assert_eq!(buckets[0].label, "-9m30s");
        assert_eq!(buckets[18].label, "-30s");
        assert_eq!(buckets[19].label, "Now");
    }

    #[test]
    fn test_history_counts_normalized_per_minute() {
        let mut stats = BlinkStats::new();
        let now = 600_000;
        // Three blinks in the newest bucket [now-30s, now)
        stats.record_blink(now - 25_000);
        stats.record_blink(now - 15_000);
        stats.record_blink(now - 5_000);
        // One blink two buckets earlier
        stats.record_blink(now - 70_000);

        let buckets = stats.history_buckets(now);
        // 30-second buckets scale counts by 2
        assert_eq!(buckets[19].blinks_per_minute, 6.0);
        assert_eq!(buckets[17].blinks_per_minute, 2.0);
        assert_eq!(buckets[18].blinks_per_minute, 0.0);
    }

    #[test]
    fn test_history_consistent_after_gap() {
        // No incremental bucket state: a long pause just shifts the window
        let mut stats = BlinkStats::new();
        stats.record_blink(30_000);

        let buckets = stats.history_buckets(630_000);
        let total: f64 = buckets.iter().map(|b| b.blinks_per_minute).sum();
        assert_eq!(total, 0.0);

        let buckets = stats.history_buckets(50_000);
        let total: f64 = buckets.iter().map(|b| b.blinks_per_minute).sum();
        assert_eq!(total, 2.0);
    }

    #[test]
    fn test_custom_bucket_sizing() {
        let mut stats = BlinkStats::new();
        stats.record_blink(95_000);

        let buckets = stats.history_buckets_sized(100_000, 60_000, 10_000);
        assert_eq!(buckets.len(), 6);
        // 10-second buckets scale counts by 6
        assert_eq!(buckets[5].blinks_per_minute, 6.0);

        assert!(stats.history_buckets_sized(100_000, 5_000, 10_000).is_empty());
        assert!(stats.history_buckets_sized(100_000, 60_000, 0).is_empty());
    }
}
