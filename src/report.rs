//! Session report encoding
//!
//! This module encodes a session's aggregate state into a self-describing
//! JSON payload for export: producer metadata, provenance timestamps, totals,
//! the trailing rate, and the bucketed history. Hosts attach this to session
//! teardown or batch runs; the live presentation path consumes `FrameUpdate`s
//! directly instead.

use crate::error::EngineError;
use crate::session::BlinkSession;
use crate::types::{RateBucket, TimestampMs};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Producer metadata embedded in every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Aggregate session statistics at report time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTotals {
    pub total_blinks: u64,
    pub rate_per_minute: u32,
    pub last_blink_at_ms: Option<TimestampMs>,
    pub alerts_raised: u64,
    pub alert_asserted: bool,
}

/// Complete session report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: ReportProducer,
    /// Session clock instant the report describes
    pub as_of_ms: TimestampMs,
    /// Wall-clock encode time (RFC 3339)
    pub computed_at_utc: String,
    pub totals: SessionTotals,
    pub history: Vec<RateBucket>,
}

/// Report encoder holding a stable per-process instance id
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode the session's aggregate state as of `now` on its frame clock
    pub fn encode(&self, session: &BlinkSession, now: TimestampMs) -> SessionReport {
        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            as_of_ms: now,
            computed_at_utc: Utc::now().to_rfc3339(),
            totals: SessionTotals {
                total_blinks: session.total_blinks(),
                rate_per_minute: session.current_rate(now),
                last_blink_at_ms: session.last_blink_at(),
                alerts_raised: session.alerts_raised(),
                alert_asserted: session.active_alert().is_some(),
            },
            history: session.history_buckets(now),
        }
    }

    /// Encode to a pretty JSON string
    pub fn encode_to_json(
        &self,
        session: &BlinkSession,
        now: TimestampMs,
    ) -> Result<String, EngineError> {
        serde_json::to_string_pretty(&self.encode(session, now)).map_err(EngineError::JsonError)
    }
}
