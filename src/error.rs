//! Error types for Blinksense

use thiserror::Error;

/// Errors that can occur during detection and configuration
#[derive(Debug, Error)]
pub enum EngineError {
    /// Horizontal eye extent too small for a reliable EAR reading.
    /// Recovered locally: the frame is skipped, accumulated state is kept.
    #[error("degenerate eye geometry: horizontal distance {0} below epsilon")]
    DegenerateGeometry(f64),

    #[error("landmark index {index} out of range ({available} landmarks available)")]
    MissingLandmarks { index: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The landmark inference collaborator cannot deliver frames.
    /// Fatal to detection but not to the host process.
    #[error("inference unavailable: {0}")]
    InferenceUnavailable(String),
}
