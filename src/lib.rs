//! Blinksense - On-device blink detection and eye-fatigue alert engine
//!
//! Blinksense turns a noisy stream of per-frame facial-landmark samples into
//! stable discrete blink events, a trailing blink rate, and rate-limited
//! fatigue alerts through a deterministic per-frame pipeline:
//! geometry (EAR) → blink state machine → rate/history aggregation → alert
//! policy. Camera capture and the face-mesh inference itself live outside the
//! crate; hosts push `FrameSample`s in and read `FrameUpdate`s out.
//!
//! ## Modules
//!
//! - **geometry**: Eye Aspect Ratio from eye landmark subsets
//! - **viewport**: padded face bounding box and zoom/translate transform
//! - **detector**: debounced blink state machine
//! - **stats**: trailing blink rate and bucketed history
//! - **alert**: low-rate alert policy with cooldown
//! - **session**: per-session orchestration and presentation controls

pub mod alert;
pub mod config;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod infer;
pub mod report;
pub mod session;
pub mod stats;
pub mod types;
pub mod viewport;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{EngineConfig, LandmarkTopology};
pub use detector::{BlinkDetector, EyeState};
pub use error::EngineError;
pub use infer::{drive, LandmarkSource, VecSource};
pub use report::{ReportEncoder, SessionReport};
pub use session::{process_frames, BlinkSession};
pub use types::{BlinkEvent, FrameSample, FrameUpdate, LandmarkPoint};

/// Engine version embedded in all report payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "blinksense";
