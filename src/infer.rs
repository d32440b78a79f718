//! Inference seam
//!
//! The face-mesh inference collaborator is an injected capability, not a
//! concrete dependency: anything that can yield `FrameSample`s in arrival
//! order drives a session. Tests substitute synthetic landmark sequences;
//! hosts wrap their camera/NN callback pipeline.

use crate::error::EngineError;
use crate::session::BlinkSession;
use crate::types::{FrameSample, FrameUpdate};

/// A source of per-frame landmark samples, delivered in arrival order.
///
/// `Ok(None)` signals a clean end of stream. An `InferenceUnavailable` error
/// is fatal to the session's detection capability but not to the host: the
/// session object stays intact so the host can retry with a new source.
pub trait LandmarkSource {
    fn next_sample(&mut self) -> Result<Option<FrameSample>, EngineError>;
}

/// In-memory source over a prepared frame sequence
pub struct VecSource {
    frames: std::vec::IntoIter<FrameSample>,
}

impl VecSource {
    pub fn new(frames: Vec<FrameSample>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl LandmarkSource for VecSource {
    fn next_sample(&mut self) -> Result<Option<FrameSample>, EngineError> {
        Ok(self.frames.next())
    }
}

/// Pump every sample from `source` through `session`, forwarding each
/// `FrameUpdate` to `sink`. Returns the number of frames processed.
///
/// Source failure is surfaced upward without tearing the session down.
pub fn drive<S, F>(
    session: &mut BlinkSession,
    source: &mut S,
    mut sink: F,
) -> Result<u64, EngineError>
where
    S: LandmarkSource,
    F: FnMut(&FrameUpdate),
{
    let mut processed = 0;
    while let Some(frame) = source.next_sample()? {
        let update = session.process_frame(&frame);
        sink(&update);
        processed += 1;
    }
    Ok(processed)
}
