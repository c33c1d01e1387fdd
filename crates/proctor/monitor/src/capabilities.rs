//! Platform capability interfaces.
//!
//! The monitor depends only on these traits. A browser build wires them to
//! `getUserMedia`, the Fullscreen API and a face-detection model; tests and the
//! replay tool use the providers in [`crate::headless`].
//!
//! Acquisition calls are async (they wait on permission prompts) and are made
//! by the runtime driver. The per-tick reads the state machine performs are
//! synchronous.

use std::sync::Arc;

use async_trait::async_trait;
use proctor_types::{FaceDetection, SessionIds, VideoFrame, VideoState};
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// Camera and microphone stream.
#[async_trait]
pub trait MediaDevice: Send + Sync {
    /// Request camera and microphone and start the stream.
    async fn acquire(&self) -> Result<(), CapabilityError>;

    /// Playback state of the video element.
    fn video_state(&self) -> VideoState;

    /// Current raw frame for inference.
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Draw the current frame off-screen and encode it as an image.
    fn snapshot(&self) -> Result<Vec<u8>, CapabilityError>;

    /// Normalized microphone level (0.0-1.0), if audio is flowing.
    fn audio_level(&self) -> Option<f64>;

    /// Stop every track. Must be safe to call more than once.
    fn release(&self);
}

/// Fullscreen lock.
#[async_trait]
pub trait FullscreenControl: Send + Sync {
    async fn request(&self) -> Result<(), CapabilityError>;

    /// Leave fullscreen. Must be safe to call when not in fullscreen.
    fn exit(&self);
}

/// Opaque face-detection model.
#[async_trait]
pub trait FaceInference: Send + Sync {
    async fn load(&self) -> Result<(), CapabilityError>;

    fn estimate(&self, frame: &VideoFrame) -> Result<Vec<FaceDetection>, CapabilityError>;
}

/// Request passed to the force-submit trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceSubmitRequest {
    pub ids: SessionIds,
    pub reason: String,
}

/// Commits whatever answers exist and ends the attempt.
///
/// Must be idempotent and safe to call after the surrounding UI is gone.
pub trait ForceSubmit: Send + Sync {
    fn force_submit(&self, request: &ForceSubmitRequest);
}

/// The provider set one monitor instance is wired to.
#[derive(Clone)]
pub struct Capabilities {
    pub media: Arc<dyn MediaDevice>,
    pub fullscreen: Arc<dyn FullscreenControl>,
    pub inference: Arc<dyn FaceInference>,
    pub force_submit: Arc<dyn ForceSubmit>,
}

impl Capabilities {
    pub fn new(
        media: Arc<dyn MediaDevice>,
        fullscreen: Arc<dyn FullscreenControl>,
        inference: Arc<dyn FaceInference>,
        force_submit: Arc<dyn ForceSubmit>,
    ) -> Self {
        Self {
            media,
            fullscreen,
            inference,
            force_submit,
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
