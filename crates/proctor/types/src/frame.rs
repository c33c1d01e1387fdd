//! Video frames, playback state and captured evidence frames.

use serde::{Deserialize, Serialize};

/// A raw frame handed to the face-inference capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Playback state reported by the camera's video element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoState {
    /// Rendered width in pixels; zero means no picture.
    pub width: u32,
    pub paused: bool,
    /// Playback position in milliseconds.
    pub position_ms: u64,
}

/// An encoded still image captured for the evidence sink.
///
/// Ownership passes to the sink on upload; the monitor keeps no copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFrame {
    pub image_bytes: Vec<u8>,
    /// Monitor clock time of the capture, in milliseconds since the monitor started.
    pub captured_at_ms: u64,
}

impl CapturedFrame {
    pub fn new(image_bytes: Vec<u8>, captured_at_ms: u64) -> Self {
        Self {
            image_bytes,
            captured_at_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.image_bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_bytes.is_empty()
    }
}
