//! Headless capability providers.
//!
//! Scriptable stand-ins for the browser primitives, used by the replay tool
//! and by tests. Every provider is shared behind an `Arc` and mutated through
//! interior mutability so a script can change the environment while the
//! monitor holds the same provider.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use proctor_types::{
    BoundingBox, FaceDetection, FaceLandmarks, Point, VideoFrame, VideoState,
};

use crate::capabilities::{
    Capabilities, FaceInference, ForceSubmit, ForceSubmitRequest, FullscreenControl, MediaDevice,
};
use crate::error::CapabilityError;

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;
const FRAME_STEP_MS: u64 = 33;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Camera whose playback advances on every read unless frozen.
#[derive(Debug)]
pub struct HeadlessCamera {
    acquire_error: Mutex<Option<CapabilityError>>,
    position_ms: AtomicU64,
    frozen: AtomicBool,
    paused: AtomicBool,
    blank: AtomicBool,
    fail_snapshots: AtomicBool,
    audio_level: Mutex<f64>,
    released: AtomicBool,
}

impl HeadlessCamera {
    pub fn new() -> Self {
        Self {
            acquire_error: Mutex::new(None),
            position_ms: AtomicU64::new(0),
            frozen: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            blank: AtomicBool::new(false),
            fail_snapshots: AtomicBool::new(false),
            audio_level: Mutex::new(0.0),
            released: AtomicBool::new(false),
        }
    }

    /// Make the next `acquire` fail.
    pub fn deny(&self, error: CapabilityError) {
        *lock(&self.acquire_error) = Some(error);
    }

    /// Stop (or resume) playback advancing while still reporting "playing".
    pub fn freeze(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::SeqCst);
    }

    pub fn pause(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Report a zero-width picture.
    pub fn blank(&self, blank: bool) {
        self.blank.store(blank, Ordering::SeqCst);
    }

    pub fn fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    pub fn set_audio_level(&self, level: f64) {
        *lock(&self.audio_level) = level;
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Bytes returned by every successful snapshot.
    pub fn encoded_frame(&self) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(&FRAME_WIDTH.to_be_bytes());
        bytes.extend_from_slice(&FRAME_HEIGHT.to_be_bytes());
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        bytes
    }
}

impl Default for HeadlessCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevice for HeadlessCamera {
    async fn acquire(&self) -> Result<(), CapabilityError> {
        match lock(&self.acquire_error).clone() {
            Some(error) => Err(error),
            None => {
                self.released.store(false, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn video_state(&self) -> VideoState {
        let paused = self.paused.load(Ordering::SeqCst);
        let position_ms = if paused || self.frozen.load(Ordering::SeqCst) {
            self.position_ms.load(Ordering::SeqCst)
        } else {
            self.position_ms.fetch_add(FRAME_STEP_MS, Ordering::SeqCst) + FRAME_STEP_MS
        };
        VideoState {
            width: if self.blank.load(Ordering::SeqCst) {
                0
            } else {
                FRAME_WIDTH
            },
            paused,
            position_ms,
        }
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if self.released.load(Ordering::SeqCst) || self.blank.load(Ordering::SeqCst) {
            return None;
        }
        Some(VideoFrame::new(FRAME_WIDTH, FRAME_HEIGHT, Vec::new()))
    }

    fn snapshot(&self) -> Result<Vec<u8>, CapabilityError> {
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(CapabilityError::FrameUnavailable(
                "canvas encode failed".into(),
            ));
        }
        Ok(self.encoded_frame())
    }

    fn audio_level(&self) -> Option<f64> {
        if self.released.load(Ordering::SeqCst) {
            return None;
        }
        Some(*lock(&self.audio_level))
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Fullscreen control that grants or denies on request.
#[derive(Debug, Default)]
pub struct HeadlessFullscreen {
    deny: Mutex<Option<CapabilityError>>,
    engaged: AtomicBool,
    exits: AtomicUsize,
}

impl HeadlessFullscreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(&self, error: CapabilityError) {
        *lock(&self.deny) = Some(error);
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }

    /// Number of `exit` calls made by the monitor.
    pub fn exit_calls(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FullscreenControl for HeadlessFullscreen {
    async fn request(&self) -> Result<(), CapabilityError> {
        match lock(&self.deny).clone() {
            Some(error) => Err(error),
            None => {
                self.engaged.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn exit(&self) {
        self.engaged.store(false, Ordering::SeqCst);
        self.exits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Face model returning whatever detections the script sets.
#[derive(Debug)]
pub struct HeadlessInference {
    load_error: Mutex<Option<CapabilityError>>,
    detections: Mutex<Vec<FaceDetection>>,
    fail_next: AtomicBool,
    failing: AtomicBool,
}

impl HeadlessInference {
    /// Starts with one centered face.
    pub fn new() -> Self {
        Self {
            load_error: Mutex::new(None),
            detections: Mutex::new(faces(1)),
            fail_next: AtomicBool::new(false),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_load(&self, error: CapabilityError) {
        *lock(&self.load_error) = Some(error);
    }

    /// Report `count` centered faces on every frame.
    pub fn set_face_count(&self, count: usize) {
        *lock(&self.detections) = faces(count);
    }

    pub fn set_detections(&self, detections: Vec<FaceDetection>) {
        *lock(&self.detections) = detections;
    }

    /// Fail the next `estimate` call once.
    pub fn fail_next_estimate(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Fail every `estimate` call until switched off.
    pub fn fail_estimates(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for HeadlessInference {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceInference for HeadlessInference {
    async fn load(&self) -> Result<(), CapabilityError> {
        match lock(&self.load_error).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn estimate(&self, _frame: &VideoFrame) -> Result<Vec<FaceDetection>, CapabilityError> {
        if self.fail_next.swap(false, Ordering::SeqCst) || self.failing.load(Ordering::SeqCst) {
            return Err(CapabilityError::InferenceFailed("backend lost".into()));
        }
        Ok(lock(&self.detections).clone())
    }
}

/// `count` faces laid side by side, each looking straight ahead.
pub fn faces(count: usize) -> Vec<FaceDetection> {
    (0..count)
        .map(|i| {
            let bounding_box = BoundingBox::new(100.0 + 220.0 * i as f64, 120.0, 200.0, 220.0);
            let center = bounding_box.center();
            FaceDetection::new(bounding_box).with_landmarks(FaceLandmarks {
                nose_tip: Point::new(center.x, center.y),
                left_eye: None,
                right_eye: None,
            })
        })
        .collect()
}

/// Force-submit trigger that records every invocation.
#[derive(Debug, Default)]
pub struct RecordingForceSubmit {
    requests: Mutex<Vec<ForceSubmitRequest>>,
}

impl RecordingForceSubmit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<ForceSubmitRequest> {
        lock(&self.requests).clone()
    }
}

impl ForceSubmit for RecordingForceSubmit {
    fn force_submit(&self, request: &ForceSubmitRequest) {
        lock(&self.requests).push(request.clone());
    }
}

/// One of each headless provider, kept by concrete type for scripting.
#[derive(Debug, Clone)]
pub struct HeadlessProviders {
    pub camera: Arc<HeadlessCamera>,
    pub fullscreen: Arc<HeadlessFullscreen>,
    pub inference: Arc<HeadlessInference>,
    pub force_submit: Arc<RecordingForceSubmit>,
}

impl HeadlessProviders {
    pub fn new() -> Self {
        Self {
            camera: Arc::new(HeadlessCamera::new()),
            fullscreen: Arc::new(HeadlessFullscreen::new()),
            inference: Arc::new(HeadlessInference::new()),
            force_submit: Arc::new(RecordingForceSubmit::new()),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::new(
            self.camera.clone(),
            self.fullscreen.clone(),
            self.inference.clone(),
            self.force_submit.clone(),
        )
    }
}

impl Default for HeadlessProviders {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn denied_camera_fails_acquire() {
        let camera = HeadlessCamera::new();
        camera.deny(CapabilityError::CameraDenied("NotAllowedError".into()));
        let err = camera.acquire().await.unwrap_err();
        assert!(err.to_string().contains("Camera access denied"));
    }

    #[test]
    fn frozen_camera_stops_advancing() {
        let camera = HeadlessCamera::new();
        let a = camera.video_state().position_ms;
        let b = camera.video_state().position_ms;
        assert!(b > a);
        camera.freeze(true);
        let c = camera.video_state().position_ms;
        assert_eq!(camera.video_state().position_ms, c);
    }

    #[test]
    fn face_script_changes_estimates() {
        let inference = HeadlessInference::new();
        let frame = VideoFrame::new(640, 480, Vec::new());
        assert_eq!(inference.estimate(&frame).unwrap().len(), 1);
        inference.set_face_count(0);
        assert!(inference.estimate(&frame).unwrap().is_empty());
        inference.fail_next_estimate();
        assert!(inference.estimate(&frame).is_err());
        assert!(inference.estimate(&frame).is_ok());
    }
}
