//! Periodic photo capture and evidence upload.
//!
//! Capture runs on its own wall-clock interval from camera readiness until
//! the session ends, independent of grace periods. Each frame is handed to an
//! upload channel and forgotten; a forwarder task delivers it to the
//! [`EvidenceSink`]. Upload failures become telemetry and nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use proctor_types::{CapturedFrame, SessionIds, TelemetryEventType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::capabilities::MediaDevice;
use crate::scheduler::{Scheduler, TimerHandle, TimerTask};
use crate::telemetry::TelemetryEmitter;

/// Sink acknowledgement for one uploaded frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub success: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadReceipt {
    pub fn stored(path: impl Into<String>) -> Self {
        Self {
            success: true,
            path: Some(path.into()),
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            path: None,
            message: Some(message.into()),
        }
    }
}

/// External evidence store.
///
/// Implementations must check that the uploading identity owns the attempt.
#[async_trait]
pub trait EvidenceSink: Send + Sync {
    async fn upload_frame(&self, ids: &SessionIds, image_bytes: &[u8]) -> UploadReceipt;
}

/// A frame queued for upload.
#[derive(Debug, Clone)]
pub struct FrameUpload {
    pub ids: SessionIds,
    pub frame: CapturedFrame,
}

pub type UploadReceiver = mpsc::UnboundedReceiver<FrameUpload>;

/// Create the upload channel.
pub fn upload_channel() -> (mpsc::UnboundedSender<FrameUpload>, UploadReceiver) {
    mpsc::unbounded_channel()
}

/// Result of one capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Queued { bytes: usize },
    CaptureFailed,
    QueueClosed,
}

/// Interval-driven frame capture.
#[derive(Debug)]
pub struct PhotoCaptureScheduler {
    interval_ms: u64,
    timer: Option<TimerHandle>,
    uploads: mpsc::UnboundedSender<FrameUpload>,
    attempts: u64,
}

impl PhotoCaptureScheduler {
    pub fn new(interval_secs: u64, uploads: mpsc::UnboundedSender<FrameUpload>) -> Self {
        Self {
            interval_ms: interval_secs.saturating_mul(1_000),
            timer: None,
            uploads,
            attempts: 0,
        }
    }

    /// Arm the interval. Returns false if it was already running.
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) -> bool {
        if self.timer.is_some() {
            return false;
        }
        self.timer = Some(scheduler.schedule(self.interval_ms, TimerTask::PhotoCapture));
        true
    }

    /// Handle the interval timer; re-arms it. Returns false for stale handles.
    pub fn on_timer(&mut self, handle: TimerHandle, scheduler: &mut dyn Scheduler) -> bool {
        if self.timer != Some(handle) {
            return false;
        }
        self.timer = Some(scheduler.schedule(self.interval_ms, TimerTask::PhotoCapture));
        true
    }

    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(timer) = self.timer.take() {
            scheduler.cancel(timer);
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Capture one frame and queue it for upload.
    pub fn capture(
        &mut self,
        ids: &SessionIds,
        media: &dyn MediaDevice,
        now_ms: u64,
        telemetry: &TelemetryEmitter,
    ) -> CaptureOutcome {
        self.attempts += 1;

        let image_bytes = match media.snapshot() {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                telemetry.emit(
                    TelemetryEventType::PhotoCaptureFailed,
                    json!({ "error": "empty frame", "at_ms": now_ms }),
                );
                return CaptureOutcome::CaptureFailed;
            }
            Err(e) => {
                warn!(attempt_id = %ids.attempt_id, error = %e, "Photo capture failed");
                telemetry.emit(
                    TelemetryEventType::PhotoCaptureFailed,
                    json!({ "error": e.to_string(), "at_ms": now_ms }),
                );
                return CaptureOutcome::CaptureFailed;
            }
        };

        let bytes = image_bytes.len();
        let upload = FrameUpload {
            ids: ids.clone(),
            frame: CapturedFrame::new(image_bytes, now_ms),
        };
        if self.uploads.send(upload).is_err() {
            warn!(attempt_id = %ids.attempt_id, "Upload queue closed; frame dropped");
            telemetry.emit(
                TelemetryEventType::PhotoUploadFailed,
                json!({ "error": "upload queue closed", "at_ms": now_ms }),
            );
            return CaptureOutcome::QueueClosed;
        }

        debug!(attempt_id = %ids.attempt_id, bytes = bytes, "Photo queued for upload");
        telemetry.emit(
            TelemetryEventType::PhotoCaptured,
            json!({ "bytes": bytes, "at_ms": now_ms }),
        );
        CaptureOutcome::Queued { bytes }
    }

    /// Number of capture attempts so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

/// Drain `rx` into `sink`, reporting failures as telemetry. No retries.
pub fn spawn_upload_forwarder(
    mut rx: UploadReceiver,
    sink: Arc<dyn EvidenceSink>,
    telemetry: TelemetryEmitter,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut stored = 0u64;
        while let Some(upload) = rx.recv().await {
            let receipt = sink
                .upload_frame(&upload.ids, &upload.frame.image_bytes)
                .await;
            if receipt.success {
                stored += 1;
                debug!(
                    attempt_id = %upload.ids.attempt_id,
                    path = receipt.path.as_deref().unwrap_or(""),
                    "Photo uploaded"
                );
            } else {
                let message = receipt.message.unwrap_or_else(|| "upload rejected".into());
                warn!(attempt_id = %upload.ids.attempt_id, error = %message, "Photo upload failed");
                telemetry.emit(
                    TelemetryEventType::PhotoUploadFailed,
                    json!({ "error": message, "captured_at_ms": upload.frame.captured_at_ms }),
                );
            }
        }
        stored
    })
}
