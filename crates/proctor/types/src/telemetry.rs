//! Telemetry events emitted to the external sink.
//!
//! Events are write-once and fire-and-forget. The client never stamps a
//! time on them; the sink assigns the timestamp on receipt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::AttemptId;

/// Category of a telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryEventType {
    /// Monitor moved between states.
    StateTransition,
    /// Camera, fullscreen or model setup failed.
    SetupFailed,
    /// A budgeted violation occurred.
    ViolationRecorded,
    GraceStarted,
    GraceTick,
    GraceCleared,
    GraceExpired,
    /// A lower-precedence anomaly seen while a higher one gates the session.
    AnomalyObserved,
    HeadPoseAnomaly,
    AudioAnomaly,
    WebcamTamper,
    ClipboardBlocked,
    MultipleMonitorsDetected,
    InferenceFailed,
    PhotoCaptured,
    PhotoCaptureFailed,
    PhotoUploadFailed,
    /// Force-submit trigger invoked.
    ForceSubmit,
    CriticalError,
    SessionCompleted,
}

impl TelemetryEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryEventType::StateTransition => "state_transition",
            TelemetryEventType::SetupFailed => "setup_failed",
            TelemetryEventType::ViolationRecorded => "violation_recorded",
            TelemetryEventType::GraceStarted => "grace_started",
            TelemetryEventType::GraceTick => "grace_tick",
            TelemetryEventType::GraceCleared => "grace_cleared",
            TelemetryEventType::GraceExpired => "grace_expired",
            TelemetryEventType::AnomalyObserved => "anomaly_observed",
            TelemetryEventType::HeadPoseAnomaly => "head_pose_anomaly",
            TelemetryEventType::AudioAnomaly => "audio_anomaly",
            TelemetryEventType::WebcamTamper => "webcam_tamper",
            TelemetryEventType::ClipboardBlocked => "clipboard_blocked",
            TelemetryEventType::MultipleMonitorsDetected => "multiple_monitors_detected",
            TelemetryEventType::InferenceFailed => "inference_failed",
            TelemetryEventType::PhotoCaptured => "photo_captured",
            TelemetryEventType::PhotoCaptureFailed => "photo_capture_failed",
            TelemetryEventType::PhotoUploadFailed => "photo_upload_failed",
            TelemetryEventType::ForceSubmit => "force_submit",
            TelemetryEventType::CriticalError => "critical_error",
            TelemetryEventType::SessionCompleted => "session_completed",
        }
    }
}

impl std::fmt::Display for TelemetryEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub attempt_id: AttemptId,
    pub event_type: TelemetryEventType,
    pub payload: Value,
}

impl TelemetryEvent {
    pub fn new(attempt_id: AttemptId, event_type: TelemetryEventType, payload: Value) -> Self {
        Self {
            attempt_id,
            event_type,
            payload,
        }
    }
}
