//! Error types for proctor-monitor crate.
//!
//! Defines capability failures (the setup-fatal taxonomy) and monitor errors.

use proctor_types::MonitorState;
use thiserror::Error;

/// Failures reported by platform capability providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// Candidate refused camera or microphone permission.
    #[error("Camera access denied: {0}")]
    CameraDenied(String),

    /// No camera or microphone present.
    #[error("Camera or microphone not found: {0}")]
    DeviceNotFound(String),

    /// Fullscreen request rejected by the platform.
    #[error("Fullscreen request denied: {0}")]
    FullscreenDenied(String),

    /// Face-detection model failed to load.
    #[error("Face detection model failed to load: {0}")]
    ModelLoadFailed(String),

    /// A single inference call failed.
    #[error("Face detection failed: {0}")]
    InferenceFailed(String),

    /// No frame could be read from the camera.
    #[error("Camera frame unavailable: {0}")]
    FrameUnavailable(String),
}

impl CapabilityError {
    /// Whether this failure ends the attempt when raised during setup.
    pub fn is_setup_fatal(&self) -> bool {
        matches!(
            self,
            CapabilityError::CameraDenied(_)
                | CapabilityError::DeviceNotFound(_)
                | CapabilityError::FullscreenDenied(_)
                | CapabilityError::ModelLoadFailed(_)
        )
    }
}

/// Errors that can occur while driving the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Event not accepted in the current state.
    #[error("event {event} not valid in state {from}")]
    InvalidTransition { from: MonitorState, event: String },

    /// Configuration rejected.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Runtime channel closed.
    #[error("monitor channel closed")]
    ChannelClosed,
}

/// Failures reported by external sinks. Never propagated into the state machine.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_denied_message() {
        let e = CapabilityError::CameraDenied("NotAllowedError".into());
        assert!(e.to_string().contains("Camera access denied"));
        assert!(e.is_setup_fatal());
    }

    #[test]
    fn transient_failures_are_not_setup_fatal() {
        assert!(!CapabilityError::InferenceFailed("timeout".into()).is_setup_fatal());
        assert!(!CapabilityError::FrameUnavailable("track ended".into()).is_setup_fatal());
    }

    #[test]
    fn invalid_transition_display() {
        let e = MonitorError::InvalidTransition {
            from: MonitorState::Active,
            event: "start".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("start"));
        assert!(msg.contains("active"));
    }
}
