//! # Proctor Monitor - Exam-Integrity Condition Monitoring
//!
//! This crate watches the environment of a timed assessment attempt and
//! escalates violations until they either self-correct or end the attempt.
//!
//! ## Overview
//!
//! While an attempt is in progress the monitor continuously verifies:
//!
//! - **Fullscreen lock**: the exam stays fullscreen
//! - **Tab focus**: the exam tab stays visible
//! - **Camera liveness**: the stream is flowing and not frozen
//! - **Face presence**: exactly one face is in frame
//! - **Activity**: the candidate has not gone idle
//!
//! A failing condition opens a grace period. Fixing it in time returns the
//! session to `Active`; letting it run out, or exceeding a violation budget,
//! forces submission of the attempt.
//!
//! ## Key Components
//!
//! - [`ConditionMonitor`]: The state machine, driven by [`MonitorEvent`]s
//! - [`GracePeriodManager`]: Per-channel countdowns
//! - [`EscalationPolicy`]: Violation budgets
//! - [`PhotoCaptureScheduler`]: Periodic evidence capture
//! - [`CriticalErrorTerminator`]: Teardown and forced submission
//! - [`MonitorRuntime`]: Tokio driver for a monitor
//! - [`headless`]: Scriptable providers for tests and replays
//!
//! ## Example
//!
//! ```rust,no_run
//! use proctor_monitor::{
//!     headless::HeadlessProviders, upload_channel, ConditionMonitor, MonitorConfig,
//!     MonitorRuntime, StrictnessProfile, TelemetryEmitter,
//! };
//! use proctor_types::SessionIds;
//!
//! # async fn example() {
//! let ids = SessionIds::for_attempt("midterm", "alice");
//! let providers = HeadlessProviders::new();
//! let (telemetry, _events) = TelemetryEmitter::channel(ids.attempt_id.clone());
//! let (uploads, _frames) = upload_channel();
//!
//! let monitor = ConditionMonitor::new(
//!     ids,
//!     MonitorConfig::for_profile(StrictnessProfile::Standard),
//!     providers.capabilities(),
//!     telemetry,
//!     uploads,
//! )
//! .unwrap();
//!
//! let (runtime, handle) = MonitorRuntime::new(monitor);
//! let task = tokio::spawn(runtime.run());
//! handle.start().unwrap();
//! // ... assessment runs ...
//! handle.submit().unwrap();
//! let outcome = task.await.unwrap();
//! println!("Session ended: {}", outcome.state);
//! # }
//! ```
//!
//! ## Timing
//!
//! The state machine never sleeps. Timers live in a [`Scheduler`] on a
//! millisecond clock that the driver advances, so every policy can be tested
//! on a virtual clock.

#![deny(unsafe_code)]

pub mod capabilities;
pub mod capture;
pub mod config;
pub mod detectors;
pub mod error;
pub mod escalation;
pub mod grace;
pub mod headless;
pub mod monitor;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod telemetry;
pub mod terminator;

// Re-export main types
pub use capabilities::{
    Capabilities, FaceInference, ForceSubmit, ForceSubmitRequest, FullscreenControl, MediaDevice,
};
pub use capture::{
    spawn_upload_forwarder, upload_channel, CaptureOutcome, EvidenceSink, FrameUpload,
    PhotoCaptureScheduler, UploadReceipt, UploadReceiver,
};
pub use config::{
    AudioConfig, CaptureConfig, DetectionConfig, EscalationConfig, GraceConfig, IdleConfig,
    MonitorConfig, StrictnessProfile,
};
pub use error::{CapabilityError, MonitorError, MonitorResult, SinkError};
pub use escalation::{Escalation, EscalationPolicy, ViolationCounter};
pub use grace::{GracePeriod, GracePeriodManager, GraceStart, GraceTick};
pub use monitor::{ConditionMonitor, MonitorEvent, StatusView};
pub use runtime::{MonitorHandle, MonitorRuntime, RuntimeOutcome};
pub use scheduler::{DueTask, Scheduler, TimerHandle, TimerQueue, TimerTask};
pub use session::Session;
pub use telemetry::{spawn_telemetry_forwarder, TelemetryEmitter, TelemetryReceiver, TelemetrySink};
pub use terminator::{CriticalErrorTerminator, Teardown};

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_types::{MonitorState, SessionIds};

    #[test]
    fn test_profiles_build_monitors() {
        for profile in [
            StrictnessProfile::Standard,
            StrictnessProfile::Strict,
            StrictnessProfile::Lenient,
        ] {
            let ids = SessionIds::for_attempt("quiz", "bob");
            let (telemetry, _events) = TelemetryEmitter::channel(ids.attempt_id.clone());
            let (uploads, _frames) = upload_channel();
            let monitor = ConditionMonitor::new(
                ids,
                MonitorConfig::for_profile(profile),
                headless::HeadlessProviders::new().capabilities(),
                telemetry,
                uploads,
            )
            .unwrap();
            assert_eq!(monitor.state(), MonitorState::AwaitingStart);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MonitorConfig::default();
        config.capture.interval_secs = 0;
        let ids = SessionIds::for_attempt("quiz", "bob");
        let (telemetry, _events) = TelemetryEmitter::channel(ids.attempt_id.clone());
        let (uploads, _frames) = upload_channel();
        let result = ConditionMonitor::new(
            ids,
            config,
            headless::HeadlessProviders::new().capabilities(),
            telemetry,
            uploads,
        );
        assert!(matches!(result, Err(MonitorError::Configuration(_))));
    }
}
