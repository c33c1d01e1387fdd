//! Critical-error terminator.
//!
//! Tears down every timer and provider a session holds and invokes the
//! force-submit trigger at most once per session.

use proctor_types::{SessionIds, TelemetryEventType};
use serde_json::json;
use tracing::{error, info};

use crate::capabilities::{Capabilities, ForceSubmitRequest};
use crate::capture::PhotoCaptureScheduler;
use crate::grace::GracePeriodManager;
use crate::scheduler::Scheduler;
use crate::telemetry::TelemetryEmitter;

/// Mutable session resources released on teardown.
pub struct Teardown<'a> {
    pub grace: &'a mut GracePeriodManager,
    pub capture: &'a mut PhotoCaptureScheduler,
    pub scheduler: &'a mut dyn Scheduler,
}

/// Releases a session's resources and forces submission once.
#[derive(Debug)]
pub struct CriticalErrorTerminator {
    capabilities: Capabilities,
    fired_reason: Option<String>,
}

impl CriticalErrorTerminator {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            fired_reason: None,
        }
    }

    /// Cancel every timer and release camera, microphone and fullscreen.
    ///
    /// Safe to call repeatedly.
    pub fn shutdown(&self, teardown: Teardown<'_>) {
        let cleared = teardown.grace.clear_all(teardown.scheduler);
        teardown.capture.stop(teardown.scheduler);
        let cancelled = teardown.scheduler.cancel_all();
        self.capabilities.media.release();
        self.capabilities.fullscreen.exit();
        info!(
            grace_cleared = cleared,
            timers_cancelled = cancelled,
            "Session resources released"
        );
    }

    /// Tear down and invoke force-submit. Returns false if it already fired.
    pub fn terminate(
        &mut self,
        ids: &SessionIds,
        reason: &str,
        teardown: Teardown<'_>,
        telemetry: &TelemetryEmitter,
    ) -> bool {
        if let Some(previous) = &self.fired_reason {
            info!(
                attempt_id = %ids.attempt_id,
                previous = %previous,
                "Force submit already invoked"
            );
            return false;
        }
        self.fired_reason = Some(reason.to_string());

        self.shutdown(teardown);

        error!(attempt_id = %ids.attempt_id, reason = %reason, "Forcing submission");
        self.capabilities.force_submit.force_submit(&ForceSubmitRequest {
            ids: ids.clone(),
            reason: reason.to_string(),
        });
        telemetry.emit(TelemetryEventType::ForceSubmit, json!({ "reason": reason }));
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired_reason.is_some()
    }

    pub fn fired_reason(&self) -> Option<&str> {
        self.fired_reason.as_deref()
    }
}
