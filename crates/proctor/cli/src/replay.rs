//! Scripted replay on a virtual clock.
//!
//! Drives a [`ConditionMonitor`] wired to headless providers. Time advances in
//! detection-loop steps; script steps land at their own timestamps in
//! between. Telemetry is drained after every event and stamped with the
//! virtual time at which it was observed.

use std::sync::Arc;

use proctor_evidence::{EvidenceRecord, EvidenceStore, StoreUploader};
use proctor_monitor::headless::HeadlessProviders;
use proctor_monitor::{
    spawn_upload_forwarder, upload_channel, CapabilityError, ConditionMonitor, MonitorConfig,
    MonitorEvent, StatusView, TelemetryEmitter, TelemetryReceiver,
};
use proctor_types::{AttemptId, MonitorState, SessionIds, TelemetryEventType};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CliResult;
use crate::script::{Action, ReplayScript, ScriptStep};

/// A telemetry event observed during replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayEvent {
    pub at_ms: u64,
    pub event_type: TelemetryEventType,
    pub payload: Value,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub attempt_id: AttemptId,
    pub final_state: MonitorState,
    pub status: StatusView,
    pub ended_at_ms: u64,
    pub force_submitted: bool,
    pub capture_attempts: u64,
    pub evidence: Vec<EvidenceRecord>,
    pub events: Vec<ReplayEvent>,
}

impl ReplayReport {
    pub fn count(&self, event_type: TelemetryEventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

struct Replay {
    monitor: ConditionMonitor,
    providers: HeadlessProviders,
    telemetry: TelemetryReceiver,
    log: Vec<ReplayEvent>,
    active_user: bool,
}

impl Replay {
    fn dispatch(&mut self, event: MonitorEvent, now_ms: u64) -> Option<MonitorState> {
        let name = event.name();
        let now_ms = now_ms.max(self.monitor.now_ms());
        let result = match self.monitor.handle(event, now_ms) {
            Ok(state) => {
                debug!(event = name, state = %state, now_ms, "Event handled");
                Some(state)
            }
            Err(e) => {
                warn!(event = name, error = %e, now_ms, "Event rejected");
                None
            }
        };
        self.drain(now_ms);
        result
    }

    fn drain(&mut self, at_ms: u64) {
        while let Ok(event) = self.telemetry.try_recv() {
            self.log.push(ReplayEvent {
                at_ms,
                event_type: event.event_type,
                payload: event.payload,
            });
        }
    }

    /// Same order the async runtime uses: camera, fullscreen, model.
    async fn setup(&mut self, at_ms: u64) {
        let capabilities = self.monitor.capabilities().clone();

        if let Err(e) = capabilities.media.acquire().await {
            self.dispatch(MonitorEvent::SetupFailed(e), at_ms);
            return;
        }
        self.dispatch(MonitorEvent::CameraReady, at_ms);

        if let Err(e) = capabilities.fullscreen.request().await {
            self.dispatch(MonitorEvent::SetupFailed(e), at_ms);
            return;
        }
        self.dispatch(MonitorEvent::FullscreenChanged { engaged: true }, at_ms);

        match capabilities.inference.load().await {
            Ok(()) => self.dispatch(MonitorEvent::ModelLoaded, at_ms),
            Err(e) => self.dispatch(MonitorEvent::SetupFailed(e), at_ms),
        };
    }

    async fn apply(&mut self, step: ScriptStep) {
        let at = step.at_ms;
        debug!(at_ms = at, action = ?step.action, "Script step");
        match step.action {
            Action::Start => {
                if self.dispatch(MonitorEvent::Start, at) == Some(MonitorState::Initializing) {
                    self.setup(at).await;
                }
            }
            Action::FullscreenExit => {
                self.dispatch(MonitorEvent::FullscreenChanged { engaged: false }, at);
            }
            Action::FullscreenEnter => {
                self.dispatch(MonitorEvent::FullscreenChanged { engaged: true }, at);
            }
            Action::TabHidden => {
                self.dispatch(MonitorEvent::VisibilityChanged { visible: false }, at);
            }
            Action::TabVisible => {
                self.dispatch(MonitorEvent::VisibilityChanged { visible: true }, at);
            }
            Action::Clipboard { clipboard } => {
                self.dispatch(MonitorEvent::ClipboardAttempt(clipboard), at);
            }
            Action::AcknowledgeWarning => {
                self.dispatch(MonitorEvent::WarningAcknowledged, at);
            }
            Action::ScreenConfiguration { extended } => {
                self.dispatch(MonitorEvent::ScreenConfiguration { extended }, at);
            }
            Action::GoIdle => self.active_user = false,
            Action::Resume => {
                self.active_user = true;
                self.dispatch(MonitorEvent::UserActivity, at);
            }
            Action::Submit => {
                self.dispatch(MonitorEvent::Submitted, at);
            }
            Action::Faces { count } => self.providers.inference.set_face_count(count),
            Action::AudioLevel { level } => self.providers.camera.set_audio_level(level),
            Action::FreezeCamera { frozen } => self.providers.camera.freeze(frozen),
            Action::PauseCamera { paused } => self.providers.camera.pause(paused),
            Action::BlankCamera { blank } => self.providers.camera.blank(blank),
            Action::DenyCamera { message } => self
                .providers
                .camera
                .deny(CapabilityError::CameraDenied(message)),
            Action::DenyFullscreen { message } => self
                .providers
                .fullscreen
                .deny(CapabilityError::FullscreenDenied(message)),
            Action::FailModelLoad { message } => self
                .providers
                .inference
                .fail_load(CapabilityError::ModelLoadFailed(message)),
            Action::InferenceError => self.providers.inference.fail_next_estimate(),
            Action::CameraLost { message } => {
                self.dispatch(
                    MonitorEvent::SetupFailed(CapabilityError::FrameUnavailable(message)),
                    at,
                );
            }
        }
    }

    /// One detection-loop iteration at `now_ms`.
    fn tick(&mut self, now_ms: u64) {
        self.monitor.advance(now_ms);
        self.drain(now_ms);

        let state = self.monitor.state();
        if state.is_monitoring() && self.active_user {
            self.dispatch(MonitorEvent::UserActivity, now_ms);
        }
        if state == MonitorState::Initializing || state.is_monitoring() {
            self.dispatch(MonitorEvent::FrameTick, now_ms);
        }
    }
}

/// Replay `script` for one attempt and collect what the monitor reported.
pub async fn replay(
    script: &ReplayScript,
    config: MonitorConfig,
    ids: SessionIds,
) -> CliResult<ReplayReport> {
    let frame_interval = script
        .frame_interval_ms
        .unwrap_or(config.detection.frame_interval_ms);

    let store = EvidenceStore::new();
    store.register_attempt(ids.attempt_id.clone(), ids.subject_id.clone());
    let providers = HeadlessProviders::new();

    let (telemetry, events) = TelemetryEmitter::channel(ids.attempt_id.clone());
    let (uploads, frames) = upload_channel();
    let upload_task = spawn_upload_forwarder(
        frames,
        Arc::new(StoreUploader::new(store.clone(), ids.subject_id.clone())),
        telemetry.clone(),
    );

    let monitor = ConditionMonitor::new(
        ids.clone(),
        config,
        providers.capabilities(),
        telemetry,
        uploads,
    )?;
    let mut replay = Replay {
        monitor,
        providers,
        telemetry: events,
        log: Vec::new(),
        active_user: true,
    };
    replay.drain(0);

    info!(
        attempt_id = %ids.attempt_id,
        duration_ms = script.duration_ms,
        steps = script.steps.len(),
        "Replay started"
    );

    let mut pending = script.ordered_steps().into_iter().peekable();
    let mut now = 0u64;
    loop {
        while let Some(step) = pending.next_if(|s| s.at_ms <= now) {
            replay.apply(step).await;
            if replay.monitor.state().is_terminal() {
                break;
            }
        }
        if replay.monitor.state().is_terminal() {
            break;
        }
        replay.tick(now);
        if replay.monitor.state().is_terminal() || now >= script.duration_ms {
            break;
        }
        now = (now + frame_interval).min(script.duration_ms);
    }

    let ended_at_ms = replay.monitor.now_ms().max(now);
    let final_state = replay.monitor.state();
    let status = replay.monitor.status();
    let force_submitted = replay.monitor.force_submitted();
    let capture_attempts = replay.monitor.capture_attempts();

    // Dropping the monitor closes the upload channel so the forwarder finishes.
    let Replay {
        monitor,
        mut telemetry,
        mut log,
        ..
    } = replay;
    drop(monitor);
    let stored = upload_task.await.unwrap_or_else(|e| {
        warn!(error = %e, "Upload forwarder failed");
        0
    });
    while let Ok(event) = telemetry.try_recv() {
        log.push(ReplayEvent {
            at_ms: ended_at_ms,
            event_type: event.event_type,
            payload: event.payload,
        });
    }

    info!(
        attempt_id = %ids.attempt_id,
        state = %final_state,
        ended_at_ms,
        stored,
        "Replay finished"
    );

    Ok(ReplayReport {
        evidence: store.list(&ids.attempt_id),
        attempt_id: ids.attempt_id,
        final_state,
        status,
        ended_at_ms,
        force_submitted,
        capture_attempts,
        events: log,
    })
}
