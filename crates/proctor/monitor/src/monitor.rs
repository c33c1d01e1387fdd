//! Condition monitor: the exam-integrity state machine.
//!
//! A [`ConditionMonitor`] owns one attempt's [`Session`] and every component
//! that acts on it. It is driven by typed [`MonitorEvent`]s stamped with a
//! millisecond clock reading; timers come due through the [`Scheduler`] when
//! the clock advances. Nothing in here sleeps or awaits, so the same machine
//! runs under the tokio driver, the replay tool and the tests.
//!
//! State flow:
//!
//! ```text
//! Uninitialized -> AwaitingStart -> Initializing -> Active <-> GracePeriod
//!                         \______________\______________\__________\-> CriticalError | Completed
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use proctor_types::{
    ClipboardAction, ConditionSnapshot, GraceChannel, MonitorState, SessionIds,
    TelemetryEventType, ViolationKind,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::capabilities::{Capabilities, MediaDevice};
use crate::capture::{FrameUpload, PhotoCaptureScheduler};
use crate::config::MonitorConfig;
use crate::detectors::{
    AudioMonitor, FaceAnalysis, FacePresenceDetector, IdleMonitor, LivenessMonitor, TamperSignal,
};
use crate::error::{CapabilityError, MonitorError, MonitorResult};
use crate::escalation::{Escalation, EscalationPolicy};
use crate::grace::{GracePeriod, GracePeriodManager, GraceTick};
use crate::scheduler::{DueTask, Scheduler, TimerQueue, TimerTask};
use crate::session::Session;
use crate::telemetry::TelemetryEmitter;
use crate::terminator::{CriticalErrorTerminator, Teardown};

/// Platform event translated into the monitor's vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Candidate pressed start.
    Start,
    /// Camera and microphone stream is flowing.
    CameraReady,
    /// Face-detection model finished loading.
    ModelLoaded,
    /// A setup step or the stream failed.
    SetupFailed(CapabilityError),
    FullscreenChanged { engaged: bool },
    VisibilityChanged { visible: bool },
    /// One iteration of the detection loop.
    FrameTick,
    /// Mouse or keyboard activity.
    UserActivity,
    ClipboardAttempt(ClipboardAction),
    /// Candidate dismissed the clipboard warning.
    WarningAcknowledged,
    ScreenConfiguration { extended: bool },
    /// Assessment submitted normally.
    Submitted,
}

impl MonitorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::Start => "start",
            MonitorEvent::CameraReady => "camera_ready",
            MonitorEvent::ModelLoaded => "model_loaded",
            MonitorEvent::SetupFailed(_) => "setup_failed",
            MonitorEvent::FullscreenChanged { .. } => "fullscreen_changed",
            MonitorEvent::VisibilityChanged { .. } => "visibility_changed",
            MonitorEvent::FrameTick => "frame_tick",
            MonitorEvent::UserActivity => "user_activity",
            MonitorEvent::ClipboardAttempt(_) => "clipboard_attempt",
            MonitorEvent::WarningAcknowledged => "warning_acknowledged",
            MonitorEvent::ScreenConfiguration { .. } => "screen_configuration",
            MonitorEvent::Submitted => "submitted",
        }
    }
}

/// What the candidate should see right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub state: MonitorState,
    pub headline: String,
    /// Seconds left on the highest-precedence grace period.
    pub countdown_secs: Option<u32>,
    /// Remaining-warnings text for budgeted violations.
    pub notice: Option<String>,
}

/// The exam-integrity state machine for one attempt.
pub struct ConditionMonitor {
    config: MonitorConfig,
    capabilities: Capabilities,
    telemetry: TelemetryEmitter,
    session: Session,
    timers: Box<dyn Scheduler>,
    grace: GracePeriodManager,
    escalation: EscalationPolicy,
    faces: FacePresenceDetector,
    liveness: LivenessMonitor,
    idle: IdleMonitor,
    audio: AudioMonitor,
    capture: PhotoCaptureScheduler,
    terminator: CriticalErrorTerminator,
    tamper: Option<TamperSignal>,
    /// Outranked anomalies already reported, so each is logged once per episode.
    observed: BTreeSet<ViolationKind>,
    inference_failing: bool,
    /// Consecutive samples that produced no face estimate.
    unsampled: u32,
    extended_screen: bool,
}

impl ConditionMonitor {
    /// Wire a monitor to its providers. Leaves it in `AwaitingStart`.
    pub fn new(
        ids: SessionIds,
        config: MonitorConfig,
        capabilities: Capabilities,
        telemetry: TelemetryEmitter,
        uploads: mpsc::UnboundedSender<FrameUpload>,
    ) -> MonitorResult<Self> {
        Self::with_scheduler(
            ids,
            config,
            capabilities,
            telemetry,
            uploads,
            Box::new(TimerQueue::new()),
        )
    }

    /// Same as [`ConditionMonitor::new`] with a caller-supplied scheduler.
    pub fn with_scheduler(
        ids: SessionIds,
        config: MonitorConfig,
        capabilities: Capabilities,
        telemetry: TelemetryEmitter,
        uploads: mpsc::UnboundedSender<FrameUpload>,
        timers: Box<dyn Scheduler>,
    ) -> MonitorResult<Self> {
        config.validate()?;

        let mut monitor = Self {
            escalation: EscalationPolicy::new(config.escalation.clone()),
            faces: FacePresenceDetector::new(config.detection.head_pose_offset_px),
            liveness: LivenessMonitor::new(config.detection.inactivity_window_ms),
            idle: IdleMonitor::new(config.idle.timeout_secs.saturating_mul(1_000)),
            audio: AudioMonitor::new(config.audio.volume_threshold),
            capture: PhotoCaptureScheduler::new(config.capture.interval_secs, uploads),
            terminator: CriticalErrorTerminator::new(capabilities.clone()),
            session: Session::new(ids),
            grace: GracePeriodManager::new(),
            tamper: None,
            observed: BTreeSet::new(),
            inference_failing: false,
            unsampled: 0,
            extended_screen: false,
            config,
            capabilities,
            telemetry,
            timers,
        };

        monitor.transition(MonitorState::AwaitingStart, "providers wired");
        Ok(monitor)
    }

    /// Process one event at clock reading `now_ms`.
    ///
    /// Timers due at or before `now_ms` fire first. Events arriving after the
    /// session ended are ignored.
    pub fn handle(&mut self, event: MonitorEvent, now_ms: u64) -> MonitorResult<MonitorState> {
        self.advance(now_ms);

        if self.session.state.is_terminal() {
            debug!(
                attempt_id = %self.session.ids.attempt_id,
                event = event.name(),
                "Session ended; event ignored"
            );
            return Ok(self.session.state);
        }

        match event {
            MonitorEvent::Start => self.on_start()?,
            MonitorEvent::CameraReady
            | MonitorEvent::ModelLoaded
            | MonitorEvent::SetupFailed(_)
                if !self.accepts_setup_signals() =>
            {
                debug!(
                    attempt_id = %self.session.ids.attempt_id,
                    event = event.name(),
                    state = %self.session.state,
                    "Setup signal before start; ignored"
                );
            }
            MonitorEvent::CameraReady => self.on_camera_ready(),
            MonitorEvent::ModelLoaded => {
                self.session.model_loaded = true;
                self.after_condition_change();
            }
            MonitorEvent::SetupFailed(cause) => self.on_setup_failed(cause),
            MonitorEvent::FullscreenChanged { engaged } => self.on_fullscreen_changed(engaged),
            MonitorEvent::VisibilityChanged { visible } => self.on_visibility_changed(visible),
            MonitorEvent::FrameTick => self.on_frame_tick(),
            MonitorEvent::UserActivity => {
                self.idle.record_activity(self.now_ms());
                self.evaluate();
            }
            MonitorEvent::ClipboardAttempt(action) => self.on_clipboard_attempt(action),
            MonitorEvent::WarningAcknowledged => {
                self.clear_grace(GraceChannel::Clipboard);
                self.evaluate();
            }
            MonitorEvent::ScreenConfiguration { extended } => {
                if extended && !self.extended_screen {
                    warn!(attempt_id = %self.session.ids.attempt_id, "Extended display detected");
                    self.telemetry.emit(
                        TelemetryEventType::MultipleMonitorsDetected,
                        json!({ "at_ms": self.now_ms() }),
                    );
                }
                self.extended_screen = extended;
            }
            MonitorEvent::Submitted => self.complete(),
        }

        Ok(self.session.state)
    }

    /// Move the clock to `now_ms`, firing every timer that comes due.
    pub fn advance(&mut self, now_ms: u64) {
        while let Some(due) = self.timers.pop_due(now_ms) {
            self.on_timer(due);
        }
        self.timers.advance_to(now_ms);
    }

    /// Clock reading of the next pending timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn state(&self) -> MonitorState {
        self.session.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> ConditionSnapshot {
        self.session.snapshot()
    }

    pub fn grace(&self) -> &GracePeriodManager {
        &self.grace
    }

    pub fn escalation(&self) -> &EscalationPolicy {
        &self.escalation
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn capture_attempts(&self) -> u64 {
        self.capture.attempts()
    }

    pub fn force_submitted(&self) -> bool {
        self.terminator.has_fired()
    }

    /// Derived status text for the candidate.
    pub fn status(&self) -> StatusView {
        let primary = self.grace.primary();
        let headline = match self.session.state {
            MonitorState::Uninitialized => "Preparing proctoring.".to_string(),
            MonitorState::AwaitingStart => "Click to begin the proctored assessment.".to_string(),
            MonitorState::Initializing => {
                "Setting up camera, fullscreen and face detection.".to_string()
            }
            MonitorState::Active => "Proctoring active.".to_string(),
            MonitorState::GracePeriod { kind } => primary
                .map(|p| p.reason.clone())
                .unwrap_or_else(|| kind.reason().to_string()),
            MonitorState::CriticalError => self
                .session
                .critical_message
                .clone()
                .unwrap_or_else(|| "Proctoring ended.".to_string()),
            MonitorState::Completed => "Assessment submitted.".to_string(),
        };

        StatusView {
            state: self.session.state,
            headline,
            countdown_secs: primary.map(|p| p.remaining_secs),
            notice: primary.and_then(|p| p.notice.clone()),
        }
    }

    fn on_start(&mut self) -> MonitorResult<()> {
        if self.session.state != MonitorState::AwaitingStart {
            return Err(MonitorError::InvalidTransition {
                from: self.session.state,
                event: MonitorEvent::Start.name().to_string(),
            });
        }
        self.session.initialized = true;
        self.transition(MonitorState::Initializing, "start requested");
        Ok(())
    }

    fn accepts_setup_signals(&self) -> bool {
        self.session.state == MonitorState::Initializing || self.session.state.is_monitoring()
    }

    fn on_camera_ready(&mut self) {
        let now = self.now_ms();
        self.session.camera_ready = true;
        self.liveness.reset(now);
        self.tamper = None;

        if self.capture.start(self.timers.as_mut()) {
            self.capture_photo(now);
        }
        self.after_condition_change();
    }

    fn on_setup_failed(&mut self, cause: CapabilityError) {
        warn!(
            attempt_id = %self.session.ids.attempt_id,
            error = %cause,
            state = %self.session.state,
            "Capability failure"
        );
        self.telemetry.emit(
            TelemetryEventType::SetupFailed,
            json!({ "error": cause.to_string(), "state": self.session.state.to_string() }),
        );

        // No grace for setup failures.
        if self.session.state == MonitorState::Initializing && cause.is_setup_fatal() {
            self.fail(cause.to_string());
            return;
        }

        match cause {
            CapabilityError::ModelLoadFailed(_) => self.session.model_loaded = false,
            CapabilityError::FullscreenDenied(_) | CapabilityError::InferenceFailed(_) => {}
            CapabilityError::CameraDenied(_)
            | CapabilityError::DeviceNotFound(_)
            | CapabilityError::FrameUnavailable(_) => {
                self.session.camera_ready = false;
                self.tamper = None;
            }
        }
        self.after_condition_change();
    }

    fn on_fullscreen_changed(&mut self, engaged: bool) {
        let was_engaged = self.session.fullscreen_engaged;
        self.session.fullscreen_engaged = engaged;

        if self.session.state.is_monitoring() && was_engaged && !engaged {
            self.record_occurrence(ViolationKind::FullscreenExit);
        }
        self.after_condition_change();
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        let was_visible = self.session.tab_visible;
        self.session.tab_visible = visible;

        if self.session.state.is_monitoring() && was_visible && !visible {
            self.record_occurrence(ViolationKind::TabSwitch);
        }
        self.after_condition_change();
    }

    fn on_frame_tick(&mut self) {
        match self.session.state {
            MonitorState::Initializing => {
                self.sample_faces();
                self.try_activate();
            }
            state if state.is_monitoring() => {
                self.detection_tick();
                self.evaluate();
            }
            _ => {}
        }
    }

    fn on_clipboard_attempt(&mut self, action: ClipboardAction) {
        self.telemetry.emit(
            TelemetryEventType::ClipboardBlocked,
            json!({ "action": action }),
        );
        if self.session.state.is_monitoring() {
            self.record_occurrence(ViolationKind::ClipboardAttempt);
            self.evaluate();
        }
    }

    fn after_condition_change(&mut self) {
        if self.session.state == MonitorState::Initializing {
            self.try_activate();
        } else {
            self.evaluate();
        }
    }

    fn try_activate(&mut self) {
        if self.session.state != MonitorState::Initializing || self.session.error_triggered {
            return;
        }
        if !self.session.snapshot().readiness_met() {
            return;
        }

        let now = self.now_ms();
        self.sample_faces();
        self.idle.record_activity(now);
        self.liveness.reset(now);
        self.session.active = true;
        self.transition(MonitorState::Active, "camera, fullscreen and face model ready");

        if !self.session.tab_visible {
            self.record_occurrence(ViolationKind::TabSwitch);
        }
        self.evaluate();
    }

    /// Run the inference capability on the current frame, if it can run.
    fn sample_faces(&mut self) -> Option<FaceAnalysis> {
        if !(self.session.camera_ready && self.session.model_loaded) {
            return None;
        }
        let Some(frame) = self.capabilities.media.current_frame() else {
            self.record_unsampled("no frame available");
            return None;
        };

        match self.capabilities.inference.estimate(&frame) {
            Ok(detections) => {
                self.inference_failing = false;
                self.unsampled = 0;
                let analysis = self.faces.analyze(&detections);
                self.session.face_count = analysis.face_count;
                Some(analysis)
            }
            Err(e) => {
                if !self.inference_failing {
                    warn!(attempt_id = %self.session.ids.attempt_id, error = %e, "Face inference failed");
                    self.telemetry.emit(
                        TelemetryEventType::InferenceFailed,
                        json!({ "error": e.to_string() }),
                    );
                }
                self.inference_failing = true;
                self.record_unsampled("face inference failing");
                None
            }
        }
    }

    /// A tick without a face estimate. Past the limit the last known face
    /// count is no longer trusted and the frame counts as empty.
    fn record_unsampled(&mut self, cause: &str) {
        self.unsampled = self.unsampled.saturating_add(1);
        if self.unsampled >= self.config.detection.sample_failure_limit
            && self.session.face_count != 0
        {
            warn!(
                attempt_id = %self.session.ids.attempt_id,
                ticks = self.unsampled,
                cause = cause,
                "No usable face estimate; treating frame as empty"
            );
            self.session.face_count = 0;
        }
    }

    /// One detection-loop iteration: liveness, faces, audio.
    fn detection_tick(&mut self) {
        let now = self.now_ms();
        let media: Arc<dyn MediaDevice> = self.capabilities.media.clone();

        if self.session.camera_ready {
            let signal = self.liveness.check(media.video_state(), now);
            if let (Some(signal), None) = (signal, self.tamper) {
                warn!(attempt_id = %self.session.ids.attempt_id, signal = %signal, "Webcam tampering suspected");
                self.telemetry.emit(
                    TelemetryEventType::WebcamTamper,
                    json!({ "signal": signal, "detail": signal.to_string() }),
                );
            }
            self.tamper = signal;
        }

        if let Some(analysis) = self.sample_faces() {
            if let Some(pose) = analysis.head_pose {
                info!(
                    attempt_id = %self.session.ids.attempt_id,
                    offset_px = pose.offset_px,
                    "Head turned away"
                );
                self.telemetry.emit(
                    TelemetryEventType::HeadPoseAnomaly,
                    json!({ "offset_px": pose.offset_px, "threshold_px": pose.threshold_px }),
                );
            }
        }

        if let Some(level) = media.audio_level() {
            if let Some(anomaly) = self.audio.sample(level) {
                info!(attempt_id = %self.session.ids.attempt_id, level = anomaly.level, "Loud audio");
                self.telemetry.emit(
                    TelemetryEventType::AudioAnomaly,
                    json!({ "level": anomaly.level, "threshold": anomaly.threshold }),
                );
            }
        }
    }

    /// Failing conditions at `now_ms`, highest precedence first.
    fn failing_conditions(&self, now_ms: u64) -> Vec<ViolationKind> {
        let mut failing = self.session.snapshot().failing();
        if self.idle.is_idle(now_ms) {
            failing.push(ViolationKind::Idle);
        }
        if self.tamper.is_some() {
            failing.push(ViolationKind::WebcamTamper);
        }
        failing.sort_by_key(|k| k.precedence());
        failing
    }

    /// Reconcile grace periods with the latest conditions and settle the state.
    fn evaluate(&mut self) {
        if !self.session.state.is_monitoring() || self.session.error_triggered {
            return;
        }
        let failing = self.failing_conditions(self.now_ms());

        // Clipboard graces clear on acknowledgement only.
        let resolved: Vec<GraceChannel> = self
            .grace
            .active()
            .filter(|p| p.kind != ViolationKind::ClipboardAttempt && !failing.contains(&p.kind))
            .map(|p| p.kind.channel())
            .collect();
        for channel in resolved {
            self.clear_grace(channel);
        }

        for kind in failing.iter().copied().filter(|k| k.is_continuous()) {
            let outranked_by = failing
                .iter()
                .copied()
                .find(|other| other.precedence() < kind.precedence());

            match outranked_by {
                Some(higher) => {
                    if !self.grace.is_running(kind) && self.observed.insert(kind) {
                        debug!(kind = %kind, outranked_by = %higher, "Anomaly outranked");
                        self.telemetry.emit(
                            TelemetryEventType::AnomalyObserved,
                            json!({
                                "kind": kind,
                                "reason": kind.reason(),
                                "outranked_by": higher,
                            }),
                        );
                    }
                }
                None => {
                    self.observed.remove(&kind);
                    self.open_grace(kind, None);
                    if self.session.error_triggered {
                        return;
                    }
                }
            }
        }
        self.observed.retain(|kind| failing.contains(kind));

        self.refresh_state();
    }

    /// Count one occurrence of a budgeted violation.
    fn record_occurrence(&mut self, kind: ViolationKind) {
        let Some(escalation) = self.escalation.record(kind) else {
            return;
        };

        let counter = match &escalation {
            Escalation::Warn { counter, .. } | Escalation::Exhausted { counter, .. } => *counter,
        };
        self.telemetry.emit(
            TelemetryEventType::ViolationRecorded,
            json!({
                "kind": kind,
                "count": counter.count,
                "max": counter.max,
                "remaining": counter.remaining(),
            }),
        );

        match escalation {
            Escalation::Warn { notice, .. } => {
                self.open_grace(kind, Some(notice));
                self.refresh_state();
            }
            Escalation::Exhausted { message, .. } => self.fail(message),
        }
    }

    fn open_grace(&mut self, kind: ViolationKind, notice: Option<String>) {
        if kind.is_continuous() && !self.grace.is_running(kind) {
            if let Some(message) = self.escalation.record_grace_cycle(kind) {
                self.fail(message);
                return;
            }
        }

        let duration_secs = self.config.grace.duration_for(kind);
        let outcome = self
            .grace
            .start(kind, duration_secs, notice.clone(), self.timers.as_mut());
        if !outcome.opened() {
            if notice.is_some() {
                self.grace.update_notice(kind.channel(), notice);
            }
            return;
        }

        warn!(
            attempt_id = %self.session.ids.attempt_id,
            kind = %kind,
            duration_secs = duration_secs,
            "Violation grace period opened"
        );
        self.telemetry.emit(
            TelemetryEventType::GraceStarted,
            json!({
                "kind": kind,
                "reason": kind.reason(),
                "duration_secs": duration_secs,
                "notice": notice,
            }),
        );
    }

    fn clear_grace(&mut self, channel: GraceChannel) -> Option<GracePeriod> {
        let now = self.now_ms();
        let period = self.grace.clear(channel, self.timers.as_mut())?;
        self.telemetry.emit(
            TelemetryEventType::GraceCleared,
            json!({
                "kind": period.kind,
                "elapsed_ms": now.saturating_sub(period.started_at_ms),
            }),
        );
        Some(period)
    }

    /// Derive Active or GracePeriod from the running countdowns.
    fn refresh_state(&mut self) {
        if !self.session.state.is_monitoring() || self.session.error_triggered {
            return;
        }
        let (next, reason) = match self.grace.primary() {
            Some(period) => (
                MonitorState::GracePeriod { kind: period.kind },
                period.reason.clone(),
            ),
            None => (MonitorState::Active, "all conditions satisfied".to_string()),
        };
        self.transition(next, &reason);
    }

    fn on_timer(&mut self, due: DueTask) {
        if self.session.error_triggered || self.session.state.is_terminal() {
            return;
        }

        match due.task {
            TimerTask::GraceTick(channel) => {
                match self.grace.on_tick(channel, due.handle, self.timers.as_mut()) {
                    GraceTick::Countdown {
                        kind,
                        remaining_secs,
                    } => {
                        self.telemetry.emit(
                            TelemetryEventType::GraceTick,
                            json!({ "kind": kind, "remaining_secs": remaining_secs }),
                        );
                    }
                    GraceTick::Expired { kind, message } => {
                        let message = match self.escalation.counter(kind) {
                            Some(counter) => format!(
                                "{} {} violations: {} of {}.",
                                message,
                                kind.label(),
                                counter.count,
                                counter.max
                            ),
                            None => message,
                        };
                        self.telemetry.emit(
                            TelemetryEventType::GraceExpired,
                            json!({ "kind": kind, "message": message }),
                        );
                        self.fail(message);
                    }
                    GraceTick::Stale => {}
                }
            }
            TimerTask::PhotoCapture => {
                if self.capture.on_timer(due.handle, self.timers.as_mut()) {
                    self.capture_photo(due.due_ms);
                }
            }
        }
    }

    fn capture_photo(&mut self, now_ms: u64) {
        self.capture.capture(
            &self.session.ids,
            self.capabilities.media.as_ref(),
            now_ms,
            &self.telemetry,
        );
    }

    /// Critical-error path: tear down, force submission once, go terminal.
    fn fail(&mut self, message: String) {
        if self.session.error_triggered {
            return;
        }
        self.session.error_triggered = true;
        error!(
            attempt_id = %self.session.ids.attempt_id,
            state = %self.session.state,
            message = %message,
            "Critical proctoring error"
        );

        self.terminator.terminate(
            &self.session.ids,
            &message,
            Teardown {
                grace: &mut self.grace,
                capture: &mut self.capture,
                scheduler: self.timers.as_mut(),
            },
            &self.telemetry,
        );
        self.telemetry.emit(
            TelemetryEventType::CriticalError,
            json!({ "message": message }),
        );

        self.session.active = false;
        self.session.critical_message = Some(message.clone());
        self.transition(MonitorState::CriticalError, &message);
    }

    /// Normal submission: release everything without forcing submission.
    fn complete(&mut self) {
        self.terminator.shutdown(Teardown {
            grace: &mut self.grace,
            capture: &mut self.capture,
            scheduler: self.timers.as_mut(),
        });
        self.session.active = false;
        self.telemetry.emit(
            TelemetryEventType::SessionCompleted,
            json!({ "capture_attempts": self.capture.attempts() }),
        );
        self.transition(MonitorState::Completed, "assessment submitted");
    }

    /// Change state, emitting exactly one transition event.
    fn transition(&mut self, to: MonitorState, reason: &str) {
        let from = self.session.state;
        if from == to {
            return;
        }
        self.session.state = to;

        info!(
            attempt_id = %self.session.ids.attempt_id,
            from = %from,
            to = %to,
            reason = %reason,
            "Monitor state transition"
        );
        self.telemetry.emit(
            TelemetryEventType::StateTransition,
            json!({
                "from": from.to_string(),
                "to": to.to_string(),
                "reason": reason,
            }),
        );
    }
}

impl std::fmt::Debug for ConditionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionMonitor")
            .field("session", &self.session)
            .field("grace", &self.grace)
            .field("pending_timers", &self.timers.pending())
            .finish_non_exhaustive()
    }
}
