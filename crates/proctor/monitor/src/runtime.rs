//! Async driver for a [`ConditionMonitor`].
//!
//! Runs the monitor on a tokio task: platform events arrive over a channel,
//! the detection loop ticks on an interval, and the task sleeps until the
//! monitor's next timer deadline. Setup calls that wait on permission prompts
//! are awaited here, never inside the state machine.

use std::time::Duration;

use proctor_types::MonitorState;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{MonitorError, MonitorResult};
use crate::monitor::{ConditionMonitor, MonitorEvent};

/// Cloneable sender for platform events.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::UnboundedSender<MonitorEvent>,
}

impl MonitorHandle {
    pub fn send(&self, event: MonitorEvent) -> MonitorResult<()> {
        self.tx.send(event).map_err(|_| MonitorError::ChannelClosed)
    }

    /// Candidate pressed start.
    pub fn start(&self) -> MonitorResult<()> {
        self.send(MonitorEvent::Start)
    }

    /// Assessment submitted normally.
    pub fn submit(&self) -> MonitorResult<()> {
        self.send(MonitorEvent::Submitted)
    }
}

/// How a driven session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeOutcome {
    pub state: MonitorState,
    pub message: Option<String>,
    pub capture_attempts: u64,
    pub elapsed_ms: u64,
}

/// Tokio driver owning one monitor.
pub struct MonitorRuntime {
    monitor: ConditionMonitor,
    rx: mpsc::UnboundedReceiver<MonitorEvent>,
    frame_interval: Duration,
    origin: Instant,
}

impl MonitorRuntime {
    pub fn new(monitor: ConditionMonitor) -> (Self, MonitorHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let frame_interval = Duration::from_millis(monitor.config().detection.frame_interval_ms);
        let runtime = Self {
            monitor,
            rx,
            frame_interval,
            origin: Instant::now(),
        };
        (runtime, MonitorHandle { tx })
    }

    /// Drive the monitor until the session ends or every handle is dropped.
    pub async fn run(mut self) -> RuntimeOutcome {
        let attempt_id = self.monitor.session().ids.attempt_id.clone();
        info!(attempt_id = %attempt_id, "Monitor runtime started");

        let mut frames = time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.monitor.state().is_terminal() {
            let deadline = self
                .monitor
                .next_deadline()
                .map(|ms| self.origin + Duration::from_millis(ms));

            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(MonitorEvent::Start) => {
                        if self.dispatch(MonitorEvent::Start) == Some(MonitorState::Initializing) {
                            self.setup().await;
                        }
                    }
                    Some(event) => {
                        self.dispatch(event);
                    }
                    None => {
                        info!(attempt_id = %attempt_id, "All monitor handles dropped");
                        break;
                    }
                },
                _ = frames.tick() => {
                    let state = self.monitor.state();
                    if state == MonitorState::Initializing || state.is_monitoring() {
                        self.dispatch(MonitorEvent::FrameTick);
                    }
                }
                _ = sleep_until(deadline) => {
                    let now = self.now_ms();
                    self.monitor.advance(now);
                }
            }
        }

        let session = self.monitor.session();
        let outcome = RuntimeOutcome {
            state: session.state,
            message: session.critical_message.clone(),
            capture_attempts: self.monitor.capture_attempts(),
            elapsed_ms: self.now_ms(),
        };
        info!(attempt_id = %attempt_id, state = %outcome.state, "Monitor runtime stopped");
        outcome
    }

    pub fn monitor(&self) -> &ConditionMonitor {
        &self.monitor
    }

    /// Acquire camera, engage fullscreen and load the model, in that order.
    async fn setup(&mut self) {
        let capabilities = self.monitor.capabilities().clone();

        if let Err(e) = capabilities.media.acquire().await {
            self.dispatch(MonitorEvent::SetupFailed(e));
            return;
        }
        self.dispatch(MonitorEvent::CameraReady);

        if let Err(e) = capabilities.fullscreen.request().await {
            self.dispatch(MonitorEvent::SetupFailed(e));
            return;
        }
        self.dispatch(MonitorEvent::FullscreenChanged { engaged: true });

        match capabilities.inference.load().await {
            Ok(()) => self.dispatch(MonitorEvent::ModelLoaded),
            Err(e) => self.dispatch(MonitorEvent::SetupFailed(e)),
        };
    }

    fn dispatch(&mut self, event: MonitorEvent) -> Option<MonitorState> {
        let name = event.name();
        let now = self.now_ms();
        match self.monitor.handle(event, now) {
            Ok(state) => {
                debug!(event = name, state = %state, now_ms = now, "Event handled");
                Some(state)
            }
            Err(e) => {
                warn!(event = name, error = %e, "Event rejected");
                None
            }
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::upload_channel;
    use crate::config::MonitorConfig;
    use crate::error::CapabilityError;
    use crate::headless::HeadlessProviders;
    use crate::telemetry::TelemetryEmitter;
    use proctor_types::SessionIds;

    fn runtime(providers: &HeadlessProviders) -> (MonitorRuntime, MonitorHandle, crate::capture::UploadReceiver) {
        let mut config = MonitorConfig::default();
        config.idle.timeout_secs = 3_600;
        let ids = SessionIds::for_attempt("quiz", "alice");
        let (telemetry, _events) = TelemetryEmitter::channel(ids.attempt_id.clone());
        let (tx, rx) = upload_channel();
        let monitor =
            ConditionMonitor::new(ids, config, providers.capabilities(), telemetry, tx).unwrap();
        let (runtime, handle) = MonitorRuntime::new(monitor);
        (runtime, handle, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_until_submitted() {
        let providers = HeadlessProviders::new();
        let (runtime, handle, _uploads) = runtime(&providers);
        let task = tokio::spawn(runtime.run());

        handle.start().unwrap();
        time::sleep(Duration::from_secs(125)).await;
        handle.submit().unwrap();

        let outcome = task.await.unwrap();
        assert_eq!(outcome.state, MonitorState::Completed);
        assert_eq!(outcome.capture_attempts, 3);
        assert_eq!(providers.force_submit.calls(), 0);
        assert!(providers.camera.is_released());
    }

    #[tokio::test(start_paused = true)]
    async fn fullscreen_denial_ends_session() {
        let providers = HeadlessProviders::new();
        providers
            .fullscreen
            .deny(CapabilityError::FullscreenDenied("user gesture required".into()));
        let (runtime, handle, _uploads) = runtime(&providers);
        let task = tokio::spawn(runtime.run());

        handle.start().unwrap();
        let outcome = task.await.unwrap();
        assert_eq!(outcome.state, MonitorState::CriticalError);
        assert!(outcome
            .message
            .unwrap_or_default()
            .contains("Fullscreen request denied"));
        assert_eq!(providers.force_submit.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handles_stop_the_driver() {
        let providers = HeadlessProviders::new();
        let (runtime, handle, _uploads) = runtime(&providers);
        drop(handle);
        let outcome = runtime.run().await;
        assert_eq!(outcome.state, MonitorState::AwaitingStart);
    }
}
