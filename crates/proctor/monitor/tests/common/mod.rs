//! Shared harness: a monitor wired to headless providers on a virtual clock.

#![allow(dead_code)]

use proctor_monitor::headless::HeadlessProviders;
use proctor_monitor::{
    upload_channel, ConditionMonitor, MonitorConfig, MonitorEvent, TelemetryEmitter,
    TelemetryReceiver, UploadReceiver,
};
use proctor_types::{MonitorState, SessionIds, TelemetryEvent, TelemetryEventType};

pub struct Harness {
    pub monitor: ConditionMonitor,
    pub providers: HeadlessProviders,
    pub events: TelemetryReceiver,
    pub uploads: UploadReceiver,
    pub log: Vec<TelemetryEvent>,
}

impl Harness {
    pub fn new(config: MonitorConfig) -> Self {
        let providers = HeadlessProviders::new();
        let ids = SessionIds::for_attempt("final-exam", "candidate-7");
        let (telemetry, events) = TelemetryEmitter::channel(ids.attempt_id.clone());
        let (uploads_tx, uploads) = upload_channel();
        let monitor = ConditionMonitor::new(ids, config, providers.capabilities(), telemetry, uploads_tx)
            .expect("valid config");
        Self {
            monitor,
            providers,
            events,
            uploads,
            log: Vec::new(),
        }
    }

    pub fn send(&mut self, event: MonitorEvent, at_ms: u64) -> MonitorState {
        self.monitor.handle(event, at_ms).expect("event accepted")
    }

    /// Start and bring every setup signal up at t=0.
    pub fn activate(&mut self) {
        self.send(MonitorEvent::Start, 0);
        self.send(MonitorEvent::CameraReady, 0);
        self.send(MonitorEvent::FullscreenChanged { engaged: true }, 0);
        self.send(MonitorEvent::ModelLoaded, 0);
        assert_eq!(self.monitor.state(), MonitorState::Active);
    }

    /// Drive the detection loop every 100ms over `(from_ms, to_ms]`, with
    /// user activity so the idle monitor stays quiet.
    pub fn run(&mut self, from_ms: u64, to_ms: u64) {
        let mut t = from_ms + 100;
        while t <= to_ms {
            self.send(MonitorEvent::UserActivity, t);
            self.send(MonitorEvent::FrameTick, t);
            t += 100;
        }
    }

    pub fn drain(&mut self) -> &[TelemetryEvent] {
        while let Ok(event) = self.events.try_recv() {
            self.log.push(event);
        }
        &self.log
    }

    pub fn count(&mut self, event_type: TelemetryEventType) -> usize {
        self.drain()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn uploads_queued(&mut self) -> usize {
        let mut n = 0;
        while self.uploads.try_recv().is_ok() {
            n += 1;
        }
        n
    }
}
