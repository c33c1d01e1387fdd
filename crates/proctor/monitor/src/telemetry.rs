//! Telemetry emission.
//!
//! The emitter pushes events onto an unbounded channel and returns at once;
//! a forwarder task drains the channel into the external [`TelemetrySink`].
//! Sink failures are logged locally and never reach the state machine.

use async_trait::async_trait;
use proctor_types::{AttemptId, TelemetryEvent, TelemetryEventType};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SinkError;

/// External telemetry sink.
///
/// Implementations assign the event timestamp on receipt.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError>;
}

/// Receiving end of the telemetry channel.
pub type TelemetryReceiver = mpsc::UnboundedReceiver<TelemetryEvent>;

/// Non-blocking telemetry emitter bound to one attempt.
#[derive(Debug, Clone)]
pub struct TelemetryEmitter {
    attempt_id: AttemptId,
    tx: mpsc::UnboundedSender<TelemetryEvent>,
}

impl TelemetryEmitter {
    /// Create an emitter and the receiver a forwarder drains.
    pub fn channel(attempt_id: AttemptId) -> (Self, TelemetryReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { attempt_id, tx }, rx)
    }

    /// Emit an event. Never blocks and never fails the caller.
    pub fn emit(&self, event_type: TelemetryEventType, payload: Value) {
        let event = TelemetryEvent::new(self.attempt_id.clone(), event_type, payload);
        if self.tx.send(event).is_err() {
            debug!(
                attempt_id = %self.attempt_id,
                event_type = %event_type,
                "Telemetry receiver dropped; event discarded"
            );
        }
    }

    pub fn attempt_id(&self) -> &AttemptId {
        &self.attempt_id
    }
}

/// Drain `rx` into `sink` until every emitter is dropped.
pub fn spawn_telemetry_forwarder<S>(mut rx: TelemetryReceiver, sink: S) -> JoinHandle<u64>
where
    S: TelemetrySink + 'static,
{
    tokio::spawn(async move {
        let mut delivered = 0u64;
        while let Some(event) = rx.recv().await {
            match sink.log_event(&event).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    attempt_id = %event.attempt_id,
                    event_type = %event.event_type,
                    error = %e,
                    "Telemetry sink failed"
                ),
            }
        }
        delivered
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FlakySink {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TelemetrySink for FlakySink {
        async fn log_event(&self, _event: &TelemetryEvent) -> Result<(), SinkError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                Ok(())
            } else {
                Err(SinkError::Unavailable("503".into()))
            }
        }
    }

    #[test]
    fn emit_after_receiver_dropped_is_silent() {
        let (emitter, rx) = TelemetryEmitter::channel(AttemptId::generate());
        drop(rx);
        emitter.emit(TelemetryEventType::GraceTick, json!({ "remaining_secs": 3 }));
    }

    #[tokio::test]
    async fn forwarder_swallows_sink_failures() {
        let (emitter, rx) = TelemetryEmitter::channel(AttemptId::generate());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = spawn_telemetry_forwarder(
            rx,
            FlakySink {
                calls: calls.clone(),
            },
        );

        for i in 0..4 {
            emitter.emit(TelemetryEventType::GraceTick, json!({ "remaining_secs": i }));
        }
        drop(emitter);

        let delivered = handle.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(delivered, 2);
    }
}
