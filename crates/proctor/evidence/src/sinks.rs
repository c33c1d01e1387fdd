//! Telemetry sinks.
//!
//! The sink, not the client, stamps each event with its receipt time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proctor_monitor::{SinkError, TelemetrySink};
use proctor_types::{AttemptId, TelemetryEvent, TelemetryEventType};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// A telemetry event as received by a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub event: TelemetryEvent,
    pub received_at: DateTime<Utc>,
}

/// Append-only in-memory sink.
#[derive(Debug, Clone, Default)]
pub struct MemoryTelemetrySink {
    records: Arc<RwLock<Vec<TelemetryRecord>>>,
}

impl MemoryTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<TelemetryRecord> {
        self.records.read().await.clone()
    }

    pub async fn for_attempt(&self, attempt_id: &AttemptId) -> Vec<TelemetryRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| &r.event.attempt_id == attempt_id)
            .cloned()
            .collect()
    }

    pub async fn count(&self, event_type: TelemetryEventType) -> usize {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.event.event_type == event_type)
            .count()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TelemetrySink for MemoryTelemetrySink {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        self.records.write().await.push(TelemetryRecord {
            event: event.clone(),
            received_at: Utc::now(),
        });
        Ok(())
    }
}

/// Writes telemetry to the local `tracing` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

#[async_trait]
impl TelemetrySink for TracingTelemetrySink {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        info!(
            target: "proctor::telemetry",
            attempt_id = %event.attempt_id,
            event_type = %event.event_type,
            payload = %event.payload,
            "telemetry"
        );
        Ok(())
    }
}
