//! # Proctor Evidence - Server-Side Evidence and Telemetry Sinks
//!
//! The receiving side of a monitored attempt: captured frames are stored per
//! attempt and telemetry events are recorded with a server-assigned
//! timestamp.
//!
//! ## Key Components
//!
//! - [`EvidenceStore`]: Per-attempt frame storage with owner checks and
//!   SHA-256 integrity digests
//! - [`StoreUploader`]: [`EvidenceSink`](proctor_monitor::EvidenceSink) that
//!   uploads as an authenticated subject
//! - [`MemoryTelemetrySink`]: In-memory telemetry log
//! - [`TracingTelemetrySink`]: Telemetry written to `tracing`
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use proctor_evidence::{EvidenceStore, MemoryTelemetrySink, StoreUploader};
//! use proctor_monitor::{
//!     spawn_telemetry_forwarder, spawn_upload_forwarder, upload_channel, TelemetryEmitter,
//! };
//! use proctor_types::SessionIds;
//!
//! # async fn example() {
//! let ids = SessionIds::for_attempt("midterm", "alice");
//! let store = EvidenceStore::new();
//! store.register_attempt(ids.attempt_id.clone(), ids.subject_id.clone());
//!
//! let (telemetry, events) = TelemetryEmitter::channel(ids.attempt_id.clone());
//! let (uploads, frames) = upload_channel();
//! let sink = MemoryTelemetrySink::new();
//!
//! let _telemetry_task = spawn_telemetry_forwarder(events, sink.clone());
//! let _upload_task = spawn_upload_forwarder(
//!     frames,
//!     Arc::new(StoreUploader::new(store.clone(), ids.subject_id.clone())),
//!     telemetry.clone(),
//! );
//! // hand `telemetry` and `uploads` to a ConditionMonitor ...
//! # drop(uploads);
//! # }
//! ```

pub mod error;
pub mod sinks;
pub mod store;
pub mod uploader;

// Re-export main types
pub use error::{EvidenceError, EvidenceResult};
pub use sinks::{MemoryTelemetrySink, TelemetryRecord, TracingTelemetrySink};
pub use store::{EvidenceRecord, EvidenceStore};
pub use uploader::StoreUploader;
