//! [`EvidenceSink`] backed by an [`EvidenceStore`].

use async_trait::async_trait;
use proctor_monitor::{EvidenceSink, UploadReceipt};
use proctor_types::{SessionIds, SubjectId};
use tracing::warn;

use crate::store::EvidenceStore;

/// Uploads frames on behalf of an authenticated subject.
///
/// `principal` comes from the server's authentication layer, not from the
/// session ids the client sends along with each frame.
#[derive(Debug, Clone)]
pub struct StoreUploader {
    store: EvidenceStore,
    principal: SubjectId,
}

impl StoreUploader {
    pub fn new(store: EvidenceStore, principal: SubjectId) -> Self {
        Self { store, principal }
    }

    pub fn store(&self) -> &EvidenceStore {
        &self.store
    }
}

#[async_trait]
impl EvidenceSink for StoreUploader {
    async fn upload_frame(&self, ids: &SessionIds, image_bytes: &[u8]) -> UploadReceipt {
        match self.store.upload(&self.principal, ids, image_bytes) {
            Ok(record) => UploadReceipt::stored(record.path),
            Err(e) => {
                warn!(attempt_id = %ids.attempt_id, error = %e, "Evidence upload rejected");
                UploadReceipt::rejected(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_monitor::{spawn_upload_forwarder, upload_channel, FrameUpload, TelemetryEmitter};
    use proctor_types::{CapturedFrame, TelemetryEventType};
    use std::sync::Arc;

    #[tokio::test]
    async fn forwarded_frames_land_in_store() {
        let store = EvidenceStore::new();
        let ids = SessionIds::for_attempt("final-exam", "alice");
        store.register_attempt(ids.attempt_id.clone(), ids.subject_id.clone());
        let uploader = StoreUploader::new(store.clone(), ids.subject_id.clone());

        let (telemetry, mut events) = TelemetryEmitter::channel(ids.attempt_id.clone());
        let (tx, rx) = upload_channel();
        let handle = spawn_upload_forwarder(rx, Arc::new(uploader), telemetry);

        for i in 0..3u8 {
            tx.send(FrameUpload {
                ids: ids.clone(),
                frame: CapturedFrame::new(vec![0xFF, 0xD8, i], u64::from(i) * 60_000),
            })
            .unwrap();
        }
        drop(tx);

        assert_eq!(handle.await.unwrap(), 3);
        let records = store.list(&ids.attempt_id);
        assert_eq!(records.len(), 3);
        assert_eq!(store.read(&records[2].path).unwrap(), vec![0xFF, 0xD8, 2]);
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn rejected_upload_reports_failure() {
        let store = EvidenceStore::new();
        let ids = SessionIds::for_attempt("final-exam", "alice");
        store.register_attempt(ids.attempt_id.clone(), ids.subject_id.clone());
        let uploader = StoreUploader::new(store.clone(), SubjectId::new("mallory"));

        let (telemetry, mut events) = TelemetryEmitter::channel(ids.attempt_id.clone());
        let (tx, rx) = upload_channel();
        let handle = spawn_upload_forwarder(rx, Arc::new(uploader), telemetry);
        tx.send(FrameUpload {
            ids: ids.clone(),
            frame: CapturedFrame::new(vec![1], 0),
        })
        .unwrap();
        drop(tx);

        assert_eq!(handle.await.unwrap(), 0);
        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type, TelemetryEventType::PhotoUploadFailed);
        assert_eq!(store.total_count(), 0);
    }
}
