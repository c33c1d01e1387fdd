//! In-memory evidence store.
//!
//! Holds captured frames per attempt and authorizes every upload against the
//! attempt's registered owner. The identity the client asserts in the session
//! ids is never trusted on its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use proctor_types::{AttemptId, SessionIds, SubjectId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{EvidenceError, EvidenceResult};

/// Metadata for one stored frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub path: String,
    pub attempt_id: AttemptId,
    pub subject_id: SubjectId,
    /// SHA-256 of the image bytes, lowercase hex.
    pub digest: String,
    pub size: usize,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredFrame {
    record: EvidenceRecord,
    bytes: Vec<u8>,
}

fn digest_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Evidence store shared across upload handlers.
#[derive(Debug, Clone, Default)]
pub struct EvidenceStore {
    /// Registered owner of each attempt.
    owners: Arc<DashMap<AttemptId, SubjectId>>,

    /// Frames by storage path.
    frames: Arc<DashMap<String, StoredFrame>>,

    /// Paths in upload order, per attempt.
    by_attempt: Arc<DashMap<AttemptId, Vec<String>>>,
}

impl EvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record which subject owns an attempt. Called when the attempt starts.
    pub fn register_attempt(&self, attempt_id: AttemptId, subject_id: SubjectId) {
        debug!(attempt_id = %attempt_id, subject_id = %subject_id, "Attempt registered");
        self.owners.insert(attempt_id, subject_id);
    }

    /// Store a frame uploaded by the authenticated `principal`.
    pub fn upload(
        &self,
        principal: &SubjectId,
        ids: &SessionIds,
        image_bytes: &[u8],
    ) -> EvidenceResult<EvidenceRecord> {
        if image_bytes.is_empty() {
            return Err(EvidenceError::EmptyFrame);
        }
        if principal != &ids.subject_id {
            warn!(
                principal = %principal,
                claimed = %ids.subject_id,
                "Evidence upload identity mismatch"
            );
            return Err(EvidenceError::Unauthorized {
                principal: principal.clone(),
                claimed: ids.subject_id.clone(),
            });
        }

        let owner = self
            .owners
            .get(&ids.attempt_id)
            .map(|o| o.value().clone())
            .ok_or_else(|| EvidenceError::UnknownAttempt(ids.attempt_id.clone()))?;
        if &owner != principal {
            warn!(
                principal = %principal,
                owner = %owner,
                attempt_id = %ids.attempt_id,
                "Evidence upload for attempt owned by another subject"
            );
            return Err(EvidenceError::Unauthorized {
                principal: principal.clone(),
                claimed: owner,
            });
        }

        let mut paths = self.by_attempt.entry(ids.attempt_id.clone()).or_default();
        let path = format!(
            "{}/{}/{:05}.jpg",
            ids.assessment_id.as_str(),
            ids.attempt_id.as_uuid(),
            paths.len()
        );
        let record = EvidenceRecord {
            path: path.clone(),
            attempt_id: ids.attempt_id.clone(),
            subject_id: principal.clone(),
            digest: digest_hex(image_bytes),
            size: image_bytes.len(),
            stored_at: Utc::now(),
        };
        self.frames.insert(
            path.clone(),
            StoredFrame {
                record: record.clone(),
                bytes: image_bytes.to_vec(),
            },
        );
        paths.push(path);

        debug!(attempt_id = %ids.attempt_id, path = %record.path, size = record.size, "Evidence stored");
        Ok(record)
    }

    /// Read stored bytes back, verifying their digest.
    pub fn read(&self, path: &str) -> EvidenceResult<Vec<u8>> {
        let frame = self
            .frames
            .get(path)
            .ok_or_else(|| EvidenceError::NotFound(path.to_string()))?;
        if digest_hex(&frame.bytes) != frame.record.digest {
            return Err(EvidenceError::Corrupted(path.to_string()));
        }
        Ok(frame.bytes.clone())
    }

    pub fn record(&self, path: &str) -> Option<EvidenceRecord> {
        self.frames.get(path).map(|f| f.record.clone())
    }

    /// Records for an attempt in upload order.
    pub fn list(&self, attempt_id: &AttemptId) -> Vec<EvidenceRecord> {
        self.by_attempt
            .get(attempt_id)
            .map(|paths| paths.iter().filter_map(|p| self.record(p)).collect())
            .unwrap_or_default()
    }

    /// Total number of stored frames.
    pub fn total_count(&self) -> usize {
        self.frames.len()
    }
}
