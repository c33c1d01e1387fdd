//! Strongly-typed identifiers for an assessment attempt.
//!
//! Attempt IDs are UUID-based; assessment and subject IDs are issued by the
//! surrounding platform and kept as opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of the assessment (quiz) being taken
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(String);

impl AssessmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "assessment:{}", self.0)
    }
}

/// Identifier of a single attempt at an assessment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt:{}", self.0)
    }
}

/// Identifier of the candidate taking the attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subject:{}", self.0)
    }
}

/// The identifiers that tie monitor output to one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIds {
    pub assessment_id: AssessmentId,
    pub attempt_id: AttemptId,
    pub subject_id: SubjectId,
}

impl SessionIds {
    pub fn new(assessment_id: AssessmentId, attempt_id: AttemptId, subject_id: SubjectId) -> Self {
        Self {
            assessment_id,
            attempt_id,
            subject_id,
        }
    }

    /// Fresh attempt for the given assessment and subject.
    pub fn for_attempt(assessment: impl Into<String>, subject: impl Into<String>) -> Self {
        Self::new(
            AssessmentId::new(assessment),
            AttemptId::generate(),
            SubjectId::new(subject),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_id_generation() {
        let id1 = AttemptId::generate();
        let id2 = AttemptId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_display_prefixes() {
        let ids = SessionIds::for_attempt("quiz-42", "alice");
        assert_eq!(ids.assessment_id.to_string(), "assessment:quiz-42");
        assert_eq!(ids.subject_id.to_string(), "subject:alice");
        assert!(ids.attempt_id.to_string().starts_with("attempt:"));
    }
}
