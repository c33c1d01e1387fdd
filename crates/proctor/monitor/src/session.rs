//! Per-attempt session record.

use proctor_types::{ConditionSnapshot, MonitorState, SessionIds};
use serde::{Deserialize, Serialize};

/// Everything the monitor knows about one attempt.
///
/// Owned exclusively by [`crate::ConditionMonitor`]; other components read it
/// through the monitor's accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub ids: SessionIds,
    /// Candidate pressed start.
    pub initialized: bool,
    /// Proctoring conditions were met at least once and the session has not ended.
    pub active: bool,
    /// Critical error raised; every later callback is a no-op.
    pub error_triggered: bool,
    pub state: MonitorState,
    pub fullscreen_engaged: bool,
    pub tab_visible: bool,
    pub camera_ready: bool,
    pub model_loaded: bool,
    pub face_count: usize,
    /// Reason shown once the session ended in a critical error.
    pub critical_message: Option<String>,
}

impl Session {
    pub fn new(ids: SessionIds) -> Self {
        Self {
            ids,
            initialized: false,
            active: false,
            error_triggered: false,
            state: MonitorState::Uninitialized,
            fullscreen_engaged: false,
            tab_visible: true,
            camera_ready: false,
            model_loaded: false,
            face_count: 0,
            critical_message: None,
        }
    }

    /// Current condition flags.
    pub fn snapshot(&self) -> ConditionSnapshot {
        ConditionSnapshot {
            fullscreen_engaged: self.fullscreen_engaged,
            tab_visible: self.tab_visible,
            camera_ready: self.camera_ready,
            model_loaded: self.model_loaded,
            face_count: self.face_count,
        }
    }
}
