//! Lifecycle states of the condition monitor.

use serde::{Deserialize, Serialize};

use crate::violation::ViolationKind;

/// State of one monitored attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MonitorState {
    /// Monitor not yet wired to its providers.
    Uninitialized,
    /// Providers wired; waiting for the candidate to start.
    AwaitingStart,
    /// Camera, fullscreen and face model being brought up.
    Initializing,
    /// Every invariant holds.
    Active,
    /// At least one violation is counting down; `kind` is the highest-precedence one.
    GracePeriod { kind: ViolationKind },
    /// Unrecoverable violation; attempt force-submitted.
    CriticalError,
    /// Attempt submitted normally.
    Completed,
}

impl MonitorState {
    /// No further events are processed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MonitorState::CriticalError | MonitorState::Completed)
    }

    /// Proctoring is running (detection loop and condition checks live).
    pub fn is_monitoring(&self) -> bool {
        matches!(self, MonitorState::Active | MonitorState::GracePeriod { .. })
    }
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorState::Uninitialized => write!(f, "uninitialized"),
            MonitorState::AwaitingStart => write!(f, "awaiting_start"),
            MonitorState::Initializing => write!(f, "initializing"),
            MonitorState::Active => write!(f, "active"),
            MonitorState::GracePeriod { kind } => write!(f, "grace_period({})", kind),
            MonitorState::CriticalError => write!(f, "critical_error"),
            MonitorState::Completed => write!(f, "completed"),
        }
    }
}
