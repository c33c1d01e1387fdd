//! Point-in-time read of the environment invariants.

use serde::{Deserialize, Serialize};

use crate::violation::ViolationKind;

/// Aggregated, instantaneous read of every environment invariant.
///
/// Recomputed on each relevant event and never stored as history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionSnapshot {
    pub fullscreen_engaged: bool,
    pub tab_visible: bool,
    pub camera_ready: bool,
    pub model_loaded: bool,
    pub face_count: usize,
}

impl ConditionSnapshot {
    /// Camera flowing, fullscreen engaged and face model loaded.
    pub fn readiness_met(&self) -> bool {
        self.camera_ready && self.fullscreen_engaged && self.model_loaded
    }

    /// Every snapshot-level invariant holds.
    pub fn is_satisfied(&self) -> bool {
        self.first_failing().is_none()
    }

    /// First failing snapshot condition in precedence order.
    pub fn first_failing(&self) -> Option<ViolationKind> {
        self.failing().into_iter().next()
    }

    /// All failing snapshot conditions, highest precedence first.
    pub fn failing(&self) -> Vec<ViolationKind> {
        let mut failing = Vec::new();
        if !self.fullscreen_engaged {
            failing.push(ViolationKind::FullscreenExit);
        }
        if !self.tab_visible {
            failing.push(ViolationKind::TabSwitch);
        }
        if !(self.camera_ready && self.model_loaded) {
            failing.push(ViolationKind::CameraUnavailable);
        }
        match self.face_count {
            0 => failing.push(ViolationKind::NoFace),
            1 => {}
            _ => failing.push(ViolationKind::MultipleFaces),
        }
        failing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfied() -> ConditionSnapshot {
        ConditionSnapshot {
            fullscreen_engaged: true,
            tab_visible: true,
            camera_ready: true,
            model_loaded: true,
            face_count: 1,
        }
    }

    #[test]
    fn all_conditions_hold() {
        assert!(satisfied().is_satisfied());
        assert!(satisfied().readiness_met());
    }

    #[test]
    fn fullscreen_loss_outranks_face_anomaly() {
        let snapshot = ConditionSnapshot {
            fullscreen_engaged: false,
            face_count: 2,
            ..satisfied()
        };
        assert_eq!(snapshot.first_failing(), Some(ViolationKind::FullscreenExit));
        assert_eq!(
            snapshot.failing(),
            vec![ViolationKind::FullscreenExit, ViolationKind::MultipleFaces]
        );
    }

    #[test]
    fn readiness_ignores_tab_and_faces() {
        let snapshot = ConditionSnapshot {
            tab_visible: false,
            face_count: 0,
            ..satisfied()
        };
        assert!(snapshot.readiness_met());
        assert!(!snapshot.is_satisfied());
    }

    #[test]
    fn model_not_loaded_counts_as_camera_unavailable() {
        let snapshot = ConditionSnapshot {
            model_loaded: false,
            ..satisfied()
        };
        assert_eq!(snapshot.first_failing(), Some(ViolationKind::CameraUnavailable));
    }
}
