//! Violation kinds and the grace channels they are tracked on.

use serde::{Deserialize, Serialize};

/// A kind of environmental violation the monitor can detect.
///
/// Variants are declared in precedence order: when several conditions fail
/// at once, the first one listed decides the session's grace reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Candidate left fullscreen mode.
    FullscreenExit,
    /// Exam tab lost visibility.
    TabSwitch,
    /// Camera stream or face model stopped being available.
    CameraUnavailable,
    /// No face in the camera frame.
    NoFace,
    /// More than one face in the camera frame.
    MultipleFaces,
    /// No mouse or keyboard activity for the idle window.
    Idle,
    /// Copy, cut, paste or context-menu attempt.
    ClipboardAttempt,
    /// Camera feed is blank, paused or frozen.
    WebcamTamper,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 8] = [
        ViolationKind::FullscreenExit,
        ViolationKind::TabSwitch,
        ViolationKind::CameraUnavailable,
        ViolationKind::NoFace,
        ViolationKind::MultipleFaces,
        ViolationKind::Idle,
        ViolationKind::ClipboardAttempt,
        ViolationKind::WebcamTamper,
    ];

    /// Precedence rank; lower wins.
    ///
    /// The two face anomalies share a rank since they are mutually exclusive.
    pub fn precedence(&self) -> u8 {
        match self {
            ViolationKind::FullscreenExit => 0,
            ViolationKind::TabSwitch => 1,
            ViolationKind::CameraUnavailable => 2,
            ViolationKind::NoFace | ViolationKind::MultipleFaces => 3,
            ViolationKind::Idle => 4,
            ViolationKind::ClipboardAttempt => 5,
            ViolationKind::WebcamTamper => 6,
        }
    }

    /// Grace channel this kind is tracked on.
    pub fn channel(&self) -> GraceChannel {
        match self {
            ViolationKind::FullscreenExit => GraceChannel::Fullscreen,
            ViolationKind::TabSwitch => GraceChannel::Visibility,
            ViolationKind::CameraUnavailable | ViolationKind::WebcamTamper => GraceChannel::Stream,
            ViolationKind::NoFace | ViolationKind::MultipleFaces => GraceChannel::Face,
            ViolationKind::Idle => GraceChannel::Idle,
            ViolationKind::ClipboardAttempt => GraceChannel::Clipboard,
        }
    }

    /// Human-readable reason shown to the candidate and used in expiry messages.
    pub fn reason(&self) -> &'static str {
        match self {
            ViolationKind::FullscreenExit => "Fullscreen mode was exited.",
            ViolationKind::TabSwitch => "Exam tab is not visible.",
            ViolationKind::CameraUnavailable => "Camera stream unavailable.",
            ViolationKind::NoFace => "No face detected in camera feed.",
            ViolationKind::MultipleFaces => "More than one face detected in camera feed.",
            ViolationKind::Idle => "No activity detected.",
            ViolationKind::ClipboardAttempt => "Copy and paste are not allowed.",
            ViolationKind::WebcamTamper => "Webcam feed appears to be tampered with.",
        }
    }

    /// Short label used in budget messages.
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::FullscreenExit => "Fullscreen exit",
            ViolationKind::TabSwitch => "Tab switch",
            ViolationKind::CameraUnavailable => "Camera unavailable",
            ViolationKind::NoFace => "No face",
            ViolationKind::MultipleFaces => "Multiple faces",
            ViolationKind::Idle => "Idle",
            ViolationKind::ClipboardAttempt => "Clipboard attempt",
            ViolationKind::WebcamTamper => "Webcam tamper",
        }
    }

    /// Whether occurrences of this kind are counted against a hard budget.
    pub fn is_budgeted(&self) -> bool {
        matches!(
            self,
            ViolationKind::FullscreenExit
                | ViolationKind::TabSwitch
                | ViolationKind::ClipboardAttempt
        )
    }

    /// Whether this kind is re-derived from the environment on every check
    /// rather than raised by a discrete platform event.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            ViolationKind::CameraUnavailable
                | ViolationKind::NoFace
                | ViolationKind::MultipleFaces
                | ViolationKind::Idle
                | ViolationKind::WebcamTamper
        )
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ViolationKind::FullscreenExit => "fullscreen_exit",
            ViolationKind::TabSwitch => "tab_switch",
            ViolationKind::CameraUnavailable => "camera_unavailable",
            ViolationKind::NoFace => "no_face",
            ViolationKind::MultipleFaces => "multiple_faces",
            ViolationKind::Idle => "idle",
            ViolationKind::ClipboardAttempt => "clipboard_attempt",
            ViolationKind::WebcamTamper => "webcam_tamper",
        };
        write!(f, "{}", s)
    }
}

/// Independently tracked condition; each holds at most one grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraceChannel {
    Fullscreen,
    Visibility,
    Stream,
    Face,
    Idle,
    Clipboard,
}

impl std::fmt::Display for GraceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraceChannel::Fullscreen => write!(f, "fullscreen"),
            GraceChannel::Visibility => write!(f, "visibility"),
            GraceChannel::Stream => write!(f, "stream"),
            GraceChannel::Face => write!(f, "face"),
            GraceChannel::Idle => write!(f, "idle"),
            GraceChannel::Clipboard => write!(f, "clipboard"),
        }
    }
}

/// Intercepted clipboard or context-menu gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardAction {
    Copy,
    Cut,
    Paste,
    ContextMenu,
}

impl std::fmt::Display for ClipboardAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardAction::Copy => write!(f, "copy"),
            ClipboardAction::Cut => write!(f, "cut"),
            ClipboardAction::Paste => write!(f, "paste"),
            ClipboardAction::ContextMenu => write!(f, "context_menu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_follows_declaration_order() {
        let ranks: Vec<u8> = ViolationKind::ALL.iter().map(|k| k.precedence()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn only_repeat_offenses_are_budgeted() {
        let budgeted: Vec<_> = ViolationKind::ALL
            .iter()
            .filter(|k| k.is_budgeted())
            .copied()
            .collect();
        assert_eq!(
            budgeted,
            vec![
                ViolationKind::FullscreenExit,
                ViolationKind::TabSwitch,
                ViolationKind::ClipboardAttempt
            ]
        );
        assert!(ViolationKind::ALL
            .iter()
            .all(|k| k.is_budgeted() != k.is_continuous()));
    }

    #[test]
    fn face_anomalies_share_a_channel() {
        assert_eq!(ViolationKind::NoFace.channel(), GraceChannel::Face);
        assert_eq!(ViolationKind::MultipleFaces.channel(), GraceChannel::Face);
        assert_eq!(ViolationKind::WebcamTamper.channel(), GraceChannel::Stream);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ViolationKind::FullscreenExit).unwrap();
        assert_eq!(json, "\"fullscreen_exit\"");
        assert_eq!(ViolationKind::TabSwitch.to_string(), "tab_switch");
    }
}
