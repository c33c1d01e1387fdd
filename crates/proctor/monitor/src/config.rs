//! Monitor configuration.
//!
//! Policy constants for grace periods, violation budgets, detection
//! thresholds and capture cadence. Every section deserializes with defaults so
//! partial TOML files are accepted.

use proctor_types::ViolationKind;
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// Preset strictness levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrictnessProfile {
    /// Defaults.
    Standard,
    /// High-stakes assessments: shorter windows, smaller budgets.
    Strict,
    /// Practice runs: longer windows, larger budgets.
    Lenient,
}

/// Configuration for the exam-integrity monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub grace: GraceConfig,
    pub escalation: EscalationConfig,
    pub detection: DetectionConfig,
    pub capture: CaptureConfig,
    pub idle: IdleConfig,
    pub audio: AudioConfig,
}

impl MonitorConfig {
    /// Create config for a strictness profile.
    pub fn for_profile(profile: StrictnessProfile) -> Self {
        let mut config = Self::default();

        match profile {
            StrictnessProfile::Standard => {}
            StrictnessProfile::Strict => {
                config.grace.face_secs = 10;
                config.grace.fullscreen_exit_secs = 15;
                config.grace.tab_switch_secs = 5;
                config.escalation.max_fullscreen_exits = 2;
                config.escalation.max_tab_switches = 2;
                config.escalation.max_clipboard_attempts = 1;
                config.capture.interval_secs = 30;
            }
            StrictnessProfile::Lenient => {
                config.grace.face_secs = 30;
                config.grace.fullscreen_exit_secs = 60;
                config.grace.tab_switch_secs = 20;
                config.escalation.max_fullscreen_exits = 5;
                config.escalation.max_tab_switches = 5;
                config.idle.timeout_secs = 300;
            }
        }

        config
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> MonitorResult<()> {
        for kind in ViolationKind::ALL {
            if self.grace.duration_for(kind) == 0 {
                return Err(MonitorError::Configuration(format!(
                    "grace duration for {} must be positive",
                    kind
                )));
            }
        }
        for kind in ViolationKind::ALL.iter().filter(|k| k.is_budgeted()) {
            if self.escalation.max_for(*kind) == Some(0) {
                return Err(MonitorError::Configuration(format!(
                    "violation budget for {} must be positive",
                    kind
                )));
            }
        }
        if self.escalation.anomaly_cycle_limit == Some(0) {
            return Err(MonitorError::Configuration(
                "anomaly cycle limit must be positive when set".into(),
            ));
        }
        if self.capture.interval_secs == 0 {
            return Err(MonitorError::Configuration(
                "photo capture interval must be positive".into(),
            ));
        }
        if self.detection.frame_interval_ms == 0 {
            return Err(MonitorError::Configuration(
                "detection frame interval must be positive".into(),
            ));
        }
        if self.detection.sample_failure_limit == 0 {
            return Err(MonitorError::Configuration(
                "face sample failure limit must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.audio.volume_threshold) {
            return Err(MonitorError::Configuration(
                "audio volume threshold must be within 0.0-1.0".into(),
            ));
        }
        Ok(())
    }
}

/// Grace-period durations per violation kind, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraceConfig {
    /// No-face and multi-face.
    pub face_secs: u32,
    pub idle_secs: u32,
    pub clipboard_secs: u32,
    pub fullscreen_exit_secs: u32,
    pub tab_switch_secs: u32,
    /// Camera unavailable and webcam tamper.
    pub stream_secs: u32,
}

impl Default for GraceConfig {
    fn default() -> Self {
        Self {
            face_secs: 15,
            idle_secs: 15,
            clipboard_secs: 15,
            fullscreen_exit_secs: 30,
            tab_switch_secs: 10,
            stream_secs: 15,
        }
    }
}

impl GraceConfig {
    pub fn duration_for(&self, kind: ViolationKind) -> u32 {
        match kind {
            ViolationKind::FullscreenExit => self.fullscreen_exit_secs,
            ViolationKind::TabSwitch => self.tab_switch_secs,
            ViolationKind::CameraUnavailable | ViolationKind::WebcamTamper => self.stream_secs,
            ViolationKind::NoFace | ViolationKind::MultipleFaces => self.face_secs,
            ViolationKind::Idle => self.idle_secs,
            ViolationKind::ClipboardAttempt => self.clipboard_secs,
        }
    }
}

/// Violation budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub max_fullscreen_exits: u32,
    pub max_tab_switches: u32,
    pub max_clipboard_attempts: u32,
    /// Optional cap on grace periods opened per face/idle/stream kind.
    /// `None` leaves those anomalies governed by grace periods alone.
    pub anomaly_cycle_limit: Option<u32>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            max_fullscreen_exits: 3,
            max_tab_switches: 3,
            max_clipboard_attempts: 3,
            anomaly_cycle_limit: None,
        }
    }
}

impl EscalationConfig {
    /// Budget for a kind, `None` for kinds without a hard maximum.
    pub fn max_for(&self, kind: ViolationKind) -> Option<u32> {
        match kind {
            ViolationKind::FullscreenExit => Some(self.max_fullscreen_exits),
            ViolationKind::TabSwitch => Some(self.max_tab_switches),
            ViolationKind::ClipboardAttempt => Some(self.max_clipboard_attempts),
            _ => None,
        }
    }
}

/// Face-detection and camera-liveness settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detection loop cadence when driven by the async runtime.
    pub frame_interval_ms: u64,
    /// Nose-to-box-center offset that counts as looking away, in pixels.
    pub head_pose_offset_px: f64,
    /// Playback may stall this long before the feed counts as tampered.
    pub inactivity_window_ms: u64,
    /// Consecutive ticks without a usable face estimate before the frame is
    /// treated as empty.
    pub sample_failure_limit: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 100,
            head_pose_offset_px: 40.0,
            inactivity_window_ms: 5_000,
            sample_failure_limit: 10,
        }
    }
}

/// Periodic evidence capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub interval_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Inactivity detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub timeout_secs: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Microphone volume anomaly detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Normalized level (0.0-1.0) above which a sample is anomalous.
    pub volume_threshold: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume_threshold: 0.3,
        }
    }
}
