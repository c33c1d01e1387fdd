//! Per-tick detectors feeding the condition monitor.
//!
//! Each detector is a small stateful classifier; none of them touch timers or
//! telemetry. The monitor decides what a detection means for the session.

mod audio;
mod face;
mod idle;
mod liveness;

pub use audio::{AudioAnomaly, AudioMonitor};
pub use face::{FaceAnalysis, FacePresenceDetector, HeadPoseAnomaly};
pub use idle::IdleMonitor;
pub use liveness::{LivenessMonitor, TamperSignal};
