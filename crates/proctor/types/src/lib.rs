#![deny(unsafe_code)]
//! # proctor-types
//!
//! Shared data model for the exam-integrity monitor.
//!
//! These types carry no behaviour beyond classification helpers; the state
//! machine, timers and providers live in `proctor-monitor`.

pub mod condition;
pub mod face;
pub mod frame;
pub mod ids;
pub mod state;
pub mod telemetry;
pub mod violation;

pub use condition::ConditionSnapshot;
pub use face::{BoundingBox, FaceDetection, FaceLandmarks, FacePresence, Point};
pub use frame::{CapturedFrame, VideoFrame, VideoState};
pub use ids::{AssessmentId, AttemptId, SessionIds, SubjectId};
pub use state::MonitorState;
pub use telemetry::{TelemetryEvent, TelemetryEventType};
pub use violation::{ClipboardAction, GraceChannel, ViolationKind};
