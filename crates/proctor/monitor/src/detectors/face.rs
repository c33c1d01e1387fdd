use proctor_types::{FaceDetection, FacePresence};
use serde::{Deserialize, Serialize};

/// Head turned away from the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadPoseAnomaly {
    pub offset_px: f64,
    pub threshold_px: f64,
}

/// Classification of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceAnalysis {
    pub presence: FacePresence,
    pub face_count: usize,
    /// Set on the first frame of a look-away episode only.
    pub head_pose: Option<HeadPoseAnomaly>,
}

/// Classifies inference output and derives the head-pose signal.
#[derive(Debug)]
pub struct FacePresenceDetector {
    threshold_px: f64,
    looking_away: bool,
}

impl FacePresenceDetector {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            looking_away: false,
        }
    }

    pub fn analyze(&mut self, detections: &[FaceDetection]) -> FaceAnalysis {
        let presence = FacePresence::classify(detections.len());

        let offset = match (presence, detections.first()) {
            (FacePresence::OneFace, Some(face)) => face.horizontal_offset(),
            _ => None,
        };

        let head_pose = match offset {
            Some(offset_px) if offset_px > self.threshold_px => {
                let onset = !self.looking_away;
                self.looking_away = true;
                onset.then_some(HeadPoseAnomaly {
                    offset_px,
                    threshold_px: self.threshold_px,
                })
            }
            _ => {
                self.looking_away = false;
                None
            }
        };

        FaceAnalysis {
            presence,
            face_count: detections.len(),
            head_pose,
        }
    }

    pub fn is_looking_away(&self) -> bool {
        self.looking_away
    }
}
