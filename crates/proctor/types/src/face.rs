//! Face-detection output as returned by the inference capability.

use serde::{Deserialize, Serialize};

/// A point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned face bounding box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Optional facial landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub nose_tip: Point,
    #[serde(default)]
    pub left_eye: Option<Point>,
    #[serde(default)]
    pub right_eye: Option<Point>,
}

/// One face found in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub landmarks: Option<FaceLandmarks>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl FaceDetection {
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            landmarks: None,
            score: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    /// Horizontal distance between the nose tip and the box center, if landmarks exist.
    pub fn horizontal_offset(&self) -> Option<f64> {
        self.landmarks
            .map(|l| (l.nose_tip.x - self.bounding_box.center().x).abs())
    }
}

/// Frame classification by face count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacePresence {
    NoFace,
    OneFace,
    MultipleFaces,
}

impl FacePresence {
    pub fn classify(count: usize) -> Self {
        match count {
            0 => FacePresence::NoFace,
            1 => FacePresence::OneFace,
            _ => FacePresence::MultipleFaces,
        }
    }
}
