//! Keypoint and pose types shared by detectors, the overlay and the physics bridge.
//!
//! Two keypoint layouts are in use:
//! - COCO-17 (MoveNet, PoseNet)
//! - BlazePose-33 (BlazePose)
//!
//! Coordinates are in frame pixels, origin top-left.

use serde::{Deserialize, Serialize};

// ============================================================================
// LAYOUTS
// ============================================================================

const COCO_NAMES: [&str; 17] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

const BLAZEPOSE_NAMES: [&str; 33] = [
    "nose",
    "left_eye_inner",
    "left_eye",
    "left_eye_outer",
    "right_eye_inner",
    "right_eye",
    "right_eye_outer",
    "left_ear",
    "right_ear",
    "mouth_left",
    "mouth_right",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_pinky",
    "right_pinky",
    "left_index",
    "right_index",
    "left_thumb",
    "right_thumb",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
    "left_heel",
    "right_heel",
    "left_foot_index",
    "right_foot_index",
];

/// Skeleton connections (pairs of keypoint indices)
const COCO_PAIRS: [(usize, usize); 16] = [
    (0, 1), (0, 2), (1, 3), (2, 4), (5, 6), (5, 7), (5, 11), (6, 8),
    (6, 12), (7, 9), (8, 10), (11, 12), (11, 13), (12, 14), (13, 15), (14, 16),
];

const BLAZEPOSE_PAIRS: [(usize, usize); 35] = [
    (0, 1), (0, 4), (1, 2), (2, 3), (3, 7), (4, 5), (5, 6), (6, 8), (9, 10),
    (11, 12), (11, 13), (11, 23), (12, 14), (14, 16), (12, 24), (13, 15), (15, 17),
    (16, 18), (16, 20), (15, 19), (15, 21), (16, 22), (17, 19), (18, 20), (23, 25),
    (23, 24), (24, 26), (25, 27), (26, 28), (27, 29), (28, 30), (27, 31), (28, 32),
    (29, 31), (30, 32),
];

/// Body side of a keypoint, used for overlay colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Middle,
    Left,
    Right,
}

/// Keypoint layout produced by a model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeypointLayout {
    #[default]
    Coco17,
    BlazePose33,
}

impl KeypointLayout {
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            KeypointLayout::Coco17 => &COCO_NAMES,
            KeypointLayout::BlazePose33 => &BLAZEPOSE_NAMES,
        }
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    /// Adjacent keypoint pairs forming the skeleton
    pub fn adjacent_pairs(&self) -> &'static [(usize, usize)] {
        match self {
            KeypointLayout::Coco17 => &COCO_PAIRS,
            KeypointLayout::BlazePose33 => &BLAZEPOSE_PAIRS,
        }
    }

    /// Index of the right wrist (the keypoint that drives the attractor)
    pub fn right_wrist(&self) -> usize {
        match self {
            KeypointLayout::Coco17 => 10,
            KeypointLayout::BlazePose33 => 16,
        }
    }

    /// Side classification derived from the keypoint name
    pub fn side(&self, index: usize) -> Side {
        match self.names().get(index) {
            Some(name) if name.starts_with("left") || name.ends_with("_left") => Side::Left,
            Some(name) if name.starts_with("right") || name.ends_with("_right") => Side::Right,
            _ => Side::Middle,
        }
    }
}

// ============================================================================
// POSE DATA
// ============================================================================

/// A detected landmark. `score` is absent for models that don't report one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, score: Option<f32>) -> Self {
        Self {
            x,
            y,
            score,
            ..Default::default()
        }
    }

    /// Score with a missing value treated as full confidence
    pub fn confidence(&self) -> f32 {
        self.score.unwrap_or(1.0)
    }
}

/// One detected person
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Tracking id (multi-pose with tracking enabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            keypoints,
            score: None,
            id: None,
        }
    }

    pub fn keypoint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    /// Scale all coordinates (used when a source was captured at another size)
    pub fn scale(&mut self, sx: f32, sy: f32) {
        for kp in &mut self.keypoints {
            kp.x *= sx;
            kp.y *= sy;
        }
    }
}
