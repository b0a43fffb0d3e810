//! Pose-to-physics bridge.
//!
//! The camera view is mirrored for the user, so keypoints are flipped
//! horizontally before use. The right wrist of the first pose drives the
//! attractor body: when confident enough, the body is translated by the
//! offset to the scaled keypoint. Translation is relative and leaves the
//! body's velocity alone, so the next physics steps still act on it.

use glam::Vec2;
use log::trace;

use crate::physics::{BodyId, World};
use crate::pose::{KeypointLayout, Pose};

/// Reference camera frame size the bridge maps from
pub const REFERENCE_WIDTH: f32 = 640.0;
pub const REFERENCE_HEIGHT: f32 = 480.0;

/// Minimum keypoint score that moves the attractor
pub const SCORE_THRESHOLD: f32 = 0.3;

/// Camera-to-physics scale
pub const PHYSICS_SCALE: f32 = 2.4;

/// Mirror every keypoint horizontally: `x' = width - 1 - x`
pub fn flip_poses_horizontal(poses: &mut [Pose], width: f32) {
    for pose in poses {
        for kp in &mut pose.keypoints {
            kp.x = width - 1.0 - kp.x;
        }
    }
}

/// Maps tracked keypoints onto the attractor body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseBridge {
    pub frame_width: f32,
    pub threshold: f32,
    pub scale: f32,
    pub keypoint_index: usize,
}

impl Default for PoseBridge {
    fn default() -> Self {
        Self::new(KeypointLayout::Coco17)
    }
}

impl PoseBridge {
    /// Bridge following the right wrist of `layout`
    pub fn new(layout: KeypointLayout) -> Self {
        Self {
            frame_width: REFERENCE_WIDTH,
            threshold: SCORE_THRESHOLD,
            scale: PHYSICS_SCALE,
            keypoint_index: layout.right_wrist(),
        }
    }

    /// Follow the right wrist of another layout (model family changed)
    pub fn set_layout(&mut self, layout: KeypointLayout) {
        self.keypoint_index = layout.right_wrist();
    }

    /// Target position in physics space for this frame, if the keypoint qualifies
    pub fn target(&self, poses: &[Pose]) -> Option<Vec2> {
        let mut mirrored = poses.get(..1)?.to_vec();
        flip_poses_horizontal(&mut mirrored, self.frame_width);

        let kp = mirrored[0].keypoint(self.keypoint_index)?;
        let score = kp.confidence();
        if score < self.threshold {
            trace!("Keypoint {} below threshold ({:.2})", self.keypoint_index, score);
            return None;
        }
        Some(Vec2::new(kp.x, kp.y) * self.scale)
    }

    /// Nudge `body` toward the tracked keypoint. Returns true if it moved.
    pub fn apply(&self, poses: &[Pose], world: &mut World, body: BodyId) -> bool {
        let Some(target) = self.target(poses) else {
            return false;
        };
        let Some(current) = world.body(body).map(|b| b.position) else {
            return false;
        };
        world.translate(body, target - current);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Body, Shape};
    use crate::pose::Keypoint;

    fn pose_with_wrist(x: f32, y: f32, score: Option<f32>) -> Pose {
        let mut keypoints = vec![Keypoint::new(0.0, 0.0, Some(1.0)); 17];
        keypoints[10] = Keypoint::new(x, y, score);
        Pose::new(keypoints)
    }

    fn world_with_body(at: Vec2) -> (World, BodyId) {
        let mut world = World::new();
        let id = world.add_body(Body::new("attractor", Shape::Circle { radius: 20.0 }, at).with_static(true));
        (world, id)
    }

    #[test]
    fn test_flip_is_involution() {
        let original = vec![
            pose_with_wrist(12.5, 40.0, Some(0.8)),
            pose_with_wrist(639.0, 1.0, None),
        ];
        let mut poses = original.clone();
        flip_poses_horizontal(&mut poses, 640.0);
        assert_ne!(poses, original);
        assert_eq!(poses[0].keypoints[10].x, 640.0 - 1.0 - 12.5);
        flip_poses_horizontal(&mut poses, 640.0);
        assert_eq!(poses, original);
    }

    #[test]
    fn test_low_score_leaves_body() {
        let start = Vec2::new(100.0, 200.0);
        let (mut world, id) = world_with_body(start);
        let bridge = PoseBridge::default();

        let moved = bridge.apply(&[pose_with_wrist(300.0, 300.0, Some(0.29))], &mut world, id);
        assert!(!moved);
        assert_eq!(world.body(id).unwrap().position, start);
    }

    #[test]
    fn test_confident_keypoint_moves_to_scaled_target() {
        let start = Vec2::new(100.0, 200.0);
        let (mut world, id) = world_with_body(start);
        let bridge = PoseBridge::default();

        let moved = bridge.apply(&[pose_with_wrist(300.0, 150.0, Some(0.3))], &mut world, id);
        assert!(moved);

        let expected = Vec2::new((640.0 - 1.0 - 300.0) * 2.4, 150.0 * 2.4);
        let pos = world.body(id).unwrap().position;
        assert!((pos - expected).length() < 1e-3, "{:?} != {:?}", pos, expected);
    }

    #[test]
    fn test_missing_score_counts_as_confident() {
        let (mut world, id) = world_with_body(Vec2::ZERO);
        let bridge = PoseBridge::default();
        assert!(bridge.apply(&[pose_with_wrist(10.0, 10.0, None)], &mut world, id));
    }

    #[test]
    fn test_translate_keeps_velocity() {
        let mut world = World::new();
        let id = world.add_body(Body::new("a", Shape::Circle { radius: 5.0 }, Vec2::ZERO));
        world.body_mut(id).unwrap().set_velocity(Vec2::new(2.0, 0.0));
        let bridge = PoseBridge::default();

        bridge.apply(&[pose_with_wrist(100.0, 100.0, Some(0.9))], &mut world, id);
        assert_eq!(world.body(id).unwrap().velocity(), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_no_pose_or_short_pose_is_noop() {
        let (mut world, id) = world_with_body(Vec2::ONE);
        let bridge = PoseBridge::default();
        assert!(!bridge.apply(&[], &mut world, id));
        let short = Pose::new(vec![Keypoint::new(1.0, 1.0, Some(1.0))]);
        assert!(!bridge.apply(&[short], &mut world, id));
        assert_eq!(world.body(id).unwrap().position, Vec2::ONE);
    }

    #[test]
    fn test_blazepose_layout_uses_its_wrist() {
        let bridge = PoseBridge::new(KeypointLayout::BlazePose33);
        assert_eq!(bridge.keypoint_index, 16);
    }
}
