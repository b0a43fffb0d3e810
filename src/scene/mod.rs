//! Canned physics scenes and their control surface.
//!
//! - Scene 1 (`Letters`): zero gravity, letter chains pulled by the attractor
//! - Scene 2 (`Falling`): walled box, gravity direction cycling every 3s
//!
//! Both expose start/stop for physics stepping and for drawing, independently.

pub mod falling;
pub mod letters;

use glam::Vec2;
use log::info;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::bridge::{PHYSICS_SCALE, REFERENCE_HEIGHT, REFERENCE_WIDTH};
use crate::physics::{BodyId, GravityCycle, Runner, World};

/// Scene selector (`--scene 1|2`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneKind {
    #[default]
    Letters,
    Falling,
}

impl SceneKind {
    pub fn number(&self) -> u8 {
        match self {
            SceneKind::Letters => 1,
            SceneKind::Falling => 2,
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneKind::Letters => write!(f, "1 (letters)"),
            SceneKind::Falling => write!(f, "2 (falling)"),
        }
    }
}

impl FromStr for SceneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "letters" => Ok(SceneKind::Letters),
            "2" | "falling" => Ok(SceneKind::Falling),
            other => Err(format!("Unknown scene: {} (expected 1 or 2)", other)),
        }
    }
}

/// Physics canvas size: reference camera size scaled into physics space
pub fn default_scene_size() -> Vec2 {
    Vec2::new(REFERENCE_WIDTH, REFERENCE_HEIGHT) * PHYSICS_SCALE
}

/// A built scene: world, runner and the scene's special bodies
pub struct Scene {
    kind: SceneKind,
    size: Vec2,
    world: World,
    runner: Runner,
    attractor: Option<BodyId>,
    gravity_cycle: Option<GravityCycle>,
}

impl Scene {
    pub fn build(kind: SceneKind, size: Vec2) -> Self {
        let scene = match kind {
            SceneKind::Letters => letters::build(size),
            SceneKind::Falling => falling::build(size),
        };
        info!(
            "Scene {} built: {} bodies, {} constraints",
            kind,
            scene.world.body_count(),
            scene.world.constraints().len()
        );
        scene
    }

    pub(crate) fn from_parts(
        kind: SceneKind,
        size: Vec2,
        world: World,
        attractor: Option<BodyId>,
        gravity_cycle: Option<GravityCycle>,
    ) -> Self {
        Self {
            kind,
            size,
            world,
            runner: Runner::default(),
            attractor,
            gravity_cycle,
        }
    }

    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Body driven by the pose bridge (scene 1 only)
    pub fn attractor(&self) -> Option<BodyId> {
        self.attractor
    }

    pub fn gravity(&self) -> Vec2 {
        self.world.gravity
    }

    /// Advance physics by wall-clock `elapsed`. Returns steps run.
    pub fn update(&mut self, elapsed: Duration) -> u32 {
        let steps = self.runner.steps_for(elapsed);
        let step = self.runner.step();
        for _ in 0..steps {
            if let Some(cycle) = self.gravity_cycle.as_mut()
                && let Some(gravity) = cycle.advance(step)
            {
                self.world.gravity = gravity;
            }
            self.world.step(step.as_secs_f32());
        }
        steps
    }

    // ========== Control surface ==========

    pub fn start_engine(&mut self) {
        self.runner.start_engine();
    }

    pub fn stop_engine(&mut self) {
        self.runner.stop_engine();
    }

    pub fn start_renderer(&mut self) {
        self.runner.start_renderer();
    }

    pub fn stop_renderer(&mut self) {
        self.runner.stop_renderer();
    }

    pub fn is_engine_running(&self) -> bool {
        self.runner.is_engine_running()
    }

    pub fn is_renderer_running(&self) -> bool {
        self.runner.is_renderer_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::runner::FIXED_STEP;

    fn run(scene: &mut Scene, seconds: f64) {
        let frames = (seconds / FIXED_STEP.as_secs_f64()).round() as usize;
        for _ in 0..frames {
            scene.update(FIXED_STEP);
        }
    }

    #[test]
    fn test_parse_scene_kind() {
        assert_eq!("1".parse::<SceneKind>(), Ok(SceneKind::Letters));
        assert_eq!("falling".parse::<SceneKind>(), Ok(SceneKind::Falling));
        assert!("3".parse::<SceneKind>().is_err());
    }

    #[test]
    fn test_default_size_is_scaled_reference() {
        assert_eq!(default_scene_size(), Vec2::new(1536.0, 1152.0));
    }

    #[test]
    fn test_gravity_cycles_in_order() {
        let mut scene = Scene::build(SceneKind::Falling, default_scene_size());
        let mut seen = Vec::new();
        // Sample in the middle of each 3s interval
        run(&mut scene, 1.5);
        seen.push(scene.gravity());
        for _ in 0..4 {
            run(&mut scene, 3.0);
            seen.push(scene.gravity());
        }
        assert_eq!(seen, vec![Vec2::Y, Vec2::NEG_Y, Vec2::X, Vec2::NEG_X, Vec2::Y]);
        assert!(scene.world().timestamp() >= 12.0);
    }

    #[test]
    fn test_stopped_engine_freezes_world() {
        let mut scene = Scene::build(SceneKind::Falling, default_scene_size());
        scene.stop_engine();
        let before: Vec<Vec2> = scene.world().bodies().map(|(_, b)| b.position).collect();
        assert_eq!(scene.update(Duration::from_secs(1)), 0);
        let after: Vec<Vec2> = scene.world().bodies().map(|(_, b)| b.position).collect();
        assert_eq!(before, after);
        assert!(scene.is_renderer_running());
    }

    #[test]
    fn test_only_letters_scene_has_attractor() {
        let letters = Scene::build(SceneKind::Letters, default_scene_size());
        let falling = Scene::build(SceneKind::Falling, default_scene_size());
        assert!(letters.attractor().is_some());
        assert!(falling.attractor().is_none());
    }
}
