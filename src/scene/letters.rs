//! Scene 1: letter chains orbiting a pose-driven attractor in zero gravity.

use glam::Vec2;

use super::{Scene, SceneKind};
use crate::physics::{Body, BodyId, Constraint, Shape, World};

/// One chain per word
pub const WORDS: [&str; 3] = ["MOVE", "YOUR", "BODY"];

pub const LETTER_SIZE: f32 = 48.0;
pub const LINK_LENGTH: f32 = 2.0;
pub const LINK_STIFFNESS: f32 = 0.8;

pub const ATTRACTOR_RADIUS: f32 = 40.0;
/// Pull per pixel of offset (1/s²)
pub const ATTRACTION: f32 = 1.5;

const LETTER_FRICTION_AIR: f32 = 0.05;

const CHAIN_COLORS: [[u8; 3]; 3] = [[236, 94, 94], [94, 170, 236], [246, 196, 74]];

pub fn build(size: Vec2) -> Scene {
    let mut world = World::new();
    world.gravity = Vec2::ZERO;

    let attractor = world.add_body(
        Body::new("attractor", Shape::Circle { radius: ATTRACTOR_RADIUS }, size * 0.5)
            .with_static(true)
            .with_sprite("", [255, 255, 255]),
    );
    world.add_attractor(attractor, ATTRACTION);

    // Rows above and below the attractor
    let rows = [0.18, 0.34, 0.82];
    for (i, word) in WORDS.iter().enumerate() {
        let origin = Vec2::new(size.x * 0.15, size.y * rows[i % rows.len()]);
        add_chain(&mut world, word, origin, -(i as i32 + 1), CHAIN_COLORS[i % CHAIN_COLORS.len()]);
    }

    Scene::from_parts(SceneKind::Letters, size, world, Some(attractor), None)
}

/// Letter boxes left to right from `origin`, linked right edge to left edge
fn add_chain(world: &mut World, word: &str, origin: Vec2, group: i32, color: [u8; 3]) -> Vec<BodyId> {
    let stride = LETTER_SIZE + LINK_LENGTH;
    let ids: Vec<BodyId> = word
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            let letter = ch.to_string();
            world.add_body(
                Body::new(
                    &letter,
                    Shape::Rect {
                        width: LETTER_SIZE,
                        height: LETTER_SIZE,
                    },
                    origin + Vec2::new(i as f32 * stride, 0.0),
                )
                .with_sprite(&letter, color)
                .with_group(group)
                .with_friction_air(LETTER_FRICTION_AIR),
            )
        })
        .collect();

    let half = LETTER_SIZE * 0.5;
    for pair in ids.windows(2) {
        world.add_constraint(Constraint {
            body_a: pair[0],
            body_b: pair[1],
            point_a: Vec2::new(half, 0.0),
            point_b: Vec2::new(-half, 0.0),
            length: LINK_LENGTH,
            stiffness: LINK_STIFFNESS,
        });
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::runner::FIXED_STEP;
    use crate::scene::default_scene_size;

    fn letters(scene: &Scene) -> Vec<Vec2> {
        scene
            .world()
            .bodies()
            .filter(|(_, b)| !b.is_static)
            .map(|(_, b)| b.position)
            .collect()
    }

    #[test]
    fn test_layout() {
        let scene = build(default_scene_size());
        let world = scene.world();
        let letter_count: usize = WORDS.iter().map(|w| w.len()).sum();
        assert_eq!(world.body_count(), letter_count + 1);
        assert_eq!(world.constraints().len(), letter_count - WORDS.len());
        assert_eq!(world.gravity, Vec2::ZERO);

        let attractor = world.body(scene.attractor().unwrap()).unwrap();
        assert!(attractor.is_static);
        assert_eq!(attractor.position, Vec2::new(768.0, 576.0));
        assert_eq!(world.attractors().len(), 1);
    }

    #[test]
    fn test_chains_start_at_rest_length() {
        let scene = build(default_scene_size());
        for c in scene.world().constraints() {
            let len = c.current_length(scene.world()).unwrap();
            assert!((len - LINK_LENGTH).abs() < 1e-3);
            assert_eq!(c.stiffness, LINK_STIFFNESS);
        }
    }

    #[test]
    fn test_letters_pulled_toward_attractor() {
        let mut scene = build(default_scene_size());
        let center = default_scene_size() * 0.5;
        let mean_dist = |p: &[Vec2]| p.iter().map(|v| v.distance(center)).sum::<f32>() / p.len() as f32;

        let start = mean_dist(&letters(&scene));
        for _ in 0..30 {
            scene.update(FIXED_STEP);
        }
        let end = mean_dist(&letters(&scene));
        assert!(end < start, "{} -> {}", start, end);
    }

    #[test]
    fn test_links_stay_near_rest_length() {
        let mut scene = build(default_scene_size());
        for _ in 0..60 {
            scene.update(FIXED_STEP);
        }
        let world = scene.world();
        let errors: Vec<f32> = world
            .constraints()
            .iter()
            .map(|c| (c.current_length(world).unwrap() - LINK_LENGTH).abs())
            .collect();
        let mean = errors.iter().sum::<f32>() / errors.len() as f32;
        assert!(mean < 8.0, "mean link error {}", mean);
    }

    #[test]
    fn test_chains_do_not_self_collide() {
        let scene = build(default_scene_size());
        let world = scene.world();
        let c = world.constraints()[0];
        let a = world.body(c.body_a).unwrap();
        let b = world.body(c.body_b).unwrap();
        assert!(!a.collides_with(b));
    }
}
