//! Scene 2: sprites tumbling in a walled box while gravity rotates.

use glam::Vec2;

use super::{Scene, SceneKind};
use crate::physics::{Body, GravityCycle, Shape, World};

pub const WALL_THICKNESS: f32 = 50.0;

const BALL_RADIUS: f32 = 36.0;
const BOX_SIZE: f32 = 72.0;

/// (label, colour) of each falling sprite
const SPRITES: [(&str, [u8; 3]); 10] = [
    ("sun", [250, 200, 60]),
    ("moon", [200, 200, 220]),
    ("leaf", [90, 190, 90]),
    ("drop", [80, 150, 240]),
    ("rock", [150, 130, 110]),
    ("star", [250, 230, 120]),
    ("cloud", [230, 230, 240]),
    ("flame", [240, 110, 60]),
    ("shell", [240, 180, 200]),
    ("seed", [170, 140, 80]),
];

pub fn build(size: Vec2) -> Scene {
    let mut world = World::new();
    let cycle = GravityCycle::default();
    world.gravity = cycle.current();

    add_walls(&mut world, size);

    let cols = 5;
    let spacing = Vec2::new(size.x / (cols as f32 + 1.0), BOX_SIZE * 1.6);
    for (i, (label, color)) in SPRITES.iter().enumerate() {
        let (col, row) = (i % cols, i / cols);
        let position = Vec2::new(spacing.x * (col as f32 + 1.0), size.y * 0.15 + spacing.y * row as f32);
        let shape = if i % 2 == 0 {
            Shape::Circle { radius: BALL_RADIUS }
        } else {
            Shape::Rect {
                width: BOX_SIZE,
                height: BOX_SIZE,
            }
        };
        let text = label[..1].to_ascii_uppercase();
        world.add_body(Body::new(label, shape, position).with_sprite(&text, *color));
    }

    Scene::from_parts(SceneKind::Falling, size, world, None, Some(cycle))
}

/// Four invisible walls whose inner edges line the canvas
fn add_walls(world: &mut World, size: Vec2) {
    let t = WALL_THICKNESS;
    let walls = [
        ("wall_top", Vec2::new(size.x * 0.5, -t * 0.5), Vec2::new(size.x + 2.0 * t, t)),
        ("wall_bottom", Vec2::new(size.x * 0.5, size.y + t * 0.5), Vec2::new(size.x + 2.0 * t, t)),
        ("wall_left", Vec2::new(-t * 0.5, size.y * 0.5), Vec2::new(t, size.y + 2.0 * t)),
        ("wall_right", Vec2::new(size.x + t * 0.5, size.y * 0.5), Vec2::new(t, size.y + 2.0 * t)),
    ];
    for (label, center, extent) in walls {
        world.add_body(
            Body::new(
                label,
                Shape::Rect {
                    width: extent.x,
                    height: extent.y,
                },
                center,
            )
            .with_static(true)
            .invisible(),
        );
    }
}
