//! Rigid bodies of the 2D world.

use glam::Vec2;

/// Handle to a body inside a `World`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

impl Shape {
    /// Half extents of the axis-aligned bounding box
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rect { width, height } => Vec2::new(width, height) * 0.5,
        }
    }

    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rect { width, height } => width * height,
        }
    }
}

/// Label drawn on a body (letter tiles, ball faces)
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub text: String,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub label: String,
    pub shape: Shape,
    pub position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) force: Vec2,
    pub mass: f32,
    pub is_static: bool,
    /// Fraction of velocity lost per step
    pub friction_air: f32,
    /// Bodies sharing a negative group never collide with each other
    pub group: i32,
    pub visible: bool,
    pub sprite: Option<Sprite>,
}

impl Body {
    /// Dynamic body with density 1 (mass from area)
    pub fn new(label: &str, shape: Shape, position: Vec2) -> Self {
        Self {
            label: label.to_string(),
            shape,
            position,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            mass: shape.area().max(f32::EPSILON) * 0.001,
            is_static: false,
            friction_air: 0.01,
            group: 0,
            visible: true,
            sprite: None,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_sprite(mut self, text: &str, color: [u8; 3]) -> Self {
        self.sprite = Some(Sprite {
            text: text.to_string(),
            color,
        });
        self
    }

    pub fn with_group(mut self, group: i32) -> Self {
        self.group = group;
        self
    }

    pub fn with_friction_air(mut self, friction_air: f32) -> Self {
        self.friction_air = friction_air;
        self
    }

    pub fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn inv_mass(&self) -> f32 {
        if self.is_static || self.mass <= 0.0 { 0.0 } else { 1.0 / self.mass }
    }

    /// Velocity in px/s
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Whether two bodies take part in collision with each other
    pub fn collides_with(&self, other: &Body) -> bool {
        if self.is_static && other.is_static {
            return false;
        }
        !(self.group < 0 && self.group == other.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_has_no_inverse_mass() {
        let body = Body::new("wall", Shape::Rect { width: 10.0, height: 10.0 }, Vec2::ZERO).with_static(true);
        assert_eq!(body.inv_mass(), 0.0);
        let body = Body::new("box", Shape::Rect { width: 10.0, height: 10.0 }, Vec2::ZERO);
        assert!((body.inv_mass() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_collision_groups() {
        let a = Body::new("a", Shape::Circle { radius: 1.0 }, Vec2::ZERO).with_group(-1);
        let b = Body::new("b", Shape::Circle { radius: 1.0 }, Vec2::ZERO).with_group(-1);
        let c = Body::new("c", Shape::Circle { radius: 1.0 }, Vec2::ZERO).with_group(-2);
        assert!(!a.collides_with(&b));
        assert!(a.collides_with(&c));

        let w1 = Body::new("w1", Shape::Circle { radius: 1.0 }, Vec2::ZERO).with_static(true);
        let w2 = w1.clone();
        assert!(!w1.collides_with(&w2));
    }
}
