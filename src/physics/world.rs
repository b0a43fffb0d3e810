//! 2D physics world.
//!
//! Position-based integration:
//! 1. accumulate forces (gravity, attractors)
//! 2. integrate velocity and position of dynamic bodies
//! 3. relax constraints and collisions for `iterations` passes
//! 4. derive velocity from the corrected displacement
//!
//! Bodies don't rotate. Collision uses circles for circle pairs and
//! bounding boxes otherwise.

use glam::Vec2;
use log::trace;

use super::body::{Body, BodyId, Shape};

/// Gravity acceleration in px/s² for a unit gravity vector
pub const GRAVITY_SCALE: f32 = 1000.0;

/// Point constraint between two bodies.
///
/// `point_a`/`point_b` are offsets from each body's centre. The solver keeps the
/// two anchor points `length` apart, correcting by `stiffness` per pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub point_a: Vec2,
    pub point_b: Vec2,
    pub length: f32,
    pub stiffness: f32,
}

impl Constraint {
    /// Current distance between the anchor points
    pub fn current_length(&self, world: &World) -> Option<f32> {
        let (a, b) = world.anchors(self)?;
        Some(a.distance(b))
    }
}

/// Body pulling every other dynamic body toward itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    pub body: BodyId,
    /// Acceleration per pixel of offset (1/s²)
    pub strength: f32,
}

#[derive(Debug, Clone)]
pub struct World {
    bodies: Vec<Body>,
    constraints: Vec<Constraint>,
    attractors: Vec<Attractor>,
    /// Unit gravity direction (scaled by `gravity_scale`)
    pub gravity: Vec2,
    pub gravity_scale: f32,
    pub iterations: usize,
    timestamp: f64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            constraints: Vec::new(),
            attractors: Vec::new(),
            gravity: Vec2::Y,
            gravity_scale: GRAVITY_SCALE,
            iterations: 4,
            timestamp: 0.0,
        }
    }

    // ========== Building ==========

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.bodies.len());
        self.bodies.push(body);
        id
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn add_attractor(&mut self, body: BodyId, strength: f32) {
        self.attractors.push(Attractor { body, strength });
    }

    // ========== Access ==========

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    /// Simulated seconds since creation
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// World-space anchor points of a constraint
    pub fn anchors(&self, c: &Constraint) -> Option<(Vec2, Vec2)> {
        let a = self.body(c.body_a)?;
        let b = self.body(c.body_b)?;
        Some((a.position + c.point_a, b.position + c.point_b))
    }

    // ========== Mutation ==========

    /// Move a body by `delta` without touching its velocity (static bodies too)
    pub fn translate(&mut self, id: BodyId, delta: Vec2) {
        if let Some(body) = self.bodies.get_mut(id.0) {
            body.position += delta;
        }
    }

    // ========== Simulation ==========

    /// Advance the world by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        self.apply_attractors();

        let gravity = self.gravity * self.gravity_scale;
        let previous: Vec<Vec2> = self.bodies.iter().map(|b| b.position).collect();
        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            let accel = gravity + body.force * body.inv_mass();
            body.velocity = (body.velocity + accel * dt) * (1.0 - body.friction_air);
            body.position += body.velocity * dt;
            body.force = Vec2::ZERO;
        }

        for _ in 0..self.iterations {
            self.solve_constraints();
            self.solve_collisions();
        }

        for (body, prev) in self.bodies.iter_mut().zip(previous) {
            if !body.is_static {
                body.velocity = (body.position - prev) / dt;
            }
        }

        self.timestamp += dt as f64;
        trace!("World step dt={:.4} t={:.3}", dt, self.timestamp);
    }

    fn apply_attractors(&mut self) {
        for i in 0..self.attractors.len() {
            let Attractor { body: source, strength } = self.attractors[i];
            let Some(center) = self.body(source).map(|b| b.position) else {
                continue;
            };
            for (idx, body) in self.bodies.iter_mut().enumerate() {
                if idx == source.0 || body.is_static {
                    continue;
                }
                let pull = (center - body.position) * strength * body.mass;
                body.apply_force(pull);
            }
        }
    }

    fn solve_constraints(&mut self) {
        for i in 0..self.constraints.len() {
            let c = self.constraints[i];
            let Some((a, b)) = self.anchors(&c) else {
                continue;
            };
            let delta = b - a;
            let dist = delta.length();
            if dist <= f32::EPSILON {
                continue;
            }
            let inv_a = self.bodies[c.body_a.0].inv_mass();
            let inv_b = self.bodies[c.body_b.0].inv_mass();
            let total = inv_a + inv_b;
            if total <= 0.0 {
                continue;
            }
            let correction = delta * ((dist - c.length) / dist) * c.stiffness;
            self.bodies[c.body_a.0].position += correction * (inv_a / total);
            self.bodies[c.body_b.0].position -= correction * (inv_b / total);
        }
    }

    fn solve_collisions(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                if !a.collides_with(b) {
                    continue;
                }
                let Some(push) = penetration(a, b) else {
                    continue;
                };
                let inv_a = a.inv_mass();
                let inv_b = b.inv_mass();
                let total = inv_a + inv_b;
                if total <= 0.0 {
                    continue;
                }
                self.bodies[i].position -= push * (inv_a / total);
                self.bodies[j].position += push * (inv_b / total);
            }
        }
    }
}

/// Vector that moves `b` out of `a` (None when not overlapping)
fn penetration(a: &Body, b: &Body) -> Option<Vec2> {
    let d = b.position - a.position;
    if let (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) = (a.shape, b.shape) {
        let dist = d.length();
        let overlap = ra + rb - dist;
        if overlap <= 0.0 {
            return None;
        }
        let normal = if dist > f32::EPSILON { d / dist } else { Vec2::Y };
        return Some(normal * overlap);
    }

    let ext = a.shape.half_extents() + b.shape.half_extents();
    let overlap = ext - d.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return None;
    }
    if overlap.x < overlap.y {
        Some(Vec2::new(overlap.x * sign(d.x), 0.0))
    } else {
        Some(Vec2::new(0.0, overlap.y * sign(d.y)))
    }
}

fn sign(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn ball(at: Vec2) -> Body {
        Body::new("ball", Shape::Circle { radius: 10.0 }, at)
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut world = World::new();
        let id = world.add_body(ball(Vec2::ZERO));
        for _ in 0..10 {
            world.step(DT);
        }
        let body = world.body(id).unwrap();
        assert!(body.position.y > 0.0);
        assert!(body.velocity().y > 0.0);
        assert_eq!(body.position.x, 0.0);
        assert!((world.timestamp() - 10.0 * DT as f64).abs() < 1e-6);
    }

    #[test]
    fn test_static_body_stays() {
        let mut world = World::new();
        let id = world.add_body(ball(Vec2::new(5.0, 5.0)).with_static(true));
        world.step(DT);
        assert_eq!(world.body(id).unwrap().position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_floor_stops_fall() {
        let mut world = World::new();
        world.add_body(
            Body::new("floor", Shape::Rect { width: 400.0, height: 20.0 }, Vec2::new(0.0, 100.0)).with_static(true),
        );
        let id = world.add_body(ball(Vec2::new(0.0, 0.0)));
        for _ in 0..240 {
            world.step(DT);
        }
        // Resting on top of the floor: 100 - 10 (half floor) - 10 (radius)
        let y = world.body(id).unwrap().position.y;
        assert!(y <= 81.0 && y > 70.0, "y = {}", y);
    }

    #[test]
    fn test_constraint_holds_length() {
        let mut world = World::new();
        world.gravity = Vec2::ZERO;
        let a = world.add_body(ball(Vec2::ZERO).with_group(-1));
        let b = world.add_body(ball(Vec2::new(100.0, 0.0)).with_group(-1));
        world.add_constraint(Constraint {
            body_a: a,
            body_b: b,
            point_a: Vec2::ZERO,
            point_b: Vec2::ZERO,
            length: 30.0,
            stiffness: 0.8,
        });
        for _ in 0..120 {
            world.step(DT);
        }
        let len = world.constraints()[0].current_length(&world).unwrap();
        assert!((len - 30.0).abs() < 1.0, "len = {}", len);
    }

    #[test]
    fn test_attractor_pulls_inward() {
        let mut world = World::new();
        world.gravity = Vec2::ZERO;
        let center = world.add_body(ball(Vec2::ZERO).with_static(true));
        world.add_attractor(center, 2.0);
        let id = world.add_body(ball(Vec2::new(300.0, 0.0)));

        let start = world.body(id).unwrap().position.distance(Vec2::ZERO);
        for _ in 0..30 {
            world.step(DT);
        }
        let end = world.body(id).unwrap().position.distance(Vec2::ZERO);
        assert!(end < start);
    }

    #[test]
    fn test_translate_moves_static_body() {
        let mut world = World::new();
        let id = world.add_body(ball(Vec2::ZERO).with_static(true));
        world.translate(id, Vec2::new(3.0, 4.0));
        assert_eq!(world.body(id).unwrap().position, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_penetration_box_axis() {
        let a = Body::new("a", Shape::Rect { width: 10.0, height: 10.0 }, Vec2::ZERO);
        let b = Body::new("b", Shape::Rect { width: 10.0, height: 10.0 }, Vec2::new(8.0, 1.0));
        let push = penetration(&a, &b).unwrap();
        assert_eq!(push, Vec2::new(2.0, 0.0));
        let far = Body::new("c", Shape::Rect { width: 10.0, height: 10.0 }, Vec2::new(30.0, 0.0));
        assert!(penetration(&a, &far).is_none());
    }
}
