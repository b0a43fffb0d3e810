//! Small 2D physics engine for the demo scenes: bodies, point constraints,
//! attractors, gravity cycling and a fixed-step runner.

pub mod body;
pub mod gravity;
pub mod runner;
pub mod world;

pub use body::{Body, BodyId, Shape, Sprite};
pub use gravity::GravityCycle;
pub use runner::Runner;
pub use world::{Attractor, Constraint, World};
