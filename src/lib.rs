//! POSEFIELD - pose-driven 2D physics playground library
//!
//! Re-exports all modules for use by the binary target.

// Core loop (state, events, render loop, stats)
pub mod core;

// Detection, camera, physics
pub mod bridge;
pub mod camera;
pub mod physics;
pub mod pose;
pub mod scene;

// App modules
pub mod cli;
pub mod paths;
pub mod widgets;

// Re-export commonly used types from core
pub use core::event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use core::render_loop::RenderLoop;
pub use core::state::AppState;

pub use bridge::PoseBridge;
pub use scene::{Scene, SceneKind};
