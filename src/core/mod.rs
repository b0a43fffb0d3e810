//! Core loop modules - state, control events, render loop, stats
//!
//! These modules drive detection and physics, independent of UI.

pub mod control_events;
pub mod event_bus;
pub mod render_loop;
pub mod state;
pub mod stats;

pub use event_bus::{EventBus, EventEmitter, downcast_event};
pub use render_loop::{Alert, FrameOutput, RenderLoop};
pub use state::{AppState, PendingChanges, Settings};
pub use stats::{InferenceStats, StatsSample};
