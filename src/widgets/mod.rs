//! UI widgets: control panel, camera canvas, physics canvas, status bar.

pub mod camera_view;
pub mod control_panel;
pub mod physics_view;
pub mod status;

pub use camera_view::{CameraView, OverlayStyle};
pub use control_panel::SceneControls;
pub use status::StatusInfo;
