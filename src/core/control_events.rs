//! Control-panel events.
//!
//! Emitted by widgets, drained once per frame before the render loop checks
//! for pending changes.

use std::path::PathBuf;

use crate::camera::SizeOption;
use crate::pose::{Backend, FlagValue, ModelKind};

// === Model ===

#[derive(Clone, Debug)]
pub struct SetModelEvent(pub ModelKind);

#[derive(Clone, Debug)]
pub struct SetModelTypeEvent(pub String);

#[derive(Clone, Debug)]
pub struct SetCustomModelUrlEvent(pub String);

#[derive(Clone, Debug)]
pub struct SetMaxPosesEvent(pub usize);

#[derive(Clone, Debug)]
pub struct SetTrackingEvent(pub bool);

#[derive(Clone, Debug)]
pub struct SetScoreThresholdEvent(pub f32);

// === Backend ===

#[derive(Clone, Debug)]
pub struct SetBackendEvent(pub Backend);

#[derive(Clone, Debug)]
pub struct SetEnvFlagEvent {
    pub name: String,
    pub value: FlagValue,
}

// === Camera ===

#[derive(Clone, Debug)]
pub struct SetTargetFpsEvent(pub u32);

#[derive(Clone, Debug)]
pub struct SetSizeOptionEvent(pub SizeOption);

/// Switch the camera to an image sequence (glob or directory)
#[derive(Clone, Debug)]
pub struct LoadFramesEvent(pub String);

/// Switch the detector to a pose recording
#[derive(Clone, Debug)]
pub struct LoadRecordingEvent(pub PathBuf);

// === Scene ===

#[derive(Clone, Debug)]
pub struct SetEngineRunningEvent(pub bool);

#[derive(Clone, Debug)]
pub struct SetRendererRunningEvent(pub bool);

// === Alerts ===

#[derive(Clone, Debug)]
pub struct DismissAlertEvent;
