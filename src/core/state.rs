//! Application state: active model, backend, flags and camera settings.
//!
//! Mutated only through setters while control events are drained. Every
//! setter that needs the render loop to rebuild something records it in
//! `PendingChanges`; the loop reads and clears those once per frame.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::control_events::*;
use super::event_bus::{BoxedEvent, downcast_event};
use crate::camera::{CameraSettings, SizeOption};
use crate::pose::detector::EstimationConfig;
use crate::pose::model::MAX_POSES_LIMIT;
use crate::pose::{Backend, DetectorConfig, EnvFlags, FlagValue, ModelKind, ModelSettings, ModelOptions};

/// Model used when the query names none
pub const DEFAULT_MODEL: ModelKind = ModelKind::MoveNet;

pub const MIN_TARGET_FPS: u32 = 1;
pub const MAX_TARGET_FPS: u32 = 120;

/// Changes recorded by setters and not yet applied by the render loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub model: bool,
    pub backend: bool,
    pub flags: bool,
    pub target_fps: bool,
    pub size_option: bool,
}

impl PendingChanges {
    pub fn camera(&self) -> bool {
        self.target_fps || self.size_option
    }

    pub fn detector(&self) -> bool {
        self.model || self.backend || self.flags
    }

    pub fn is_empty(&self) -> bool {
        !self.camera() && !self.detector()
    }
}

// ============================================================================
// SETTINGS FILE
// ============================================================================

/// Persisted subset of the state (`posefield.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: ModelKind,
    pub backend: Option<Backend>,
    pub flags: EnvFlags,
    pub model_config: Option<ModelSettings>,
    pub camera: CameraSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL,
            backend: None,
            flags: EnvFlags::new(),
            model_config: None,
            camera: CameraSettings::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Settings =
            serde_json::from_str(&text).with_context(|| format!("Invalid settings file {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

// ============================================================================
// STARTUP QUERY
// ============================================================================

/// Parameters of the `model=…&type=…&backend=…` startup query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartupQuery {
    pub model: Option<ModelKind>,
    pub model_type: Option<String>,
    pub backend: Option<Backend>,
}

/// Append `model=<default>` when the query has no model parameter
pub fn ensure_model_param(query: &str, default: ModelKind) -> String {
    let query = query.trim().trim_start_matches('?');
    let has_model = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key == "model" && !value.is_empty());
    if has_model {
        return query.to_string();
    }
    info!("No model in query, defaulting to {}", default);
    if query.is_empty() {
        format!("model={}", default)
    } else {
        format!("{}&model={}", query, default)
    }
}

/// Parse the startup query. Unknown values are dropped with a warning.
pub fn parse_query(query: &str) -> StartupQuery {
    let mut parsed = StartupQuery::default();
    for (key, value) in query.trim_start_matches('?').split('&').filter_map(|p| p.split_once('=')) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key {
            "model" => match value.parse() {
                Ok(model) => parsed.model = Some(model),
                Err(e) => warn!("{}, ignored", e),
            },
            "type" => parsed.model_type = Some(value.to_string()),
            "backend" => match value.parse() {
                Ok(backend) => parsed.backend = Some(backend),
                Err(e) => warn!("{}", e),
            },
            other => debug!("Ignoring query parameter {}", other),
        }
    }
    parsed
}

// ============================================================================
// APP STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    model: ModelKind,
    backend: Backend,
    flags: EnvFlags,
    model_settings: ModelSettings,
    camera: CameraSettings,
    pending: PendingChanges,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl AppState {
    /// Stock state for a model family
    pub fn new(model: ModelKind) -> Self {
        let backend = model.default_backend();
        Self {
            model,
            backend,
            flags: EnvFlags::defaults_for(backend),
            model_settings: ModelSettings::defaults_for(model),
            camera: CameraSettings::default(),
            pending: PendingChanges::default(),
        }
    }

    /// State from a settings file; invalid combinations fall back to defaults
    pub fn from_settings(settings: &Settings) -> Self {
        let mut state = Self::new(settings.model);
        if let Some(backend) = settings.backend {
            if settings.model.supports(backend) {
                state.backend = backend;
                state.flags = EnvFlags::defaults_for(backend);
            } else {
                warn!("Backend {} not supported by {}, using {}", backend, settings.model, state.backend);
            }
        }
        for (name, value) in settings.flags.iter() {
            state.set_flag(name, value);
        }
        if let Some(config) = &settings.model_config {
            let types = settings.model.pose_types();
            if types.is_empty() || types.contains(&config.model_type.as_str()) {
                state.model_settings = config.clone();
                state.model_settings.max_poses = config.max_poses.clamp(1, MAX_POSES_LIMIT);
            } else {
                warn!(
                    "Type '{}' is not valid for {}, using {}",
                    config.model_type, settings.model, state.model_settings.model_type
                );
            }
        }
        state.camera = settings.camera;
        state.camera.target_fps = state.camera.target_fps.clamp(MIN_TARGET_FPS, MAX_TARGET_FPS);
        state.pending = PendingChanges::default();
        state
    }

    /// Apply the startup query on top of the current state
    pub fn apply_query(&mut self, query: &StartupQuery) {
        if let Some(model) = query.model {
            self.set_model(model);
        }
        if let Some(backend) = query.backend {
            self.set_backend(backend);
        }
        if let Some(model_type) = &query.model_type {
            self.set_model_type(model_type);
        }
    }

    // ========== Getters ==========

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn flags(&self) -> &EnvFlags {
        &self.flags
    }

    pub fn model_settings(&self) -> &ModelSettings {
        &self.model_settings
    }

    pub fn camera(&self) -> &CameraSettings {
        &self.camera
    }

    pub fn pending(&self) -> PendingChanges {
        self.pending
    }

    /// Detector config for the current selection
    pub fn detector_config(&self) -> Result<DetectorConfig> {
        DetectorConfig::build(self.model, self.backend, &self.model_settings)
    }

    /// Per-frame estimation options
    pub fn estimation_config(&self) -> EstimationConfig {
        EstimationConfig {
            max_poses: self.model_settings.max_poses.clamp(1, MAX_POSES_LIMIT),
            flip_horizontal: false,
        }
    }

    /// Whether the current selection returns several poses
    pub fn is_multi_pose(&self) -> bool {
        self.detector_config().map(|c| c.is_multi_pose()).unwrap_or(false)
    }

    // ========== Setters ==========

    /// Switch model family. Resets per-model settings and, if the backend is
    /// not supported by the new model, falls back to the model's default.
    pub fn set_model(&mut self, model: ModelKind) {
        if model == self.model {
            return;
        }
        info!("Model: {} -> {}", self.model, model);
        self.model = model;
        self.model_settings = ModelSettings::defaults_for(model);
        if !model.supports(self.backend) {
            let backend = model.default_backend();
            info!("Backend {} not supported by {}, switching to {}", self.backend, model, backend);
            self.backend = backend;
            self.flags = EnvFlags::defaults_for(backend);
            self.pending.backend = true;
            self.pending.flags = true;
        }
        self.pending.model = true;
    }

    /// Switch backend; resets flags to the backend's stock values
    pub fn set_backend(&mut self, backend: Backend) {
        if backend == self.backend {
            return;
        }
        if !self.model.supports(backend) {
            warn!("Backend {} not supported by {}, ignored", backend, self.model);
            return;
        }
        info!("Backend: {} -> {}", self.backend, backend);
        self.backend = backend;
        self.flags = EnvFlags::defaults_for(backend);
        self.pending.backend = true;
        self.pending.flags = true;
    }

    /// Set one environment flag. Returns false if the backend doesn't
    /// know the flag or the value is out of range.
    pub fn set_flag(&mut self, name: &str, value: FlagValue) -> bool {
        if !self.backend.tunable_flags().contains(&name) {
            warn!("Flag {} does not apply to {}", name, self.backend);
            return false;
        }
        if !crate::pose::backend::is_valid_flag_value(name, value) {
            warn!("Flag {}={} out of range", name, value);
            return false;
        }
        if self.flags.get(name) != Some(value) {
            debug!("Flag {} = {}", name, value);
            self.flags.set(name, value);
            self.pending.flags = true;
        }
        true
    }

    pub fn set_model_type(&mut self, model_type: &str) {
        let types = self.model.pose_types();
        if !types.contains(&model_type) {
            warn!("Type '{}' is not valid for {} (expected one of {:?})", model_type, self.model, types);
            return;
        }
        if self.model_settings.model_type != model_type {
            self.model_settings.model_type = model_type.to_string();
            self.pending.model = true;
        }
    }

    pub fn set_custom_model_url(&mut self, url: &str) {
        let url = url.trim();
        if self.model_settings.custom_model_url != url {
            self.model_settings.custom_model_url = url.to_string();
            self.pending.model = true;
        }
    }

    /// Takes effect on the next estimation call, no reload
    pub fn set_max_poses(&mut self, max_poses: usize) {
        self.model_settings.max_poses = max_poses.clamp(1, MAX_POSES_LIMIT);
    }

    pub fn set_tracking(&mut self, enabled: bool) {
        if self.model_settings.enable_tracking != enabled {
            self.model_settings.enable_tracking = enabled;
            self.pending.model = true;
        }
    }

    /// Overlay threshold, no reload
    pub fn set_score_threshold(&mut self, threshold: f32) {
        self.model_settings.score_threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        let fps = fps.clamp(MIN_TARGET_FPS, MAX_TARGET_FPS);
        if self.camera.target_fps != fps {
            self.camera.target_fps = fps;
            self.pending.target_fps = true;
        }
    }

    pub fn set_size_option(&mut self, size_option: SizeOption) {
        if self.camera.size_option != size_option {
            self.camera.size_option = size_option;
            self.pending.size_option = true;
        }
    }

    // ========== Pending changes ==========

    /// Read and clear the camera changes
    pub fn take_camera_changes(&mut self) -> bool {
        let changed = self.pending.camera();
        self.pending.target_fps = false;
        self.pending.size_option = false;
        changed
    }

    /// Read and clear the model/backend/flag changes
    pub fn take_detector_changes(&mut self) -> PendingChanges {
        let taken = PendingChanges {
            model: self.pending.model,
            backend: self.pending.backend,
            flags: self.pending.flags,
            ..Default::default()
        };
        self.pending.model = false;
        self.pending.backend = false;
        self.pending.flags = false;
        taken
    }

    /// Route a control event to its setter. Returns false if the event is
    /// not a state event.
    pub fn apply_event(&mut self, event: &BoxedEvent) -> bool {
        if let Some(e) = downcast_event::<SetModelEvent>(event) {
            self.set_model(e.0);
        } else if let Some(e) = downcast_event::<SetBackendEvent>(event) {
            self.set_backend(e.0);
        } else if let Some(e) = downcast_event::<SetEnvFlagEvent>(event) {
            self.set_flag(&e.name, e.value);
        } else if let Some(e) = downcast_event::<SetModelTypeEvent>(event) {
            self.set_model_type(&e.0);
        } else if let Some(e) = downcast_event::<SetCustomModelUrlEvent>(event) {
            self.set_custom_model_url(&e.0);
        } else if let Some(e) = downcast_event::<SetMaxPosesEvent>(event) {
            self.set_max_poses(e.0);
        } else if let Some(e) = downcast_event::<SetTrackingEvent>(event) {
            self.set_tracking(e.0);
        } else if let Some(e) = downcast_event::<SetScoreThresholdEvent>(event) {
            self.set_score_threshold(e.0);
        } else if let Some(e) = downcast_event::<SetTargetFpsEvent>(event) {
            self.set_target_fps(e.0);
        } else if let Some(e) = downcast_event::<SetSizeOptionEvent>(event) {
            self.set_size_option(e.0);
        } else {
            return false;
        }
        true
    }
}
