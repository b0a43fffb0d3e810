//! Model families and their detector configurations.
//!
//! `DetectorConfig` is a closed set of per-model builders. Each variant carries
//! exactly the options its model family understands:
//!
//! - MoveNet: model size from the pose-type string, optional custom URL,
//!   tracking only for the multi-pose model
//! - BlazePose: runtime from the backend prefix; hosted solution path only
//!   for the mediapipe runtime
//! - PoseNet: one fixed architecture

use anyhow::{Result, bail};
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::backend::{Backend, Runtime};
use super::keypoint::KeypointLayout;

/// Version of the hosted BlazePose solution files
pub const MEDIAPIPE_POSE_VERSION: &str = "0.5.1675469404";

/// Upper bound for the multi-pose max poses slider
pub const MAX_POSES_LIMIT: usize = 6;

// ============================================================================
// MODEL FAMILY
// ============================================================================

/// Pose model family (the `model` query parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    MoveNet,
    BlazePose,
    PoseNet,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::MoveNet, ModelKind::BlazePose, ModelKind::PoseNet];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::MoveNet => "movenet",
            ModelKind::BlazePose => "blazepose",
            ModelKind::PoseNet => "posenet",
        }
    }

    /// Backends the model can run on; the first one is the default
    pub fn backends(&self) -> &'static [Backend] {
        match self {
            ModelKind::BlazePose => &[Backend::MediapipeGpu, Backend::TfjsWebgl],
            ModelKind::MoveNet => &[Backend::TfjsWebgl, Backend::TfjsWasm, Backend::TfjsWebgpu],
            ModelKind::PoseNet => &[Backend::TfjsWebgl, Backend::TfjsWebgpu],
        }
    }

    pub fn default_backend(&self) -> Backend {
        self.backends()[0]
    }

    pub fn supports(&self, backend: Backend) -> bool {
        self.backends().contains(&backend)
    }

    /// Pose-type strings the model accepts (empty: no type selector)
    pub fn pose_types(&self) -> &'static [&'static str] {
        match self {
            ModelKind::MoveNet => &["lightning", "thunder", "multipose"],
            ModelKind::BlazePose => &["lite", "full", "heavy"],
            ModelKind::PoseNet => &[],
        }
    }

    pub fn layout(&self) -> KeypointLayout {
        match self {
            ModelKind::BlazePose => KeypointLayout::BlazePose33,
            ModelKind::MoveNet | ModelKind::PoseNet => KeypointLayout::Coco17,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown model: {}", s))
    }
}

// ============================================================================
// PER-MODEL SETTINGS
// ============================================================================

/// User-facing settings for the active model (control panel "model config")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Symbolic pose type ("lightning", "full", ...)
    pub model_type: String,
    /// Custom model URL; empty means the stock model
    pub custom_model_url: String,
    pub max_poses: usize,
    pub enable_tracking: bool,
    /// Minimum keypoint score for the overlay
    pub score_threshold: f32,
}

impl ModelSettings {
    /// Stock settings for a model family
    pub fn defaults_for(kind: ModelKind) -> Self {
        let (model_type, score_threshold) = match kind {
            ModelKind::MoveNet => ("lightning", 0.3),
            ModelKind::BlazePose => ("full", 0.65),
            ModelKind::PoseNet => ("", 0.5),
        };
        Self {
            model_type: model_type.to_string(),
            custom_model_url: String::new(),
            max_poses: 1,
            enable_tracking: false,
            score_threshold,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::defaults_for(ModelKind::MoveNet)
    }
}

// ============================================================================
// DETECTOR CONFIGS
// ============================================================================

/// Common view over every model configuration
#[enum_dispatch]
pub trait ModelOptions {
    /// Model family this config belongs to
    fn family(&self) -> ModelKind;

    /// Whether the model can return more than one pose
    fn is_multi_pose(&self) -> bool;

    /// One-line description for logs and the status bar
    fn summary(&self) -> String;

    /// Keypoint layout of the detector output
    fn layout(&self) -> KeypointLayout {
        self.family().layout()
    }
}

/// MoveNet model sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveNetModel {
    SinglePoseLightning,
    SinglePoseThunder,
    MultiPoseLightning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveNetConfig {
    pub model_type: MoveNetModel,
    pub model_url: Option<String>,
    pub enable_smoothing: bool,
    /// Only set for the multi-pose model
    pub enable_tracking: Option<bool>,
}

impl ModelOptions for MoveNetConfig {
    fn family(&self) -> ModelKind {
        ModelKind::MoveNet
    }

    fn is_multi_pose(&self) -> bool {
        self.model_type == MoveNetModel::MultiPoseLightning
    }

    fn summary(&self) -> String {
        let mut s = format!("MoveNet {:?}", self.model_type);
        if let Some(url) = &self.model_url {
            s.push_str(&format!(" ({})", url));
        }
        if self.enable_tracking == Some(true) {
            s.push_str(" +tracking");
        }
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlazePoseModel {
    Lite,
    Full,
    Heavy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlazePoseConfig {
    pub runtime: Runtime,
    pub model_type: BlazePoseModel,
    /// Hosted solution files, mediapipe runtime only
    pub solution_path: Option<String>,
}

impl ModelOptions for BlazePoseConfig {
    fn family(&self) -> ModelKind {
        ModelKind::BlazePose
    }

    fn is_multi_pose(&self) -> bool {
        false
    }

    fn summary(&self) -> String {
        format!("BlazePose {:?} ({})", self.model_type, self.runtime.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseNetConfig {
    pub architecture: &'static str,
    pub output_stride: u32,
    pub input_resolution: (u32, u32),
    pub multiplier: f32,
    pub quant_bytes: u32,
}

impl Default for PoseNetConfig {
    fn default() -> Self {
        Self {
            architecture: "MobileNetV1",
            output_stride: 16,
            input_resolution: (500, 500),
            multiplier: 0.75,
            quant_bytes: 4,
        }
    }
}

impl ModelOptions for PoseNetConfig {
    fn family(&self) -> ModelKind {
        ModelKind::PoseNet
    }

    fn is_multi_pose(&self) -> bool {
        false
    }

    fn summary(&self) -> String {
        format!(
            "PoseNet {} stride={} {}x{}",
            self.architecture, self.output_stride, self.input_resolution.0, self.input_resolution.1
        )
    }
}

/// Detector configuration, one variant per model family
#[enum_dispatch(ModelOptions)]
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorConfig {
    MoveNet(MoveNetConfig),
    BlazePose(BlazePoseConfig),
    PoseNet(PoseNetConfig),
}

impl DetectorConfig {
    /// Build the configuration for a model from the current settings.
    ///
    /// Errors on a pose type the model doesn't know or a runtime it can't load through.
    pub fn build(kind: ModelKind, backend: Backend, settings: &ModelSettings) -> Result<Self> {
        match kind {
            ModelKind::MoveNet => Self::movenet(settings),
            ModelKind::BlazePose => Self::blazepose(backend, settings),
            ModelKind::PoseNet => Ok(DetectorConfig::PoseNet(PoseNetConfig::default())),
        }
    }

    fn movenet(settings: &ModelSettings) -> Result<Self> {
        let model_type = match settings.model_type.as_str() {
            "lightning" => MoveNetModel::SinglePoseLightning,
            "thunder" => MoveNetModel::SinglePoseThunder,
            "multipose" => MoveNetModel::MultiPoseLightning,
            other => bail!("Unknown MoveNet type: '{}'", other),
        };
        let url = settings.custom_model_url.trim();
        Ok(DetectorConfig::MoveNet(MoveNetConfig {
            model_type,
            model_url: (!url.is_empty()).then(|| url.to_string()),
            enable_smoothing: true,
            enable_tracking: (model_type == MoveNetModel::MultiPoseLightning)
                .then_some(settings.enable_tracking),
        }))
    }

    fn blazepose(backend: Backend, settings: &ModelSettings) -> Result<Self> {
        let model_type = match settings.model_type.as_str() {
            "lite" => BlazePoseModel::Lite,
            "full" => BlazePoseModel::Full,
            "heavy" => BlazePoseModel::Heavy,
            other => bail!("Unknown BlazePose type: '{}'", other),
        };
        let config = match backend.runtime_name() {
            "mediapipe" => BlazePoseConfig {
                runtime: Runtime::Mediapipe,
                model_type,
                solution_path: Some(format!(
                    "https://cdn.jsdelivr.net/npm/@mediapipe/pose@{}",
                    MEDIAPIPE_POSE_VERSION
                )),
            },
            "tfjs" => BlazePoseConfig {
                runtime: Runtime::Tfjs,
                model_type,
                solution_path: None,
            },
            other => bail!("Unsupported BlazePose runtime: '{}'", other),
        };
        Ok(DetectorConfig::BlazePose(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(model_type: &str) -> ModelSettings {
        ModelSettings {
            model_type: model_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_movenet_lightning() {
        let cfg = DetectorConfig::build(ModelKind::MoveNet, Backend::TfjsWebgl, &settings("lightning")).unwrap();
        let DetectorConfig::MoveNet(m) = cfg else {
            panic!("expected MoveNet config");
        };
        assert_eq!(m.model_type, MoveNetModel::SinglePoseLightning);
        assert_eq!(m.model_url, None);
        assert_eq!(m.enable_tracking, None);
        assert!(m.enable_smoothing);
    }

    #[test]
    fn test_movenet_multipose_carries_tracking_and_url() {
        let mut s = settings("multipose");
        s.enable_tracking = true;
        s.custom_model_url = " https://example.com/model.json ".to_string();
        let cfg = DetectorConfig::build(ModelKind::MoveNet, Backend::TfjsWasm, &s).unwrap();
        assert!(cfg.is_multi_pose());
        let DetectorConfig::MoveNet(m) = cfg else {
            panic!("expected MoveNet config");
        };
        assert_eq!(m.model_type, MoveNetModel::MultiPoseLightning);
        assert_eq!(m.enable_tracking, Some(true));
        assert_eq!(m.model_url.as_deref(), Some("https://example.com/model.json"));
    }

    #[test]
    fn test_movenet_unknown_type() {
        let err = DetectorConfig::build(ModelKind::MoveNet, Backend::TfjsWebgl, &settings("tiny")).unwrap_err();
        assert!(err.to_string().contains("tiny"));
    }

    #[test]
    fn test_blazepose_tfjs_has_no_solution_path() {
        let cfg = DetectorConfig::build(ModelKind::BlazePose, Backend::TfjsWebgl, &settings("full")).unwrap();
        let DetectorConfig::BlazePose(b) = cfg else {
            panic!("expected BlazePose config");
        };
        assert_eq!(b.runtime, Runtime::Tfjs);
        assert_eq!(b.solution_path, None);
        assert_eq!(b.model_type, BlazePoseModel::Full);
    }

    #[test]
    fn test_blazepose_mediapipe_solution_path() {
        let cfg = DetectorConfig::build(ModelKind::BlazePose, Backend::MediapipeGpu, &settings("lite")).unwrap();
        let DetectorConfig::BlazePose(b) = cfg else {
            panic!("expected BlazePose config");
        };
        assert_eq!(b.runtime, Runtime::Mediapipe);
        let path = b.solution_path.unwrap();
        assert!(path.ends_with(MEDIAPIPE_POSE_VERSION));
        assert!(path.contains("@mediapipe/pose@"));
    }

    #[test]
    fn test_posenet_fixed() {
        let cfg = DetectorConfig::build(ModelKind::PoseNet, Backend::TfjsWebgpu, &settings("ignored")).unwrap();
        assert_eq!(cfg.family(), ModelKind::PoseNet);
        assert_eq!(cfg, DetectorConfig::PoseNet(PoseNetConfig::default()));
        let DetectorConfig::PoseNet(p) = cfg else {
            panic!("expected PoseNet config");
        };
        assert_eq!(p.output_stride, 16);
        assert_eq!(p.input_resolution, (500, 500));
        assert_eq!(p.quant_bytes, 4);
    }

    #[test]
    fn test_model_backends() {
        assert_eq!(ModelKind::BlazePose.default_backend(), Backend::MediapipeGpu);
        assert_eq!(ModelKind::MoveNet.default_backend(), Backend::TfjsWebgl);
        assert!(!ModelKind::PoseNet.supports(Backend::TfjsWasm));
        assert_eq!("MoveNet".parse::<ModelKind>(), Ok(ModelKind::MoveNet));
    }
}
