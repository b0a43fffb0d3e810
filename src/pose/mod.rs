//! Pose detection: keypoint types, model configuration, detector seams.

pub mod backend;
pub mod detector;
pub mod keypoint;
pub mod model;
pub mod replay;

pub use backend::{Backend, EnvFlags, FlagValue, Runtime};
pub use detector::{DetectorFactory, EstimationConfig, PoseDetector, RuntimeEnv};
pub use keypoint::{Keypoint, KeypointLayout, Pose, Side};
pub use model::{DetectorConfig, ModelKind, ModelOptions, ModelSettings};
pub use replay::{PoseRecording, ReplayFactory};
