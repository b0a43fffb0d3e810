//! Detector seams: the loaded model handle, the factory that loads it, and the
//! runtime environment the factory loads through.

use anyhow::Result;
use log::{debug, info, warn};

use super::backend::{Backend, EnvFlags, is_valid_flag_value};
use super::keypoint::Pose;
use super::model::DetectorConfig;
use crate::camera::VideoFrame;

/// Per-call estimation options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimationConfig {
    pub max_poses: usize,
    pub flip_horizontal: bool,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            max_poses: 1,
            flip_horizontal: false,
        }
    }
}

/// A loaded pose-estimation model.
///
/// Owned by the render loop. `dispose()` is called exactly once before the
/// handle is dropped; `estimate_poses()` is never called after that.
pub trait PoseDetector {
    /// Run the model on one frame
    fn estimate_poses(&mut self, frame: &VideoFrame, config: &EstimationConfig) -> Result<Vec<Pose>>;

    /// Release model resources
    fn dispose(&mut self) {}

    /// Short name for logs
    fn name(&self) -> String;
}

/// Builds detectors for a given configuration
pub trait DetectorFactory {
    fn create(&mut self, config: &DetectorConfig, env: &RuntimeEnv) -> Result<Box<dyn PoseDetector>>;
}

/// Backend and flags most recently applied to the execution runtime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeEnv {
    backend: Option<Backend>,
    flags: EnvFlags,
    /// How many times the environment was (re)applied
    generation: u32,
}

impl RuntimeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a backend and apply the flags it understands.
    ///
    /// Flags foreign to the backend or outside their value range are skipped.
    pub fn apply(&mut self, backend: Backend, flags: &EnvFlags) {
        let mut applied = EnvFlags::new();
        for (name, value) in flags.iter() {
            if !backend.tunable_flags().contains(&name) {
                debug!("Flag {} does not apply to {}, skipped", name, backend);
                continue;
            }
            if !is_valid_flag_value(name, value) {
                warn!("Flag {}={} out of range, skipped", name, value);
                continue;
            }
            applied.set(name, value);
        }

        self.backend = Some(backend);
        self.flags = applied;
        self.generation += 1;
        info!(
            "Runtime environment: backend={} flags={} (generation {})",
            backend,
            self.flags.len(),
            self.generation
        );
    }

    pub fn backend(&self) -> Option<Backend> {
        self.backend
    }

    pub fn flags(&self) -> &EnvFlags {
        &self.flags
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::backend::{FlagValue, WASM_HAS_SIMD_SUPPORT, WEBGL_PACK, WEBGL_VERSION};

    #[test]
    fn test_apply_filters_flags() {
        let mut flags = EnvFlags::defaults_for(Backend::TfjsWebgl);
        flags.set(WASM_HAS_SIMD_SUPPORT, FlagValue::Bool(true));
        flags.set(WEBGL_VERSION, FlagValue::Number(7.0));

        let mut env = RuntimeEnv::new();
        env.apply(Backend::TfjsWebgl, &flags);

        assert_eq!(env.backend(), Some(Backend::TfjsWebgl));
        assert_eq!(env.generation(), 1);
        assert!(env.flags().get(WASM_HAS_SIMD_SUPPORT).is_none());
        assert!(env.flags().get(WEBGL_VERSION).is_none());
        assert_eq!(env.flags().get(WEBGL_PACK), Some(FlagValue::Bool(true)));
    }

    #[test]
    fn test_reapply_bumps_generation() {
        let mut env = RuntimeEnv::new();
        env.apply(Backend::TfjsWasm, &EnvFlags::defaults_for(Backend::TfjsWasm));
        env.apply(Backend::MediapipeGpu, &EnvFlags::new());
        assert_eq!(env.generation(), 2);
        assert_eq!(env.backend(), Some(Backend::MediapipeGpu));
        assert!(env.flags().is_empty());
    }
}
