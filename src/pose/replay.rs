//! Recorded-pose detector.
//!
//! Plays back poses captured earlier (JSON, one list of poses per frame) in
//! place of a live model. Frames cycle forever; coordinates are rescaled from
//! the recording size to the size of the frame being "detected".

use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::detector::{DetectorFactory, EstimationConfig, PoseDetector, RuntimeEnv};
use super::keypoint::Pose;
use super::model::{DetectorConfig, ModelKind, ModelOptions};
use crate::bridge::flip_poses_horizontal;
use crate::camera::VideoFrame;

/// On-disk pose recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecording {
    /// Model family the poses were captured with
    pub model: ModelKind,
    /// Capture frame size; coordinates are used as-is when absent
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    pub frames: Vec<Vec<Pose>>,
}

impl PoseRecording {
    pub fn from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pose recording: {}", path.display()))?;
        let recording: PoseRecording = serde_json::from_str(&content)
            .with_context(|| format!("Invalid pose recording: {}", path.display()))?;
        Ok(recording)
    }
}

/// Detector that replays a recording
pub struct ReplayDetector {
    recording: Arc<PoseRecording>,
    cursor: usize,
    multi_pose: bool,
    disposed: bool,
    label: String,
}

impl ReplayDetector {
    pub fn new(recording: Arc<PoseRecording>, config: &DetectorConfig) -> Self {
        Self {
            recording,
            cursor: 0,
            multi_pose: config.is_multi_pose(),
            disposed: false,
            label: format!("replay: {}", config.summary()),
        }
    }
}

impl PoseDetector for ReplayDetector {
    fn estimate_poses(&mut self, frame: &VideoFrame, config: &EstimationConfig) -> Result<Vec<Pose>> {
        if self.disposed {
            bail!("Detector '{}' was disposed", self.label);
        }
        let frames = &self.recording.frames;
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let mut poses = frames[self.cursor % frames.len()].clone();
        self.cursor = self.cursor.wrapping_add(1);

        let limit = if self.multi_pose { config.max_poses.max(1) } else { 1 };
        poses.truncate(limit);

        if let (Some(w), Some(h)) = (self.recording.width, self.recording.height)
            && w > 0
            && h > 0
        {
            let sx = frame.width as f32 / w as f32;
            let sy = frame.height as f32 / h as f32;
            for pose in &mut poses {
                pose.scale(sx, sy);
            }
        }

        if config.flip_horizontal {
            flip_poses_horizontal(&mut poses, frame.width as f32);
        }
        Ok(poses)
    }

    fn dispose(&mut self) {
        debug!("Disposing {}", self.label);
        self.disposed = true;
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}

/// Factory that serves replay detectors from a recording file
#[derive(Default)]
pub struct ReplayFactory {
    source: Option<PathBuf>,
    loaded: Option<(PathBuf, Arc<PoseRecording>)>,
}

impl ReplayFactory {
    pub fn new(source: Option<PathBuf>) -> Self {
        Self { source, loaded: None }
    }

    /// Point the factory at another recording (takes effect on the next create)
    pub fn set_source(&mut self, path: PathBuf) {
        info!("Pose source: {}", path.display());
        self.source = Some(path);
        // Re-read even when the same file is picked again
        self.loaded = None;
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn recording(&mut self, path: &Path) -> Result<Arc<PoseRecording>> {
        if let Some((loaded_path, recording)) = &self.loaded
            && loaded_path == path
        {
            return Ok(Arc::clone(recording));
        }
        let recording = Arc::new(PoseRecording::from_json(path)?);
        info!(
            "Loaded pose recording {} ({} frames, model {})",
            path.display(),
            recording.frames.len(),
            recording.model
        );
        self.loaded = Some((path.to_path_buf(), Arc::clone(&recording)));
        Ok(recording)
    }
}

impl DetectorFactory for ReplayFactory {
    fn create(&mut self, config: &DetectorConfig, env: &RuntimeEnv) -> Result<Box<dyn PoseDetector>> {
        let Some(path) = self.source.clone() else {
            bail!("No pose source for {}: open a pose recording to enable detection", config.family());
        };
        let recording = self.recording(&path)?;
        if recording.model != config.family() {
            bail!(
                "Pose recording was captured with {}, but {} is selected",
                recording.model,
                config.family()
            );
        }
        debug!("Creating replay detector on {:?}", env.backend());
        Ok(Box::new(ReplayDetector::new(recording, config)))
    }
}
