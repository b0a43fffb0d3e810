//! Camera adapter - frame sources feeding the render loop.
//!
//! A `Camera` exposes readiness ("enough data to draw"), its frame size and the
//! current frame. `CameraFactory` rebuilds the camera whenever the target FPS or
//! size option changes.
//!
//! Sources:
//! - `ImageSequenceCamera`: image files played back at the target FPS
//! - `TestPatternCamera`: synthetic frames when no source is given

pub mod pattern;
pub mod sequence;

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

pub use pattern::TestPatternCamera;
pub use sequence::ImageSequenceCamera;

// ============================================================================
// FRAME
// ============================================================================

/// One RGBA8 video frame
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes
    pub pixels: Arc<Vec<u8>>,
    /// Monotonic frame counter of the source
    pub index: u64,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, index: u64) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
            index,
        }
    }

    /// Frame filled with a single colour
    pub fn solid(width: u32, height: u32, rgba: [u8; 4], index: u64) -> Self {
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        for px in pixels.chunks_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Self::new(width, height, pixels, index)
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Capture size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SizeOption {
    #[default]
    #[serde(rename = "640 X 480")]
    S640x480,
    #[serde(rename = "640 X 360")]
    S640x360,
    #[serde(rename = "360 X 270")]
    S360x270,
    #[serde(rename = "360 X 202")]
    S360x202,
}

impl SizeOption {
    pub const ALL: [SizeOption; 4] = [
        SizeOption::S640x480,
        SizeOption::S640x360,
        SizeOption::S360x270,
        SizeOption::S360x202,
    ];

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SizeOption::S640x480 => (640, 480),
            SizeOption::S640x360 => (640, 360),
            SizeOption::S360x270 => (360, 270),
            SizeOption::S360x202 => (360, 202),
        }
    }
}

impl fmt::Display for SizeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{} X {}", w, h)
    }
}

impl FromStr for SizeOption {
    type Err = String;

    /// Accepts "640 X 480", "640x480", "640X480"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
        SizeOption::ALL
            .into_iter()
            .find(|opt| {
                let (w, h) = opt.dimensions();
                normalized == format!("{}x{}", w, h)
            })
            .ok_or_else(|| format!("Unknown size option: {}", s))
    }
}

/// Camera configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub target_fps: u32,
    pub size_option: SizeOption,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            target_fps: 60,
            size_option: SizeOption::default(),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Pattern matched no decodable images
    NoFrames(String),
    Glob(String),
    Decode { path: String, message: String },
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoFrames(p) => write!(f, "No image frames found for: {}", p),
            CameraError::Glob(e) => write!(f, "Invalid frame pattern: {}", e),
            CameraError::Decode { path, message } => write!(f, "Failed to decode {}: {}", path, message),
        }
    }
}

impl std::error::Error for CameraError {}

// ============================================================================
// TRAITS
// ============================================================================

/// A running frame source
pub trait Camera {
    /// Frame size in pixels
    fn size(&self) -> (u32, u32);

    /// Whether a frame can be read now
    fn is_ready(&self) -> bool;

    /// Frame to show at `now`
    fn read_frame(&mut self, now: Instant) -> Option<VideoFrame>;
}

/// Builds cameras for a configuration
pub trait CameraFactory {
    fn create(&mut self, settings: &CameraSettings) -> Result<Box<dyn Camera>>;
}

/// Default factory: image sequence when a source is set, test pattern otherwise
#[derive(Debug, Default, Clone)]
pub struct SourceCameraFactory {
    frames: Option<String>,
}

impl SourceCameraFactory {
    pub fn new(frames: Option<String>) -> Self {
        Self { frames }
    }

    /// Switch to another frame source (takes effect on the next create)
    pub fn set_frames(&mut self, frames: String) {
        self.frames = Some(frames);
    }
}

impl CameraFactory for SourceCameraFactory {
    fn create(&mut self, settings: &CameraSettings) -> Result<Box<dyn Camera>> {
        let (w, h) = settings.size_option.dimensions();
        match &self.frames {
            Some(source) => {
                let camera = ImageSequenceCamera::open(source, settings)?;
                info!(
                    "Camera: {} frames from {} at {}x{} @ {} fps",
                    camera.frame_count(),
                    source,
                    w,
                    h,
                    settings.target_fps
                );
                Ok(Box::new(camera))
            }
            None => {
                info!("Camera: test pattern {}x{} @ {} fps", w, h, settings.target_fps);
                Ok(Box::new(TestPatternCamera::new(settings)))
            }
        }
    }
}
