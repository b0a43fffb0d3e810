//! Image-sequence camera.
//!
//! Source is a glob pattern (`shots/take1.*.png`) or a directory. All frames are
//! decoded and resized to the camera size up front (in parallel), then played
//! back in a loop at the target FPS.

use image::imageops::FilterType;
use log::{debug, trace};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{Camera, CameraError, CameraSettings, VideoFrame};

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "tif", "tiff", "tga", "bmp"];

pub struct ImageSequenceCamera {
    frames: Vec<VideoFrame>,
    width: u32,
    height: u32,
    target_fps: u32,
    started: Option<Instant>,
}

impl ImageSequenceCamera {
    /// Decode all frames of `source` at the configured size
    pub fn open(source: &str, settings: &CameraSettings) -> Result<Self, CameraError> {
        let paths = resolve_paths(source)?;
        if paths.is_empty() {
            return Err(CameraError::NoFrames(source.to_string()));
        }
        let (width, height) = settings.size_option.dimensions();
        debug!("Decoding {} frames from {}", paths.len(), source);

        let pixels: Vec<Vec<u8>> = paths
            .par_iter()
            .map(|path| decode_frame(path, width, height))
            .collect::<Result<_, _>>()?;

        let frames = pixels
            .into_iter()
            .enumerate()
            .map(|(i, px)| VideoFrame::new(width, height, px, i as u64))
            .collect();

        Ok(Self {
            frames,
            width,
            height,
            target_fps: settings.target_fps.max(1),
            started: None,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Camera for ImageSequenceCamera {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_ready(&self) -> bool {
        !self.frames.is_empty()
    }

    fn read_frame(&mut self, now: Instant) -> Option<VideoFrame> {
        if self.frames.is_empty() {
            return None;
        }
        let started = *self.started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let tick = (elapsed * self.target_fps as f64) as u64;
        let slot = (tick % self.frames.len() as u64) as usize;
        trace!("Sequence frame {} (tick {})", slot, tick);

        let mut frame = self.frames[slot].clone();
        frame.index = tick;
        Some(frame)
    }
}

/// Expand a directory or glob pattern into a sorted list of image files
fn resolve_paths(source: &str) -> Result<Vec<PathBuf>, CameraError> {
    let path = Path::new(source);
    let pattern = if path.is_dir() {
        path.join("*").to_string_lossy().into_owned()
    } else {
        source.to_string()
    };

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| CameraError::Glob(format!("{}: {}", pattern, e)))? {
        match entry {
            Ok(p) if is_image(&p) => paths.push(p),
            Ok(_) => {}
            Err(e) => return Err(CameraError::Glob(format!("{}: {}", pattern, e))),
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn decode_frame(path: &Path, width: u32, height: u32) -> Result<Vec<u8>, CameraError> {
    let img = image::open(path).map_err(|e| CameraError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(img.resize_exact(width, height, FilterType::Triangle).to_rgba8().into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SizeOption;
    use std::time::Duration;

    fn write_sequence(dir: &Path, count: usize) {
        std::fs::create_dir_all(dir).unwrap();
        for i in 0..count {
            let shade = (i * 60) as u8;
            let img = image::RgbaImage::from_pixel(8, 6, image::Rgba([shade, 0, 0, 255]));
            img.save(dir.join(format!("frame.{:04}.png", i))).unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();
    }

    #[test]
    fn test_open_directory_and_loop() {
        let dir = std::env::temp_dir().join("posefield_seq_loop");
        let _ = std::fs::remove_dir_all(&dir);
        write_sequence(&dir, 3);

        let settings = CameraSettings {
            target_fps: 10,
            size_option: SizeOption::S360x202,
        };
        let mut cam = ImageSequenceCamera::open(dir.to_str().unwrap(), &settings).unwrap();
        assert_eq!(cam.frame_count(), 3);
        assert_eq!(cam.size(), (360, 202));
        assert!(cam.is_ready());

        let t0 = Instant::now();
        let first = cam.read_frame(t0).unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.pixels.len(), 360 * 202 * 4);

        // 10 fps: 350ms -> tick 3 -> wraps to slot 0
        let wrapped = cam.read_frame(t0 + Duration::from_millis(350)).unwrap();
        assert_eq!(wrapped.index, 3);
        assert_eq!(wrapped.pixels, first.pixels);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_pattern_is_error() {
        let err = ImageSequenceCamera::open("/definitely/not/here/*.png", &CameraSettings::default())
            .err()
            .unwrap();
        assert!(matches!(err, CameraError::NoFrames(_)));
    }
}
