//! Synthetic camera: a dark gradient with a sweeping bar.
//!
//! Used when no frame source is configured, so the loop and the overlay still
//! have something to draw on.

use std::time::Instant;

use super::{Camera, CameraSettings, VideoFrame};

/// Seconds for the bar to cross the frame
const SWEEP_SECONDS: f64 = 4.0;

pub struct TestPatternCamera {
    width: u32,
    height: u32,
    target_fps: u32,
    started: Option<Instant>,
}

impl TestPatternCamera {
    pub fn new(settings: &CameraSettings) -> Self {
        let (width, height) = settings.size_option.dimensions();
        Self {
            width,
            height,
            target_fps: settings.target_fps.max(1),
            started: None,
        }
    }

    fn render(&self, bar_x: u32) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut pixels = vec![0u8; w * h * 4];
        for (y, row) in pixels.chunks_mut(w * 4).enumerate() {
            let shade = (24 + y * 40 / h.max(1)) as u8;
            for (x, px) in row.chunks_mut(4).enumerate() {
                let on_bar = (x as i64 - bar_x as i64).abs() < 4;
                if on_bar {
                    px.copy_from_slice(&[90, 90, 110, 255]);
                } else {
                    px.copy_from_slice(&[shade, shade, shade + 8, 255]);
                }
            }
        }
        pixels
    }
}

impl Camera for TestPatternCamera {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn read_frame(&mut self, now: Instant) -> Option<VideoFrame> {
        let started = *self.started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let tick = (elapsed * self.target_fps as f64) as u64;
        let phase = (elapsed / SWEEP_SECONDS).fract();
        let bar_x = (phase * self.width as f64) as u32;
        Some(VideoFrame::new(self.width, self.height, self.render(bar_x), tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SizeOption;
    use std::time::Duration;

    #[test]
    fn test_frames_have_camera_size() {
        let settings = CameraSettings {
            target_fps: 30,
            size_option: SizeOption::S360x270,
        };
        let mut cam = TestPatternCamera::new(&settings);
        let t0 = Instant::now();
        let a = cam.read_frame(t0).unwrap();
        let b = cam.read_frame(t0 + Duration::from_secs(1)).unwrap();
        assert_eq!((a.width, a.height), (360, 270));
        assert_eq!(a.pixels.len(), 360 * 270 * 4);
        assert_eq!(a.index, 0);
        assert_eq!(b.index, 30);
        assert_ne!(a.pixels, b.pixels);
    }
}
