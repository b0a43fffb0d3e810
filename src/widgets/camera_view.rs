//! Camera canvas: the current video frame with the pose overlay on top.

use eframe::egui::{self, Color32, Pos2, Rect, Stroke, TextureHandle, TextureOptions, Vec2};

use crate::camera::VideoFrame;
use crate::pose::{KeypointLayout, Pose, Side};

const KEYPOINT_RADIUS: f32 = 4.0;
const LINE_WIDTH: f32 = 2.0;

const MIDDLE_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
const LEFT_COLOR: Color32 = Color32::from_rgb(255, 165, 0);
const RIGHT_COLOR: Color32 = Color32::from_rgb(0, 255, 0);

/// Skeleton colours by track id
const TRACK_PALETTE: [Color32; 20] = [
    Color32::from_rgb(0xff, 0xff, 0xff),
    Color32::from_rgb(0x80, 0x00, 0x00),
    Color32::from_rgb(0x46, 0x99, 0x90),
    Color32::from_rgb(0xe6, 0x19, 0x4b),
    Color32::from_rgb(0x42, 0xd4, 0xf4),
    Color32::from_rgb(0xfa, 0xbe, 0xd4),
    Color32::from_rgb(0xaa, 0xff, 0xc3),
    Color32::from_rgb(0x9a, 0x63, 0x24),
    Color32::from_rgb(0x00, 0x00, 0x75),
    Color32::from_rgb(0xf5, 0x82, 0x31),
    Color32::from_rgb(0x43, 0x63, 0xd8),
    Color32::from_rgb(0xff, 0xd8, 0xb1),
    Color32::from_rgb(0xdc, 0xbe, 0xff),
    Color32::from_rgb(0x80, 0x80, 0x00),
    Color32::from_rgb(0xff, 0xe1, 0x19),
    Color32::from_rgb(0x91, 0x1e, 0xb4),
    Color32::from_rgb(0xbf, 0xef, 0x45),
    Color32::from_rgb(0xf0, 0x32, 0xe6),
    Color32::from_rgb(0x3c, 0xb4, 0x4b),
    Color32::from_rgb(0xa9, 0xa9, 0xa9),
];

/// Overlay options for the current model
#[derive(Debug, Clone, Copy)]
pub struct OverlayStyle {
    pub layout: KeypointLayout,
    pub score_threshold: f32,
    pub tracking: bool,
}

pub fn side_color(side: Side) -> Color32 {
    match side {
        Side::Middle => MIDDLE_COLOR,
        Side::Left => LEFT_COLOR,
        Side::Right => RIGHT_COLOR,
    }
}

/// Skeleton colour: white, or from the palette by track id
pub fn skeleton_color(pose: &Pose, tracking: bool) -> Color32 {
    match pose.id {
        Some(id) if tracking => TRACK_PALETTE[id as usize % TRACK_PALETTE.len()],
        _ => Color32::WHITE,
    }
}

#[derive(Default)]
pub struct CameraView {
    texture: Option<TextureHandle>,
    frame_size: Option<(u32, u32)>,
    last_index: Option<u64>,
}

impl CameraView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload the frame if it differs from the last one
    pub fn update_texture(&mut self, ctx: &egui::Context, frame: &VideoFrame) {
        let same_size = self.frame_size == Some((frame.width, frame.height));
        if same_size && self.last_index == Some(frame.index) && self.texture.is_some() {
            return;
        }
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            frame.pixels.as_slice(),
        );
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => self.texture = Some(ctx.load_texture("camera", image, TextureOptions::LINEAR)),
        }
        self.frame_size = Some((frame.width, frame.height));
        self.last_index = Some(frame.index);
    }

    pub fn render(&self, ui: &mut egui::Ui, poses: &[Pose], style: &OverlayStyle) {
        let (Some(texture), Some((w, h))) = (&self.texture, self.frame_size) else {
            ui.centered_and_justified(|ui| ui.label("Waiting for camera..."));
            return;
        };

        let available = ui.available_size();
        let scale = (available.x / w as f32).min(available.y / h as f32).max(0.01);
        let size = Vec2::new(w as f32, h as f32) * scale;
        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        let painter = ui.painter_at(rect);
        painter.image(
            texture.id(),
            rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        for pose in poses {
            draw_pose(&painter, rect, scale, pose, style);
        }
    }
}

fn draw_pose(painter: &egui::Painter, rect: Rect, scale: f32, pose: &Pose, style: &OverlayStyle) {
    let to_screen = |x: f32, y: f32| rect.min + Vec2::new(x, y) * scale;
    let visible = |i: usize| pose.keypoint(i).filter(|k| k.confidence() >= style.score_threshold);

    let stroke = Stroke::new(LINE_WIDTH, skeleton_color(pose, style.tracking));
    for &(a, b) in style.layout.adjacent_pairs() {
        if let (Some(ka), Some(kb)) = (visible(a), visible(b)) {
            painter.line_segment([to_screen(ka.x, ka.y), to_screen(kb.x, kb.y)], stroke);
        }
    }

    for i in 0..pose.keypoints.len() {
        if let Some(k) = visible(i) {
            let color = side_color(style.layout.side(i));
            painter.circle(to_screen(k.x, k.y), KEYPOINT_RADIUS, color, Stroke::new(1.0, Color32::WHITE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_colors() {
        assert_eq!(side_color(Side::Middle), Color32::from_rgb(255, 0, 0));
        assert_eq!(side_color(Side::Left), Color32::from_rgb(255, 165, 0));
        assert_eq!(side_color(Side::Right), Color32::from_rgb(0, 255, 0));
    }

    #[test]
    fn test_skeleton_color_by_track() {
        let mut pose = Pose::new(Vec::new());
        assert_eq!(skeleton_color(&pose, true), Color32::WHITE);
        pose.id = Some(3);
        assert_eq!(skeleton_color(&pose, false), Color32::WHITE);
        assert_eq!(skeleton_color(&pose, true), TRACK_PALETTE[3]);
        pose.id = Some(23);
        assert_eq!(skeleton_color(&pose, true), TRACK_PALETTE[3]);
    }
}
