//! Physics canvas: draws the scene's bodies, sprites and constraints.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};

use crate::physics::{Shape, World};
use crate::scene::Scene;

const BACKGROUND: Color32 = Color32::from_rgb(20, 22, 28);
const BODY_FILL: Color32 = Color32::from_rgb(70, 80, 100);
const CONSTRAINT_COLOR: Color32 = Color32::from_rgb(200, 200, 200);

/// World-to-screen mapping that fits the scene into a rect
#[derive(Debug, Clone, Copy)]
pub struct ViewTransform {
    pub origin: Pos2,
    pub scale: f32,
}

impl ViewTransform {
    pub fn fit(scene_size: glam::Vec2, available: Vec2) -> Self {
        let scale = (available.x / scene_size.x).min(available.y / scene_size.y).max(0.01);
        Self {
            origin: Pos2::ZERO,
            scale,
        }
    }

    pub fn to_screen(&self, p: glam::Vec2) -> Pos2 {
        self.origin + Vec2::new(p.x, p.y) * self.scale
    }
}

pub fn render(ui: &mut egui::Ui, scene: &Scene) {
    let mut transform = ViewTransform::fit(scene.size(), ui.available_size());
    let size = Vec2::new(scene.size().x, scene.size().y) * transform.scale;
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    transform.origin = rect.min;

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, BACKGROUND);

    if !scene.is_renderer_running() {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "Renderer stopped",
            FontId::proportional(16.0),
            Color32::GRAY,
        );
        return;
    }

    draw_world(&painter, scene.world(), &transform);
}

fn draw_world(painter: &egui::Painter, world: &World, t: &ViewTransform) {
    let stroke = Stroke::new(1.5, CONSTRAINT_COLOR);
    for c in world.constraints() {
        if let Some((a, b)) = world.anchors(c) {
            painter.line_segment([t.to_screen(a), t.to_screen(b)], stroke);
        }
    }

    for (_, body) in world.bodies().filter(|(_, b)| b.visible) {
        let center = t.to_screen(body.position);
        let fill = body
            .sprite
            .as_ref()
            .map(|s| Color32::from_rgb(s.color[0], s.color[1], s.color[2]))
            .unwrap_or(BODY_FILL);

        match body.shape {
            Shape::Circle { radius } => {
                painter.circle_filled(center, radius * t.scale, fill);
            }
            Shape::Rect { width, height } => {
                let rect = Rect::from_center_size(center, Vec2::new(width, height) * t.scale);
                painter.rect_filled(rect, 2.0, fill);
            }
        }

        if let Some(sprite) = &body.sprite
            && !sprite.text.is_empty()
        {
            let size = body.shape.half_extents().y * 1.2 * t.scale;
            painter.text(
                center,
                Align2::CENTER_CENTER,
                &sprite.text,
                FontId::monospace(size.max(6.0)),
                Color32::BLACK,
            );
        }
    }
}
