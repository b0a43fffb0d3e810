use eframe::egui;

use crate::core::StatsSample;

/// Values shown in the status bar
#[derive(Debug, Clone, Default)]
pub struct StatusInfo {
    pub inference: Option<StatsSample>,
    pub ui_fps: f32,
    pub detector: Option<String>,
    pub camera_size: Option<(u32, u32)>,
    pub poses: usize,
    pub gravity: Option<glam::Vec2>,
    pub physics_time: f64,
}

/// Render status bar at bottom of screen
pub fn render(ctx: &egui::Context, info: &StatusInfo) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.monospace(info.detector.as_deref().unwrap_or("No detector"));

            ui.separator();

            match info.camera_size {
                Some((w, h)) => ui.monospace(format!("{:>4}x{:<4}", w, h)),
                None => ui.monospace("   0x0   "),
            };

            ui.separator();

            match info.inference {
                Some(s) => ui.monospace(format!("Model {:>5.1} fps {:>6.1} ms", s.fps, s.average_ms)),
                None => ui.monospace("Model   --- fps    --- ms"),
            };

            ui.separator();

            ui.monospace(format!("UI {:>5.1} fps", info.ui_fps));

            ui.separator();

            ui.monospace(format!("Poses: {}", info.poses));

            ui.separator();

            ui.monospace(format!("t={:>7.1}s", info.physics_time));

            if let Some(g) = info.gravity {
                ui.separator();
                ui.monospace(format!("Gravity {}", gravity_label(g)));
            }
        });
    });
}

fn gravity_label(g: glam::Vec2) -> &'static str {
    if g.y > 0.5 {
        "down"
    } else if g.y < -0.5 {
        "up"
    } else if g.x > 0.5 {
        "right"
    } else if g.x < -0.5 {
        "left"
    } else {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_label() {
        assert_eq!(gravity_label(glam::Vec2::Y), "down");
        assert_eq!(gravity_label(glam::Vec2::NEG_X), "left");
        assert_eq!(gravity_label(glam::Vec2::ZERO), "none");
    }
}
