//! Control panel: camera, model and backend settings plus scene switches.
//!
//! The panel never touches `AppState` directly. Every edit is emitted as a
//! control event and applied on the next frame.

use eframe::egui;

use crate::camera::SizeOption;
use crate::core::EventEmitter;
use crate::core::control_events::*;
use crate::core::state::{AppState, MAX_TARGET_FPS, MIN_TARGET_FPS};
use crate::pose::backend::flag_values;
use crate::pose::model::MAX_POSES_LIMIT;
use crate::pose::{FlagValue, ModelKind};

/// Scene switches shown in the panel
#[derive(Debug, Clone, Copy)]
pub struct SceneControls {
    pub engine_running: bool,
    pub renderer_running: bool,
}

pub fn render(ui: &mut egui::Ui, state: &AppState, scene: SceneControls, emitter: &EventEmitter) {
    egui::CollapsingHeader::new("Camera")
        .default_open(true)
        .show(ui, |ui| render_camera(ui, state, emitter));

    egui::CollapsingHeader::new("Model")
        .default_open(true)
        .show(ui, |ui| render_model(ui, state, emitter));

    egui::CollapsingHeader::new("Backend")
        .default_open(true)
        .show(ui, |ui| render_backend(ui, state, emitter));

    egui::CollapsingHeader::new("Scene")
        .default_open(true)
        .show(ui, |ui| render_scene(ui, scene, emitter));
}

fn render_camera(ui: &mut egui::Ui, state: &AppState, emitter: &EventEmitter) {
    let camera = state.camera();

    ui.horizontal(|ui| {
        ui.label("Target FPS:");
        let mut fps = camera.target_fps;
        let response = ui.add(egui::Slider::new(&mut fps, MIN_TARGET_FPS..=MAX_TARGET_FPS));
        if response.changed() {
            emitter.emit(SetTargetFpsEvent(fps));
        }
    });

    ui.horizontal(|ui| {
        ui.label("Size:");
        let mut size = camera.size_option;
        egui::ComboBox::from_id_salt("size_option")
            .selected_text(size.to_string())
            .show_ui(ui, |ui| {
                for option in SizeOption::ALL {
                    ui.selectable_value(&mut size, option, option.to_string());
                }
            });
        if size != camera.size_option {
            emitter.emit(SetSizeOptionEvent(size));
        }
    });

    if ui.button("Open frames...").clicked()
        && let Some(dir) = rfd::FileDialog::new().set_title("Frame folder").pick_folder()
    {
        emitter.emit(LoadFramesEvent(dir.display().to_string()));
    }
}

fn render_model(ui: &mut egui::Ui, state: &AppState, emitter: &EventEmitter) {
    let model = state.model();
    let settings = state.model_settings();

    ui.horizontal(|ui| {
        ui.label("Model:");
        let mut selected = model;
        egui::ComboBox::from_id_salt("model_kind")
            .selected_text(model.as_str())
            .show_ui(ui, |ui| {
                for kind in ModelKind::ALL {
                    ui.selectable_value(&mut selected, kind, kind.as_str());
                }
            });
        if selected != model {
            emitter.emit(SetModelEvent(selected));
        }
    });

    let types = model.pose_types();
    if !types.is_empty() {
        ui.horizontal(|ui| {
            ui.label("Type:");
            let mut selected = settings.model_type.clone();
            egui::ComboBox::from_id_salt("model_type")
                .selected_text(&selected)
                .show_ui(ui, |ui| {
                    for t in types {
                        ui.selectable_value(&mut selected, t.to_string(), *t);
                    }
                });
            if selected != settings.model_type {
                emitter.emit(SetModelTypeEvent(selected));
            }
        });
    }

    if model == ModelKind::MoveNet {
        render_custom_url(ui, &settings.custom_model_url, emitter);
    }

    if state.is_multi_pose() {
        ui.horizontal(|ui| {
            ui.label("Max poses:");
            let mut max_poses = settings.max_poses;
            if ui.add(egui::Slider::new(&mut max_poses, 1..=MAX_POSES_LIMIT)).changed() {
                emitter.emit(SetMaxPosesEvent(max_poses));
            }
        });
        let mut tracking = settings.enable_tracking;
        if ui.checkbox(&mut tracking, "Enable tracking").changed() {
            emitter.emit(SetTrackingEvent(tracking));
        }
    }

    ui.horizontal(|ui| {
        ui.label("Score threshold:");
        let mut threshold = settings.score_threshold;
        if ui.add(egui::Slider::new(&mut threshold, 0.0..=1.0).step_by(0.05)).changed() {
            emitter.emit(SetScoreThresholdEvent(threshold));
        }
    });

    if ui.button("Open pose recording...").clicked()
        && let Some(path) = rfd::FileDialog::new()
            .set_title("Pose recording")
            .add_filter("Pose recording", &["json"])
            .pick_file()
    {
        emitter.emit(LoadRecordingEvent(path));
    }
}

/// URL field; edits are buffered in egui memory and committed on focus loss
fn render_custom_url(ui: &mut egui::Ui, current: &str, emitter: &EventEmitter) {
    ui.horizontal(|ui| {
        ui.label("Model URL:");
        let id = ui.id().with("custom_model_url");
        let mut url = ui
            .data_mut(|d| d.get_temp::<String>(id))
            .unwrap_or_else(|| current.to_string());
        let response = ui.text_edit_singleline(&mut url);
        if response.has_focus() {
            ui.data_mut(|d| d.insert_temp(id, url));
        } else {
            if response.lost_focus() && url != current {
                emitter.emit(SetCustomModelUrlEvent(url));
            }
            ui.data_mut(|d| d.remove::<String>(id));
        }
    });
}

fn render_backend(ui: &mut egui::Ui, state: &AppState, emitter: &EventEmitter) {
    let backend = state.backend();

    ui.horizontal(|ui| {
        ui.label("Backend:");
        let mut selected = backend;
        egui::ComboBox::from_id_salt("backend")
            .selected_text(backend.as_str())
            .show_ui(ui, |ui| {
                for b in state.model().backends() {
                    ui.selectable_value(&mut selected, *b, b.as_str());
                }
            });
        if selected != backend {
            emitter.emit(SetBackendEvent(selected));
        }
    });

    for name in backend.tunable_flags() {
        let Some(value) = state.flags().get(name) else {
            continue;
        };
        match value {
            FlagValue::Bool(mut on) => {
                if ui.checkbox(&mut on, *name).changed() {
                    emitter.emit(SetEnvFlagEvent {
                        name: name.to_string(),
                        value: FlagValue::Bool(on),
                    });
                }
            }
            FlagValue::Number(_) => {
                ui.horizontal(|ui| {
                    ui.label(*name);
                    let mut selected = value;
                    egui::ComboBox::from_id_salt(*name)
                        .selected_text(value.to_string())
                        .show_ui(ui, |ui| {
                            for v in flag_values(name) {
                                ui.selectable_value(&mut selected, v, v.to_string());
                            }
                        });
                    if selected != value {
                        emitter.emit(SetEnvFlagEvent {
                            name: name.to_string(),
                            value: selected,
                        });
                    }
                });
            }
        }
    }
}

fn render_scene(ui: &mut egui::Ui, scene: SceneControls, emitter: &EventEmitter) {
    let mut engine = scene.engine_running;
    if ui.checkbox(&mut engine, "Physics running").changed() {
        emitter.emit(SetEngineRunningEvent(engine));
    }
    let mut renderer = scene.renderer_running;
    if ui.checkbox(&mut renderer, "Draw scene").changed() {
        emitter.emit(SetRendererRunningEvent(renderer));
    }
}
