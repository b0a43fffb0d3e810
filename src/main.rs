use posefield::bridge::PoseBridge;
use posefield::camera::{SizeOption, SourceCameraFactory};
use posefield::cli::Args;
use posefield::core::control_events::*;
use posefield::core::event_bus::{Event, EventBus, downcast_event};
use posefield::core::render_loop::{Alert, RenderLoop};
use posefield::core::state::{AppState, Settings, ensure_model_param, parse_query};
use posefield::paths;
use posefield::pose::{Pose, ReplayFactory};
use posefield::scene::{Scene, SceneKind, default_scene_size};
use posefield::widgets::{self, CameraView, OverlayStyle, SceneControls, StatusInfo};

use clap::Parser;
use eframe::egui;
use log::{debug, info, warn};
use std::time::Instant;

type AppLoop = RenderLoop<ReplayFactory, SourceCameraFactory>;

/// Main application state
struct PoseFieldApp {
    state: AppState,
    event_bus: EventBus,
    render_loop: AppLoop,
    scene: Scene,
    bridge: PoseBridge,
    camera_view: CameraView,
    /// Poses of the last rendered frame (overlay only)
    last_poses: Vec<Pose>,
    alerts: Vec<Alert>,
    last_update: Option<Instant>,
    ui_fps: f32,
}

impl PoseFieldApp {
    fn new(state: AppState, render_loop: AppLoop, scene: Scene) -> Self {
        let bridge = PoseBridge::new(render_loop.layout());
        Self {
            state,
            event_bus: EventBus::new(),
            render_loop,
            scene,
            bridge,
            camera_view: CameraView::new(),
            last_poses: Vec::new(),
            alerts: Vec::new(),
            last_update: None,
            ui_fps: 0.0,
        }
    }

    /// Drain control events: state setters first, then app-level actions
    fn handle_events(&mut self) {
        for event in self.event_bus.poll() {
            if self.state.apply_event(&event) {
                continue;
            }
            if let Some(e) = downcast_event::<SetEngineRunningEvent>(&event) {
                if e.0 {
                    self.scene.start_engine();
                } else {
                    self.scene.stop_engine();
                }
            } else if let Some(e) = downcast_event::<SetRendererRunningEvent>(&event) {
                if e.0 {
                    self.scene.start_renderer();
                } else {
                    self.scene.stop_renderer();
                }
            } else if let Some(e) = downcast_event::<LoadRecordingEvent>(&event) {
                self.render_loop.detector_factory_mut().set_source(e.0.clone());
                self.render_loop.reload_detector();
            } else if let Some(e) = downcast_event::<LoadFramesEvent>(&event) {
                info!("Frame source: {}", e.0);
                self.render_loop.camera_factory_mut().set_frames(e.0.clone());
                self.render_loop.reload_camera();
            } else if downcast_event::<DismissAlertEvent>(&event).is_some() {
                if !self.alerts.is_empty() {
                    self.alerts.remove(0);
                }
            } else {
                debug!("Unhandled event: {}", (*event).type_name());
            }
        }
    }

    fn step(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let elapsed = self.last_update.map(|t| now - t).unwrap_or_default();
        self.last_update = Some(now);
        if elapsed.as_secs_f32() > 0.0 {
            let fps = 1.0 / elapsed.as_secs_f32();
            self.ui_fps = if self.ui_fps == 0.0 { fps } else { self.ui_fps * 0.9 + fps * 0.1 };
        }

        let output = self.render_loop.tick(&mut self.state, now);
        self.alerts.extend(self.render_loop.take_alerts());

        if let Some(frame) = &output.frame {
            self.camera_view.update_texture(ctx, frame);
            self.last_poses = output.poses;
            self.bridge.set_layout(output.layout);
            if let Some(attractor) = self.scene.attractor() {
                self.bridge.apply(&self.last_poses, self.scene.world_mut(), attractor);
            }
        }

        self.scene.update(elapsed);
    }

    fn render_alert(&self, ctx: &egui::Context) {
        let Some(alert) = self.alerts.first() else {
            return;
        };
        egui::Window::new(alert.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&alert.message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    self.event_bus.emit(DismissAlertEvent);
                }
            });
    }

    fn status_info(&self) -> StatusInfo {
        StatusInfo {
            inference: self.render_loop.latest_stats(),
            ui_fps: self.ui_fps,
            detector: self.render_loop.detector_name(),
            camera_size: self.render_loop.camera_size(),
            poses: self.last_poses.len(),
            gravity: (self.scene.kind() == SceneKind::Falling).then(|| self.scene.gravity()),
            physics_time: self.scene.world().timestamp(),
        }
    }
}

impl eframe::App for PoseFieldApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process all control events before the loop checks for changes
        self.handle_events();
        self.step(ctx);

        let emitter = self.event_bus.emitter();
        let controls = SceneControls {
            engine_running: self.scene.is_engine_running(),
            renderer_running: self.scene.is_renderer_running(),
        };

        egui::SidePanel::left("controls").resizable(true).show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                widgets::control_panel::render(ui, &self.state, controls, &emitter);
            });
        });

        widgets::status::render(ctx, &self.status_info());

        let style = OverlayStyle {
            layout: self.render_loop.layout(),
            score_threshold: self.state.model_settings().score_threshold,
            tracking: self.state.model_settings().enable_tracking,
        };
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                self.camera_view.render(&mut cols[0], &self.last_poses, &style);
                widgets::physics_view::render(&mut cols[1], &self.scene);
            });
        });

        self.render_alert(ctx);

        if self.render_loop.frame_requested() {
            ctx.request_repaint();
        }
    }
}

/// Settings file, CLI and query merged into the startup state
fn startup_state(args: &Args, path_config: &paths::PathConfig) -> AppState {
    let settings_path = paths::settings_file(args.config.as_deref(), path_config);
    let settings = if settings_path.exists() {
        Settings::load(&settings_path).unwrap_or_else(|e| {
            warn!("{:#}, using defaults", e);
            Settings::default()
        })
    } else {
        if args.config.is_some() {
            warn!("Settings file {} not found, using defaults", settings_path.display());
        }
        Settings::default()
    };

    let mut state = AppState::from_settings(&settings);
    let query = ensure_model_param(&args.startup_query(), settings.model);
    info!("Startup query: {}", query);
    state.apply_query(&parse_query(&query));

    if let Some(fps) = args.fps {
        state.set_target_fps(fps);
    }
    if let Some(size) = &args.size {
        match size.parse::<SizeOption>() {
            Ok(size) => state.set_size_option(size),
            Err(e) => warn!("{}", e),
        }
    }
    if let Some(max_poses) = args.max_poses {
        state.set_max_poses(max_poses);
    }
    if let Some(url) = &args.model_url {
        state.set_custom_model_url(url);
    }
    if args.tracking {
        state.set_tracking(true);
    }
    state
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let path_config = paths::PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = paths::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| paths::data_file(paths::LOG_FILE, &path_config));
        let file = std::fs::File::create(&log_path)?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }

    info!("PoseField starting...");
    debug!("Command-line args: {:?}", args);
    info!(
        "Config path: {}",
        paths::config_file(paths::SETTINGS_FILE, &path_config).display()
    );

    let mut state = startup_state(&args, &path_config);

    let scene_kind = args.scene.parse::<SceneKind>().unwrap_or_else(|e| {
        warn!("{}, using scene {}", e, SceneKind::default());
        SceneKind::default()
    });
    let scene = Scene::build(scene_kind, default_scene_size());

    let mut render_loop = RenderLoop::new(
        ReplayFactory::new(args.poses.clone()),
        SourceCameraFactory::new(args.frames.clone()),
    );
    render_loop.start(&mut state);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!(
                "PoseField v{} • {} • scene {}",
                env!("CARGO_PKG_VERSION"),
                state.model(),
                scene_kind.number()
            ))
            .with_inner_size([1400.0, 760.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "PoseField",
        native_options,
        Box::new(move |_cc| Ok(Box::new(PoseFieldApp::new(state, render_loop, scene)))),
    )?;

    Ok(())
}
