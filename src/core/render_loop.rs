//! Render loop controller.
//!
//! Runs once per UI frame:
//! 1. pending camera changes -> rebuild camera
//! 2. pending model/backend/flag changes -> dispose detector, re-apply the
//!    runtime environment, build a new detector, clear the changes
//! 3. detect-and-render cycle, then request the next frame
//!
//! Detector construction and estimation failures leave the loop running
//! without a detector and are reported through `take_alerts()`.

use anyhow::{Context, Result};
use log::{debug, error, info, trace};
use std::time::Instant;

use super::state::AppState;
use super::stats::{InferenceStats, StatsSample};
use crate::camera::{Camera, CameraFactory, VideoFrame};
use crate::pose::{DetectorFactory, KeypointLayout, ModelOptions, Pose, PoseDetector, RuntimeEnv};

/// User-facing error message
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

/// Result of one loop iteration
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    /// Frame to draw (None while the camera is not ready)
    pub frame: Option<VideoFrame>,
    /// Poses to overlay on this frame
    pub poses: Vec<Pose>,
    /// Newly published inference stats
    pub stats: Option<StatsSample>,
    pub layout: KeypointLayout,
}

/// Next-frame request handle (the loop's `requestAnimationFrame` id)
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    next_id: u64,
    pending: Option<u64>,
}

impl FrameScheduler {
    pub fn schedule(&mut self) -> u64 {
        self.next_id += 1;
        self.pending = Some(self.next_id);
        self.next_id
    }

    pub fn cancel(&mut self) {
        if let Some(id) = self.pending.take() {
            trace!("Frame request {} cancelled", id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

pub struct RenderLoop<D: DetectorFactory, C: CameraFactory> {
    detector_factory: D,
    camera_factory: C,
    camera: Option<Box<dyn Camera>>,
    detector: Option<Box<dyn PoseDetector>>,
    env: RuntimeEnv,
    stats: InferenceStats,
    scheduler: FrameScheduler,
    layout: KeypointLayout,
    model_changed: bool,
    reload_camera: bool,
    reload_detector: bool,
    alerts: Vec<Alert>,
}

impl<D: DetectorFactory, C: CameraFactory> RenderLoop<D, C> {
    pub fn new(detector_factory: D, camera_factory: C) -> Self {
        Self {
            detector_factory,
            camera_factory,
            camera: None,
            detector: None,
            env: RuntimeEnv::new(),
            stats: InferenceStats::default(),
            scheduler: FrameScheduler::default(),
            layout: KeypointLayout::default(),
            model_changed: false,
            reload_camera: false,
            reload_detector: false,
            alerts: Vec::new(),
        }
    }

    /// Initial camera, environment and detector
    pub fn start(&mut self, state: &mut AppState) {
        info!("Render loop starting: {} on {}", state.model(), state.backend());
        self.rebuild_camera(state);
        self.env.apply(state.backend(), state.flags());
        self.detector = self.try_create_detector(state);
        state.take_camera_changes();
        state.take_detector_changes();
        self.scheduler.schedule();
    }

    /// One loop iteration
    pub fn tick(&mut self, state: &mut AppState, now: Instant) -> FrameOutput {
        self.check_updates(state);
        let output = if self.model_changed {
            FrameOutput::default()
        } else {
            self.render_result(state, now)
        };
        self.scheduler.schedule();
        output
    }

    /// Apply pending camera and detector changes
    pub fn check_updates(&mut self, state: &mut AppState) {
        if state.take_camera_changes() || self.reload_camera {
            self.reload_camera = false;
            self.rebuild_camera(state);
        }

        let changes = state.pending();
        if !changes.detector() && !self.reload_detector {
            return;
        }

        self.model_changed = true;
        self.scheduler.cancel();

        if let Some(mut detector) = self.detector.take() {
            info!("Disposing detector {}", detector.name());
            detector.dispose();
        }
        if changes.backend || changes.flags {
            self.env.apply(state.backend(), state.flags());
        }
        self.stats.reset();
        self.detector = self.try_create_detector(state);

        state.take_detector_changes();
        self.reload_detector = false;
        self.model_changed = false;
    }

    /// Detect-and-render cycle for the current camera frame
    pub fn render_result(&mut self, state: &AppState, now: Instant) -> FrameOutput {
        let mut output = FrameOutput {
            layout: self.layout,
            ..Default::default()
        };
        let Some(camera) = self.camera.as_mut() else {
            return output;
        };
        if !camera.is_ready() {
            trace!("Camera not ready, waiting");
            return output;
        }
        let Some(frame) = camera.read_frame(now) else {
            return output;
        };

        let mut poses = Vec::new();
        if let Some(detector) = self.detector.as_mut() {
            self.stats.begin(Instant::now());
            match detector.estimate_poses(&frame, &state.estimation_config()) {
                Ok(found) => {
                    output.stats = self.stats.end(Instant::now());
                    poses = found;
                }
                Err(e) => {
                    self.stats.abort();
                    error!("Pose estimation failed: {:#}", e);
                    if let Some(mut detector) = self.detector.take() {
                        detector.dispose();
                    }
                    self.alert("Pose estimation failed", format!("{:#}", e));
                }
            }
        }

        if !poses.is_empty() && !self.model_changed && !state.pending().detector() {
            trace!("Frame {}: {} poses", frame.index, poses.len());
            output.poses = poses;
        }
        output.frame = Some(frame);
        output
    }

    // ========== Rebuilds ==========

    fn rebuild_camera(&mut self, state: &AppState) {
        self.camera = None;
        match self.camera_factory.create(state.camera()) {
            Ok(camera) => {
                debug!("Camera ready: {:?}", camera.size());
                self.camera = Some(camera);
            }
            Err(e) => {
                error!("Camera setup failed: {:#}", e);
                self.alert("Camera setup failed", format!("{:#}", e));
            }
        }
    }

    fn create_detector(&mut self, state: &AppState) -> Result<Box<dyn PoseDetector>> {
        let config = state.detector_config()?;
        self.layout = config.layout();
        let detector = self
            .detector_factory
            .create(&config, &self.env)
            .with_context(|| format!("Failed to load {}", config.summary()))?;
        info!("Detector ready: {}", detector.name());
        Ok(detector)
    }

    fn try_create_detector(&mut self, state: &AppState) -> Option<Box<dyn PoseDetector>> {
        match self.create_detector(state) {
            Ok(detector) => Some(detector),
            Err(e) => {
                error!("Detector setup failed: {:#}", e);
                self.alert("Detector setup failed", format!("{:#}", e));
                None
            }
        }
    }

    fn alert(&mut self, title: &str, message: String) {
        self.alerts.push(Alert {
            title: title.to_string(),
            message,
        });
    }

    // ========== Access ==========

    /// Rebuild the camera on the next check (frame source switched)
    pub fn reload_camera(&mut self) {
        self.reload_camera = true;
    }

    /// Rebuild the detector on the next check (pose source switched)
    pub fn reload_detector(&mut self) {
        self.reload_detector = true;
    }

    pub fn detector_factory_mut(&mut self) -> &mut D {
        &mut self.detector_factory
    }

    pub fn camera_factory_mut(&mut self) -> &mut C {
        &mut self.camera_factory
    }

    pub fn take_alerts(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    pub fn detector_name(&self) -> Option<String> {
        self.detector.as_ref().map(|d| d.name())
    }

    pub fn camera_size(&self) -> Option<(u32, u32)> {
        self.camera.as_ref().map(|c| c.size())
    }

    pub fn env(&self) -> &RuntimeEnv {
        &self.env
    }

    pub fn layout(&self) -> KeypointLayout {
        self.layout
    }

    pub fn latest_stats(&self) -> Option<StatsSample> {
        self.stats.latest()
    }

    pub fn frame_requested(&self) -> bool {
        self.scheduler.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSettings;
    use crate::pose::{Backend, DetectorConfig, EstimationConfig, Keypoint};
    use anyhow::bail;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        created: u32,
        disposed: u32,
        estimates: u32,
        cameras: u32,
        last_env_generation: u32,
    }

    struct MockDetector {
        log: Rc<RefCell<Log>>,
        fail_on: Option<u32>,
    }

    impl PoseDetector for MockDetector {
        fn estimate_poses(&mut self, _frame: &VideoFrame, config: &EstimationConfig) -> Result<Vec<Pose>> {
            let mut log = self.log.borrow_mut();
            log.estimates += 1;
            if Some(log.estimates) == self.fail_on {
                bail!("inference crashed");
            }
            Ok((0..config.max_poses)
                .map(|_| Pose::new(vec![Keypoint::new(1.0, 2.0, Some(0.9))]))
                .collect())
        }

        fn dispose(&mut self) {
            self.log.borrow_mut().disposed += 1;
        }

        fn name(&self) -> String {
            "mock".into()
        }
    }

    struct MockFactory {
        log: Rc<RefCell<Log>>,
        fail: bool,
        fail_on: Option<u32>,
    }

    impl DetectorFactory for MockFactory {
        fn create(&mut self, _config: &DetectorConfig, env: &RuntimeEnv) -> Result<Box<dyn PoseDetector>> {
            if self.fail {
                bail!("model download failed");
            }
            let mut log = self.log.borrow_mut();
            log.created += 1;
            log.last_env_generation = env.generation();
            Ok(Box::new(MockDetector {
                log: Rc::clone(&self.log),
                fail_on: self.fail_on,
            }))
        }
    }

    struct MockCamera {
        settings: CameraSettings,
        ready: bool,
    }

    impl Camera for MockCamera {
        fn size(&self) -> (u32, u32) {
            self.settings.size_option.dimensions()
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn read_frame(&mut self, _now: Instant) -> Option<VideoFrame> {
            let (w, h) = self.size();
            Some(VideoFrame::solid(w, h, [0, 0, 0, 255], 0))
        }
    }

    struct MockCameraFactory {
        log: Rc<RefCell<Log>>,
        ready: bool,
    }

    impl CameraFactory for MockCameraFactory {
        fn create(&mut self, settings: &CameraSettings) -> Result<Box<dyn Camera>> {
            self.log.borrow_mut().cameras += 1;
            Ok(Box::new(MockCamera {
                settings: *settings,
                ready: self.ready,
            }))
        }
    }

    type MockLoop = RenderLoop<MockFactory, MockCameraFactory>;

    fn setup(fail: bool, fail_on: Option<u32>) -> (MockLoop, AppState, Rc<RefCell<Log>>) {
        setup_camera(fail, fail_on, true)
    }

    fn setup_camera(fail: bool, fail_on: Option<u32>, ready: bool) -> (MockLoop, AppState, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let factory = MockFactory {
            log: Rc::clone(&log),
            fail,
            fail_on,
        };
        let camera_factory = MockCameraFactory {
            log: Rc::clone(&log),
            ready,
        };
        let mut render_loop = RenderLoop::new(factory, camera_factory);
        let mut state = AppState::default();
        render_loop.start(&mut state);
        (render_loop, state, log)
    }

    #[test]
    fn test_start_builds_everything() {
        let (render_loop, state, log) = setup(false, None);
        assert!(render_loop.has_detector());
        assert_eq!(log.borrow().created, 1);
        assert_eq!(log.borrow().cameras, 1);
        assert_eq!(render_loop.env().backend(), Some(state.backend()));
        assert!(render_loop.frame_requested());
    }

    #[test]
    fn test_backend_change_rebuilds_detector() {
        let (mut render_loop, mut state, log) = setup(false, None);
        state.set_backend(Backend::TfjsWasm);
        assert!(state.pending().backend);

        render_loop.tick(&mut state, Instant::now());

        let log = log.borrow();
        assert_eq!(log.disposed, 1);
        assert_eq!(log.created, 2);
        assert_eq!(log.last_env_generation, 2);
        assert_eq!(render_loop.env().backend(), Some(Backend::TfjsWasm));
        assert!(render_loop.has_detector());
        assert!(!state.pending().detector());
        assert!(!render_loop.model_changed);
    }

    #[test]
    fn test_model_type_change_keeps_env() {
        let (mut render_loop, mut state, log) = setup(false, None);
        state.set_model_type("thunder");
        render_loop.check_updates(&mut state);
        assert_eq!(log.borrow().created, 2);
        // Environment untouched without backend/flag changes
        assert_eq!(render_loop.env().generation(), 1);
    }

    #[test]
    fn test_detection_failure_drops_detector() {
        let (mut render_loop, mut state, log) = setup(false, Some(1));

        let out = render_loop.tick(&mut state, Instant::now());
        assert!(!render_loop.has_detector());
        assert!(out.frame.is_some());
        assert!(out.poses.is_empty());
        assert_eq!(log.borrow().disposed, 1);

        let alerts = render_loop.take_alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("inference crashed"));

        // Next frame: camera only, no re-creation
        let out = render_loop.tick(&mut state, Instant::now());
        assert!(out.frame.is_some());
        assert!(out.poses.is_empty());
        assert_eq!(log.borrow().estimates, 1);
        assert_eq!(log.borrow().created, 1);
    }

    #[test]
    fn test_factory_failure_alerts() {
        let (mut render_loop, mut state, _log) = setup(true, None);
        assert!(!render_loop.has_detector());
        let alerts = render_loop.take_alerts();
        assert!(alerts[0].message.contains("model download failed"));

        let out = render_loop.tick(&mut state, Instant::now());
        assert!(out.frame.is_some());
        assert!(out.poses.is_empty());
    }

    #[test]
    fn test_poses_forwarded() {
        let (mut render_loop, mut state, _log) = setup(false, None);
        state.set_model_type("multipose");
        state.set_max_poses(3);
        let out = render_loop.tick(&mut state, Instant::now());
        assert_eq!(out.poses.len(), 3);
        assert_eq!(out.layout, KeypointLayout::Coco17);
    }

    #[test]
    fn test_camera_not_ready_skips_detection() {
        let (mut render_loop, mut state, log) = setup_camera(false, None, false);
        let out = render_loop.tick(&mut state, Instant::now());
        assert!(out.frame.is_none());
        assert!(out.poses.is_empty());
        assert_eq!(log.borrow().estimates, 0);
        // Still waiting for the next frame
        assert!(render_loop.frame_requested());
    }

    #[test]
    fn test_pending_model_change_hides_poses() {
        let (mut render_loop, mut state, log) = setup(false, None);
        state.set_model_type("thunder");
        assert!(state.pending().detector());

        let out = render_loop.render_result(&state, Instant::now());
        assert!(out.frame.is_some());
        assert!(out.poses.is_empty());
        assert_eq!(log.borrow().estimates, 1);
    }

    #[test]
    fn test_camera_change_rebuilds_camera_only() {
        let (mut render_loop, mut state, log) = setup(false, None);
        state.set_size_option(crate::camera::SizeOption::S360x202);
        render_loop.tick(&mut state, Instant::now());
        assert_eq!(log.borrow().cameras, 2);
        assert_eq!(log.borrow().created, 1);
        assert_eq!(render_loop.camera_size(), Some((360, 202)));
    }

    #[test]
    fn test_reload_detector_request() {
        let (mut render_loop, mut state, log) = setup(false, None);
        render_loop.reload_detector();
        render_loop.tick(&mut state, Instant::now());
        assert_eq!(log.borrow().created, 2);
        assert_eq!(log.borrow().disposed, 1);
    }

    #[test]
    fn test_scheduler_cancel() {
        let mut scheduler = FrameScheduler::default();
        assert_eq!(scheduler.schedule(), 1);
        scheduler.cancel();
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.schedule(), 2);
    }
}
