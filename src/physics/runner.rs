//! Fixed-step runner: turns wall-clock frame time into whole physics steps.
//!
//! Physics stepping and scene drawing are toggled independently, the same way
//! an engine runner and a renderer are started and stopped separately.

use log::{info, trace};
use std::time::Duration;

/// Default fixed step (60 Hz)
pub const FIXED_STEP: Duration = Duration::from_nanos(16_666_667);

/// Max steps per frame; older backlog is dropped after a stall
pub const MAX_SUBSTEPS: u32 = 4;

#[derive(Debug, Clone)]
pub struct Runner {
    step: Duration,
    accumulator: Duration,
    max_substeps: u32,
    engine_running: bool,
    render_running: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(FIXED_STEP)
    }
}

impl Runner {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
            max_substeps: MAX_SUBSTEPS,
            engine_running: true,
            render_running: true,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Number of fixed steps to run for `elapsed` wall time (0 when stopped)
    pub fn steps_for(&mut self, elapsed: Duration) -> u32 {
        if !self.engine_running {
            return 0;
        }
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_substeps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_substeps && self.accumulator >= self.step {
            trace!("Runner dropping {:?} of backlog", self.accumulator);
            self.accumulator = Duration::ZERO;
        }
        steps
    }

    // ========== Control surface ==========

    pub fn start_engine(&mut self) {
        if !self.engine_running {
            info!("Physics engine started");
        }
        self.engine_running = true;
    }

    pub fn stop_engine(&mut self) {
        if self.engine_running {
            info!("Physics engine stopped");
        }
        self.engine_running = false;
        self.accumulator = Duration::ZERO;
    }

    pub fn start_renderer(&mut self) {
        if !self.render_running {
            info!("Scene renderer started");
        }
        self.render_running = true;
    }

    pub fn stop_renderer(&mut self) {
        if self.render_running {
            info!("Scene renderer stopped");
        }
        self.render_running = false;
    }

    pub fn is_engine_running(&self) -> bool {
        self.engine_running
    }

    pub fn is_renderer_running(&self) -> bool {
        self.render_running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_partial_frames() {
        let mut runner = Runner::new(Duration::from_millis(10));
        assert_eq!(runner.steps_for(Duration::from_millis(7)), 0);
        assert_eq!(runner.steps_for(Duration::from_millis(7)), 1);
        assert_eq!(runner.steps_for(Duration::from_millis(26)), 3);
    }

    #[test]
    fn test_caps_substeps_after_stall() {
        let mut runner = Runner::new(Duration::from_millis(10));
        assert_eq!(runner.steps_for(Duration::from_secs(1)), MAX_SUBSTEPS);
        // Backlog dropped
        assert_eq!(runner.steps_for(Duration::from_millis(5)), 0);
    }

    #[test]
    fn test_engine_and_renderer_toggle_independently() {
        let mut runner = Runner::default();
        runner.stop_engine();
        assert!(!runner.is_engine_running());
        assert!(runner.is_renderer_running());
        assert_eq!(runner.steps_for(Duration::from_secs(1)), 0);

        runner.stop_renderer();
        runner.start_engine();
        assert!(runner.is_engine_running());
        assert!(!runner.is_renderer_running());
        assert_eq!(runner.steps_for(FIXED_STEP), 1);
    }
}
