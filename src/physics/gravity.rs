//! Gravity direction cycling on a fixed period of simulated time.

use glam::Vec2;
use log::debug;
use std::time::Duration;

/// Order of gravity directions: down, up, right, left (screen space, y down)
pub const GRAVITY_SEQUENCE: [Vec2; 4] = [Vec2::Y, Vec2::NEG_Y, Vec2::X, Vec2::NEG_X];

/// Default switch period
pub const GRAVITY_PERIOD: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq)]
pub struct GravityCycle {
    period: Duration,
    elapsed: Duration,
    index: usize,
}

impl Default for GravityCycle {
    fn default() -> Self {
        Self::new(GRAVITY_PERIOD)
    }
}

impl GravityCycle {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
            index: 0,
        }
    }

    /// Current gravity direction
    pub fn current(&self) -> Vec2 {
        GRAVITY_SEQUENCE[self.index]
    }

    /// Advance by `dt`. Returns the new direction if it switched.
    pub fn advance(&mut self, dt: Duration) -> Option<Vec2> {
        self.elapsed += dt;
        let mut switched = false;
        while self.elapsed >= self.period {
            self.elapsed -= self.period;
            self.index = (self.index + 1) % GRAVITY_SEQUENCE.len();
            switched = true;
        }
        if switched {
            debug!("Gravity -> {:?}", self.current());
            Some(self.current())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_down() {
        assert_eq!(GravityCycle::default().current(), Vec2::Y);
    }

    #[test]
    fn test_switches_on_period() {
        let mut cycle = GravityCycle::default();
        assert_eq!(cycle.advance(Duration::from_millis(2999)), None);
        assert_eq!(cycle.advance(Duration::from_millis(1)), Some(Vec2::NEG_Y));
        assert_eq!(cycle.advance(Duration::from_secs(3)), Some(Vec2::X));
        assert_eq!(cycle.advance(Duration::from_secs(3)), Some(Vec2::NEG_X));
        assert_eq!(cycle.advance(Duration::from_secs(3)), Some(Vec2::Y));
    }

    #[test]
    fn test_large_step_wraps() {
        let mut cycle = GravityCycle::default();
        // 7s = two switches
        assert_eq!(cycle.advance(Duration::from_secs(7)), Some(Vec2::X));
    }
}
