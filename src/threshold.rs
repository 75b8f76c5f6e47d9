// Cycle thresholds: how long a phase is held before the next toggle is due

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::config::CycleConfig;

/// Supplies the hold duration for each phase.
///
/// Called once when the cycle loop starts and again after every toggle.
pub trait ThresholdSource: Send {
    fn next_threshold(&mut self) -> Duration;
}

/// Uniformly random thresholds in `[min, max)` milliseconds
#[derive(Debug)]
pub struct RandomThreshold {
    min_ms: u64,
    max_ms: u64,
    rng: StdRng,
}

impl RandomThreshold {
    /// Bounds must satisfy `min_ms < max_ms`; [`CycleConfig::validate`] enforces this.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms,
            max_ms,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence for tests and simulations
    pub fn seeded(min_ms: u64, max_ms: u64, seed: u64) -> Self {
        Self {
            min_ms,
            max_ms,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &CycleConfig) -> Self {
        Self::new(config.min_cycle_ms, config.max_cycle_ms)
    }
}

impl ThresholdSource for RandomThreshold {
    fn next_threshold(&mut self) -> Duration {
        Duration::from_millis(self.rng.random_range(self.min_ms..self.max_ms))
    }
}

/// Always the same threshold. A zero threshold toggles on every poll.
#[derive(Debug, Clone, Copy)]
pub struct FixedThreshold(pub Duration);

impl ThresholdSource for FixedThreshold {
    fn next_threshold(&mut self) -> Duration {
        self.0
    }
}

impl<F> ThresholdSource for F
where
    F: FnMut() -> Duration + Send,
{
    fn next_threshold(&mut self) -> Duration {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_threshold_stays_in_bounds() {
        let mut source = RandomThreshold::seeded(4000, 6000, 7);
        for _ in 0..10_000 {
            let threshold = source.next_threshold();
            assert!(threshold >= Duration::from_millis(4000));
            assert!(threshold < Duration::from_millis(6000));
        }
    }

    #[test]
    fn test_random_threshold_honors_configured_bounds() {
        let config = CycleConfig {
            min_cycle_ms: 10,
            max_cycle_ms: 12,
            poll_interval_ms: 1,
        };
        let mut source = RandomThreshold::from_config(&config);
        for _ in 0..1000 {
            let ms = source.next_threshold().as_millis();
            assert!(ms == 10 || ms == 11, "{ms} outside [10, 12)");
        }
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = RandomThreshold::seeded(4000, 6000, 42);
        let mut b = RandomThreshold::seeded(4000, 6000, 42);
        for _ in 0..20 {
            assert_eq!(a.next_threshold(), b.next_threshold());
        }
    }

    #[test]
    fn test_fixed_and_closure_sources() {
        let mut fixed = FixedThreshold(Duration::ZERO);
        assert_eq!(fixed.next_threshold(), Duration::ZERO);

        let mut step = 0u64;
        let mut ramp = move || {
            step += 1;
            Duration::from_millis(step)
        };
        assert_eq!(ramp.next_threshold(), Duration::from_millis(1));
        assert_eq!(ramp.next_threshold(), Duration::from_millis(2));
    }
}
