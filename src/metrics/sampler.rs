use tracing::{debug, trace};

use super::Sample;
use crate::error::StatisticError;

/// Default spacing between samples.
pub const DEFAULT_INTERVAL_MILLIS: u64 = 1_000;

/// Decides, step by step, when a run has crossed the next sampling
/// threshold and what its counter rate was since the previous sample.
///
/// Sampling happens at step granularity: when steps are longer than
/// `interval_millis`, samples are spaced by the step length instead.
#[derive(Debug, Clone)]
pub struct RateSampler {
    interval_millis: u64,
    next_threshold: u64,
    last_elapsed_millis: u64,
    last_counter: u64,
}

impl RateSampler {
    pub fn new(interval_millis: u64) -> Result<Self, StatisticError> {
        if interval_millis == 0 {
            return Err(StatisticError::InvalidArgument(format!(
                "the sampling interval ({interval_millis} ms) must be bigger than 0"
            )));
        }

        Ok(Self {
            interval_millis,
            next_threshold: interval_millis,
            last_elapsed_millis: 0,
            last_counter: 0,
        })
    }

    pub fn interval_millis(&self) -> u64 {
        self.interval_millis
    }

    pub fn next_threshold(&self) -> u64 {
        self.next_threshold
    }

    /// `(elapsed_millis, counter)` of the last emitted sample.
    pub fn last_observation(&self) -> (u64, u64) {
        (self.last_elapsed_millis, self.last_counter)
    }

    /// Back to the freshly constructed state, keeping the interval.
    pub fn reset(&mut self) {
        self.next_threshold = self.interval_millis;
        self.last_elapsed_millis = 0;
        self.last_counter = 0;
    }

    /// Feed one step event. Returns a sample only when `elapsed_millis`
    /// reached the current threshold; otherwise nothing changes.
    pub fn on_step(&mut self, elapsed_millis: u64, counter: u64) -> Option<Sample> {
        if elapsed_millis < self.next_threshold {
            return None;
        }

        let delta_counter = counter.saturating_sub(self.last_counter);
        // Identical timestamps happen when a step is shorter than the
        // clock resolution.
        let delta_millis = match elapsed_millis.saturating_sub(self.last_elapsed_millis) {
            0 => 1,
            d => d,
        };
        let rate_per_second = (u128::from(delta_counter) * 1_000 / u128::from(delta_millis))
            .min(u128::from(u64::MAX)) as u64;

        self.last_counter = counter;
        self.last_elapsed_millis = elapsed_millis;

        self.next_threshold = self.next_threshold.saturating_add(self.interval_millis);
        if self.next_threshold < elapsed_millis {
            debug!(
                elapsed_millis,
                interval_millis = self.interval_millis,
                "sampling backlog, snapping threshold"
            );
            self.next_threshold = elapsed_millis;
        }

        trace!(elapsed_millis, rate_per_second, "rate sample");
        Some(Sample::new(elapsed_millis, rate_per_second))
    }
}

impl Default for RateSampler {
    fn default() -> Self {
        Self {
            interval_millis: DEFAULT_INTERVAL_MILLIS,
            next_threshold: DEFAULT_INTERVAL_MILLIS,
            last_elapsed_millis: 0,
            last_counter: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        assert!(matches!(
            RateSampler::new(0),
            Err(StatisticError::InvalidArgument(_))
        ));
        assert!(RateSampler::new(1).is_ok());
    }

    #[test]
    fn starts_at_one_interval() {
        let sampler = RateSampler::new(250).unwrap();
        assert_eq!(sampler.interval_millis(), 250);
        assert_eq!(sampler.next_threshold(), 250);
        assert_eq!(sampler.last_observation(), (0, 0));

        let default = RateSampler::default();
        assert_eq!(default.interval_millis(), DEFAULT_INTERVAL_MILLIS);
        assert_eq!(default.next_threshold(), DEFAULT_INTERVAL_MILLIS);
    }

    #[test]
    fn computes_truncated_rate_since_last_sample() {
        let mut sampler = RateSampler::new(1000).unwrap();

        assert_eq!(sampler.on_step(1000, 100), Some(Sample::new(1000, 100)));
        // 200 * 1000 / 1500 = 133.33
        assert_eq!(sampler.on_step(2500, 300), Some(Sample::new(2500, 133)));
        assert_eq!(sampler.last_observation(), (2500, 300));
        assert_eq!(sampler.next_threshold(), 3000);
    }

    #[test]
    fn steps_below_threshold_change_nothing() {
        let mut sampler = RateSampler::new(1000).unwrap();
        assert_eq!(sampler.on_step(1000, 100), Some(Sample::new(1000, 100)));

        for (t, c) in [(1001, 150), (1500, 400), (1999, 999)] {
            assert_eq!(sampler.on_step(t, c), None);
            assert_eq!(sampler.last_observation(), (1000, 100));
            assert_eq!(sampler.next_threshold(), 2000);
        }

        // The rate spans everything since the last emission.
        assert_eq!(sampler.on_step(2000, 1100), Some(Sample::new(2000, 1000)));
    }

    #[test]
    fn a_long_jump_emits_once_and_snaps_threshold() {
        let mut sampler = RateSampler::new(1000).unwrap();

        assert_eq!(sampler.on_step(5000, 500), Some(Sample::new(5000, 100)));
        assert_eq!(sampler.next_threshold(), 5000);
    }

    #[test]
    fn jump_just_past_one_interval_advances_normally() {
        let mut sampler = RateSampler::new(1000).unwrap();
        assert!(sampler.on_step(1800, 10).is_some());
        assert_eq!(sampler.next_threshold(), 2000);
    }

    #[test]
    fn identical_timestamps_use_one_millisecond() {
        let mut sampler = RateSampler::new(1000).unwrap();

        assert_eq!(sampler.on_step(5000, 100), Some(Sample::new(5000, 20)));
        // Threshold snapped to 5000, so the same timestamp emits again.
        assert_eq!(sampler.on_step(5000, 150), Some(Sample::new(5000, 50_000)));
    }

    #[test]
    fn large_counters_do_not_overflow_the_rate() {
        let mut sampler = RateSampler::new(1000).unwrap();
        let counter = u64::MAX / 500;
        // counter * 1000 does not fit in u64, the rate itself does
        assert_eq!(sampler.on_step(1000, counter), Some(Sample::new(1000, counter)));

        // Threshold snapped to 5000; the 0 ms gap counts as 1 ms and the
        // rate saturates.
        let mut sampler = RateSampler::new(1000).unwrap();
        assert_eq!(sampler.on_step(5000, 0), Some(Sample::new(5000, 0)));
        assert_eq!(sampler.on_step(5000, u64::MAX), Some(Sample::new(5000, u64::MAX)));
    }

    #[test]
    fn emissions_are_monotonic_and_threshold_never_lags() {
        let mut sampler = RateSampler::new(300).unwrap();
        let mut emitted: Vec<Sample> = Vec::new();
        let mut counter = 0;

        for t in (0..20_000u64).step_by(137) {
            counter += t % 11;
            if let Some(sample) = sampler.on_step(t, counter) {
                emitted.push(sample);
                assert!(sampler.next_threshold() >= sample.elapsed_millis);
            }
        }

        assert!(!emitted.is_empty());
        assert!(emitted
            .windows(2)
            .all(|w| w[0].elapsed_millis <= w[1].elapsed_millis));
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut sampler = RateSampler::new(1000).unwrap();
        sampler.on_step(7000, 9000);
        sampler.reset();

        assert_eq!(sampler.next_threshold(), 1000);
        assert_eq!(sampler.last_observation(), (0, 0));
        assert_eq!(sampler.on_step(1000, 50), Some(Sample::new(1000, 50)));
    }
}
