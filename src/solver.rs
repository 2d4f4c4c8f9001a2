use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::metrics::{ListenerId, StepListener, StepListeners, StepSource, ThroughputCollector};

// ─── Configuration / results ─────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub problem_size: usize,
    pub moves_per_step: u32,
    pub duration: Duration,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SolveOutcome {
    pub steps: u64,
    pub calculate_count: u64,
    /// |left sum - right sum| of the best partition found
    pub best_difference: u64,
    pub time_millis_spent: u64,
}

// ─── Solver run ──────────────────────────────────────────────────

/// Local search over a two-way number partitioning problem.
///
/// Every candidate move evaluation bumps the calculate count; after each
/// step the registered listeners get the elapsed time and that count.
pub struct SolverRun {
    config: SolverConfig,
    listeners: StepListeners,
    calculate_count: u64,
}

impl SolverRun {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            listeners: StepListeners::new(),
            calculate_count: 0,
        }
    }

    pub fn calculate_count(&self) -> u64 {
        self.calculate_count
    }

    /// Runs until the configured duration is spent or `running` is cleared.
    pub fn solve(&mut self, running: &AtomicBool) -> SolveOutcome {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let n = self.config.problem_size.max(2);

        let weights: Vec<i64> = (0..n).map(|_| rng.gen_range(1..=1_000)).collect();
        let mut left: Vec<bool> = (0..n).map(|_| rng.gen_bool(0.5)).collect();

        // left sum - right sum
        let mut difference: i64 = weights
            .iter()
            .zip(&left)
            .map(|(w, &l)| if l { *w } else { -*w })
            .sum();
        let mut best_difference = difference.unsigned_abs();

        let start = Instant::now();
        let deadline = start + self.config.duration;
        let mut steps = 0u64;

        while running.load(Ordering::Relaxed) && Instant::now() < deadline {
            // ── Pick the best of a batch of single-item flips ───────
            let mut best_move: Option<(usize, i64)> = None;
            for _ in 0..self.config.moves_per_step {
                let i = rng.gen_range(0..n);
                let flipped = if left[i] {
                    difference - 2 * weights[i]
                } else {
                    difference + 2 * weights[i]
                };
                self.calculate_count += 1;

                if best_move.map_or(true, |(_, d)| flipped.abs() < d.abs()) {
                    best_move = Some((i, flipped));
                }
            }

            if let Some((i, flipped)) = best_move {
                left[i] = !left[i];
                difference = flipped;
                best_difference = best_difference.min(difference.unsigned_abs());
            }
            steps += 1;

            let elapsed_millis = start.elapsed().as_millis() as u64;
            self.listeners.step_ended(elapsed_millis, self.calculate_count);
        }

        SolveOutcome {
            steps,
            calculate_count: self.calculate_count,
            best_difference,
            time_millis_spent: start.elapsed().as_millis() as u64,
        }
    }
}

impl StepSource for SolverRun {
    fn add_step_listener(&mut self, listener: Arc<dyn StepListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_step_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

// ─── Instrumented entry point ────────────────────────────────────

/// Solves `run` with `collector` sampling it. A collector that fails to
/// attach or detach is reported, never allowed to stop the solve.
pub fn solve_instrumented(
    run: &mut SolverRun,
    collector: &mut ThroughputCollector,
    running: &AtomicBool,
) -> SolveOutcome {
    let attached = match collector.attach(run) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "calculate count statistic not attached");
            false
        }
    };

    let outcome = run.solve(running);

    if attached {
        if let Err(e) = collector.detach(run) {
            warn!(error = %e, "calculate count statistic not detached");
        }
    }

    info!(
        steps = outcome.steps,
        calculate_count = outcome.calculate_count,
        best_difference = outcome.best_difference,
        samples = collector.len(),
        "solve finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(u64, u64)>>);

    impl StepListener for Recorder {
        fn step_ended(&self, elapsed_millis: u64, counter: u64) {
            self.0.lock().push((elapsed_millis, counter));
        }
    }

    fn config(duration_ms: u64) -> SolverConfig {
        SolverConfig {
            problem_size: 200,
            moves_per_step: 50,
            duration: Duration::from_millis(duration_ms),
            seed: 42,
        }
    }

    #[test]
    fn fires_one_event_per_step() {
        let mut run = SolverRun::new(config(30));
        let recorder = Arc::new(Recorder::default());
        run.add_step_listener(recorder.clone());

        let outcome = run.solve(&AtomicBool::new(true));
        let events = recorder.0.lock();

        assert!(outcome.steps > 0);
        assert_eq!(events.len() as u64, outcome.steps);
        assert_eq!(outcome.calculate_count, outcome.steps * 50);
        assert_eq!(run.calculate_count(), outcome.calculate_count);
        assert!(events.windows(2).all(|w| w[0].0 <= w[1].0 && w[0].1 < w[1].1));
        assert_eq!(events.last().map(|e| e.1), Some(outcome.calculate_count));
    }

    #[test]
    fn cleared_flag_stops_before_first_step() {
        let mut run = SolverRun::new(config(10_000));
        let outcome = run.solve(&AtomicBool::new(false));
        assert_eq!(outcome.steps, 0);
        assert_eq!(outcome.calculate_count, 0);
    }

    #[test]
    fn removed_listener_hears_nothing() {
        let mut run = SolverRun::new(config(10));
        let recorder = Arc::new(Recorder::default());
        let id = run.add_step_listener(recorder.clone());
        assert!(run.remove_step_listener(id));
        assert!(!run.remove_step_listener(id));

        run.solve(&AtomicBool::new(true));
        assert!(recorder.0.lock().is_empty());
    }

    #[test]
    fn instrumented_solve_samples_and_detaches() {
        let mut run = SolverRun::new(config(60));
        let mut collector = ThroughputCollector::new(5).unwrap();

        let outcome = solve_instrumented(&mut run, &mut collector, &AtomicBool::new(true));

        assert!(!collector.is_attached());
        let samples = collector.samples();
        assert!(!samples.is_empty());
        assert!(samples
            .windows(2)
            .all(|w| w[0].elapsed_millis <= w[1].elapsed_millis));
        assert!(samples.iter().all(|s| s.elapsed_millis <= outcome.time_millis_spent));
    }

    #[test]
    fn attach_failure_does_not_stop_the_solve() {
        let mut first = SolverRun::new(config(5));
        let mut run = SolverRun::new(config(20));
        let mut collector = ThroughputCollector::default();
        collector.attach(&mut first).unwrap();

        let outcome = solve_instrumented(&mut run, &mut collector, &AtomicBool::new(true));

        assert!(outcome.steps > 0);
        assert!(collector.is_attached());
    }
}
