use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::metrics::DEFAULT_INTERVAL_MILLIS;
use crate::solver::SolverConfig;

// ─── Process configuration ───────────────────────────────────────

#[derive(Parser, Debug, Clone)]
#[command(name = "step-rate-bench")]
#[command(about = "Samples solver throughput (calculate count per second) and serves it over HTTP")]
#[command(version)]
pub struct ServerArgs {
    /// Address the HTTP server binds to
    #[arg(long, env = "STEP_RATE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Redis URL for storing statistics; Redis storage is off when unset
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Directory holding one sub-directory of CSV files per run
    #[arg(long, env = "STEP_RATE_RESULTS", default_value = "results")]
    pub result_dir: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

// ─── Per-run configuration ───────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Wall-clock spacing between throughput samples
    #[serde(default = "default_interval_millis")]
    pub interval_millis: u64,

    /// How long the solver runs (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Number of weights to partition
    #[serde(default = "default_problem_size")]
    pub problem_size: usize,

    /// Candidate moves evaluated per solver step
    #[serde(default = "default_moves_per_step")]
    pub moves_per_step: u32,

    /// Fixed RNG seed; random when omitted
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_interval_millis() -> u64 {
    DEFAULT_INTERVAL_MILLIS
}
fn default_duration() -> u64 {
    30
}
fn default_problem_size() -> usize {
    2_000
}
fn default_moves_per_step() -> u32 {
    1_000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            interval_millis: default_interval_millis(),
            duration_secs: default_duration(),
            problem_size: default_problem_size(),
            moves_per_step: default_moves_per_step(),
            seed: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_millis == 0 {
            return Err("interval_millis must be bigger than 0".into());
        }
        if !(1..=600).contains(&self.duration_secs) {
            return Err("duration_secs must be between 1 and 600".into());
        }
        if !(2..=1_000_000).contains(&self.problem_size) {
            return Err("problem_size must be between 2 and 1000000".into());
        }
        if !(1..=1_000_000).contains(&self.moves_per_step) {
            return Err("moves_per_step must be between 1 and 1000000".into());
        }
        Ok(())
    }

    pub fn solver_config(&self, seed: u64) -> SolverConfig {
        SolverConfig {
            problem_size: self.problem_size,
            moves_per_step: self.moves_per_step,
            duration: Duration::from_secs(self.duration_secs),
            seed: self.seed.unwrap_or(seed),
        }
    }
}
