use chrono::{DateTime, Utc};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod solver;
pub mod store;

use config::RunConfig;
use metrics::SampleReader;
use solver::SolveOutcome;
use store::{CsvFileStore, RedisStore};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// One CSV file per finished run.
    pub file_store: CsvFileStore,

    /// Optional second copy of every statistic in Redis.
    pub redis_store: Option<RedisStore>,

    /// Checked by the solver after every step.
    pub run_running: Arc<AtomicBool>,

    /// The most recently started run, finished or not.
    pub current_run: parking_lot::Mutex<Option<ActiveRun>>,

    /// Handle to the spawned run task so we can await clean shutdown.
    pub run_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl AppState {
    pub fn new(file_store: CsvFileStore, redis_store: Option<RedisStore>) -> Self {
        Self {
            file_store,
            redis_store,
            run_running: Arc::new(AtomicBool::new(false)),
            current_run: parking_lot::Mutex::new(None),
            run_handle: tokio::sync::Mutex::new(None),
        }
    }
}

/// Bookkeeping for one run. `samples` reads the series while the
/// solver is still appending to it; each read is a consistent copy.
pub struct ActiveRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub config: RunConfig,
    pub samples: SampleReader,
    pub outcome: Option<SolveOutcome>,
}
