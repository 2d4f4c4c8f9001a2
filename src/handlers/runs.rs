use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::metrics::ThroughputCollector;
use crate::solver::{self, SolveOutcome, SolverRun};
use crate::{ActiveRun, AppState};

use super::AppError;

// ─── Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RunStatus {
    pub running: bool,
    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub message: String,
}

impl RunStatus {
    fn of(state: &AppState, message: impl Into<String>) -> Self {
        let current = state.current_run.lock();
        Self {
            running: state.run_running.load(Ordering::SeqCst),
            run_id: current.as_ref().map(|r| r.run_id),
            started_at: current.as_ref().map(|r| r.started_at),
            message: message.into(),
        }
    }
}

// ─── POST /api/runs/start ────────────────────────────────────────

pub async fn start_run(
    State(state): State<Arc<AppState>>,
    Json(config): Json<RunConfig>,
) -> Result<Json<RunStatus>, AppError> {
    config.validate().map_err(AppError::BadRequest)?;

    // Guard: only one run at a time. Claiming the flag here also makes
    // the solver see it set as soon as it starts.
    if state
        .run_running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(AppError::AlreadyRunning);
    }

    let collector = match ThroughputCollector::new(config.interval_millis) {
        Ok(collector) => collector,
        Err(e) => {
            state.run_running.store(false, Ordering::SeqCst);
            return Err(e.into());
        }
    };
    let run = SolverRun::new(config.solver_config(rand::random()));
    let run_id = Uuid::new_v4();

    *state.current_run.lock() = Some(ActiveRun {
        run_id,
        started_at: Utc::now(),
        config: config.clone(),
        samples: collector.reader(),
        outcome: None,
    });

    let msg = format!(
        "Started: {} weights, {} moves/step, {}s, sampling every {} ms",
        config.problem_size, config.moves_per_step, config.duration_secs, config.interval_millis,
    );
    info!(%run_id, "{msg}");

    let handle = tokio::spawn(run_to_completion(state.clone(), run_id, run, collector));

    // Stash the handle so `stop` can await clean shutdown
    let mut guard = state.run_handle.lock().await;
    *guard = Some(handle);
    drop(guard);

    Ok(Json(RunStatus::of(&state, msg)))
}

/// Solves on a blocking thread, then persists the statistic once the
/// collector is detached and the series can no longer grow.
async fn run_to_completion(
    state: Arc<AppState>,
    run_id: Uuid,
    mut run: SolverRun,
    mut collector: ThroughputCollector,
) {
    let running = state.run_running.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let outcome = solver::solve_instrumented(&mut run, &mut collector, &running);
        (outcome, collector)
    })
    .await;

    state.run_running.store(false, Ordering::SeqCst);

    let (outcome, collector) = match joined {
        Ok(done) => done,
        Err(e) => {
            error!(%run_id, error = %e, "solver task failed");
            return;
        }
    };

    record_outcome(&state, run_id, outcome);

    let lines = collector.csv_lines();
    if let Err(e) = state.file_store.write(run_id, &lines).await {
        warn!(%run_id, error = %e, "statistic not written to disk");
    }
    if let Some(redis) = &state.redis_store {
        if let Err(e) = redis.write(run_id, &lines).await {
            warn!(%run_id, error = %e, "statistic not stored in redis");
        }
    }
}

fn record_outcome(state: &AppState, run_id: Uuid, outcome: SolveOutcome) {
    let mut current = state.current_run.lock();
    if let Some(active) = current.as_mut().filter(|r| r.run_id == run_id) {
        active.outcome = Some(outcome);
    }
}

// ─── POST /api/runs/stop ─────────────────────────────────────────

pub async fn stop_run(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunStatus>, AppError> {
    if !state.run_running.load(Ordering::SeqCst) {
        return Ok(Json(RunStatus::of(&state, "No run is in progress")));
    }

    // Signal the solver to stop after its current step
    state.run_running.store(false, Ordering::SeqCst);

    // Await the run task so the statistic is persisted before we answer
    let mut guard = state.run_handle.lock().await;
    if let Some(handle) = guard.take() {
        if let Err(e) = handle.await {
            warn!(error = %e, "run task ended abnormally");
        }
    }
    drop(guard);

    Ok(Json(RunStatus::of(&state, "Run stopped")))
}

// ─── GET /api/runs/status ────────────────────────────────────────

pub async fn run_status(State(state): State<Arc<AppState>>) -> Json<RunStatus> {
    let message = if state.run_running.load(Ordering::SeqCst) {
        "Run in progress"
    } else {
        "Idle"
    };
    Json(RunStatus::of(&state, message))
}
