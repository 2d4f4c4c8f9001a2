use axum::{
    extract::State,
    http::header,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use super::{PercentileSet, Sample};
use crate::handlers::AppError;
use crate::solver::SolveOutcome;
use crate::AppState;

/// Everything the dashboard needs about one statistic.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticSnapshot {
    pub run_id: Uuid,
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub interval_millis: Option<u64>,
    pub summary: PercentileSet,
    pub samples: Vec<Sample>,
    pub outcome: Option<SolveOutcome>,
}

impl StatisticSnapshot {
    /// Snapshot of a statistic loaded back from storage.
    pub fn stored(run_id: Uuid, samples: Vec<Sample>) -> Self {
        Self {
            run_id,
            running: false,
            started_at: None,
            interval_millis: None,
            summary: PercentileSet::from_samples(&samples),
            samples,
            outcome: None,
        }
    }
}

fn current_snapshot(state: &AppState) -> Option<StatisticSnapshot> {
    let current = state.current_run.lock();
    let run = current.as_ref()?;
    let samples = run.samples.samples();

    Some(StatisticSnapshot {
        run_id: run.run_id,
        running: state.run_running.load(Ordering::SeqCst),
        started_at: Some(run.started_at),
        interval_millis: Some(run.config.interval_millis),
        summary: PercentileSet::from_samples(&samples),
        samples,
        outcome: run.outcome,
    })
}

fn no_run() -> AppError {
    AppError::NotFound("No run has been started".into())
}

// ─── GET /api/statistic ──────────────────────────────────────────

pub async fn get_statistic(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatisticSnapshot>, AppError> {
    current_snapshot(&state).map(Json).ok_or_else(no_run)
}

// ─── GET /api/statistic/csv ──────────────────────────────────────
/// The current series in the same layout the file store writes.

pub async fn statistic_csv(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let lines = state
        .current_run
        .lock()
        .as_ref()
        .map(|run| run.samples.csv_lines())
        .ok_or_else(no_run)?;

    let mut body = lines.join("\n");
    body.push('\n');
    Ok(([(header::CONTENT_TYPE, "text/csv")], body))
}

// ─── GET /api/statistic/stream ───────────────────────────────────
/// Server-Sent Events endpoint: one snapshot every 500 ms while a run
/// exists.

pub async fn statistic_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(Duration::from_millis(500));

    let stream = IntervalStream::new(interval).filter_map(move |_| {
        let snapshot = current_snapshot(&state)?;
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
