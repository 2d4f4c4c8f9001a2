use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::metrics::stream::StatisticSnapshot;
use crate::metrics::ThroughputCollector;
use crate::AppState;

use super::AppError;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatisticSource {
    #[default]
    File,
    Redis,
}

#[derive(Debug, Deserialize)]
pub struct LoadQuery {
    #[serde(default)]
    pub source: StatisticSource,
}

// ─── GET /api/runs ───────────────────────────────────────────────

pub async fn list_runs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Uuid>>, AppError> {
    Ok(Json(state.file_store.list_runs().await?))
}

// ─── GET /api/runs/:id/statistic ─────────────────────────────────

pub async fn load_statistic(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<LoadQuery>,
) -> Result<Json<StatisticSnapshot>, AppError> {
    let lines = match query.source {
        StatisticSource::File => state.file_store.read(run_id).await?,
        StatisticSource::Redis => {
            let redis = state
                .redis_store
                .as_ref()
                .ok_or_else(|| AppError::BadRequest("Redis storage is not configured".into()))?;
            redis.read(run_id).await?
        }
    };

    // A collector that failed to load is dropped with whatever it parsed.
    let mut collector = ThroughputCollector::default();
    collector.load_from(&lines)?;

    Ok(Json(StatisticSnapshot::stored(run_id, collector.samples())))
}
