use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use step_rate_bench::config::ServerArgs;
use step_rate_bench::store::{CsvFileStore, RedisStore};
use step_rate_bench::{server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    // ── 1. Storage ───────────────────────────────────────────────
    let file_store = CsvFileStore::new(&args.result_dir);
    info!(dir = %file_store.root().display(), "writing statistics to disk");

    let redis_store = match &args.redis_url {
        Some(url) => match RedisStore::connect(url).await {
            Ok(store) => {
                info!(url = %url, "redis storage enabled");
                Some(store)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "redis unavailable, storing statistics on disk only");
                None
            }
        },
        None => None,
    };

    // ── 2. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState::new(file_store, redis_store));

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    info!(addr = %args.bind, "listening");
    info!("start a run      → POST /api/runs/start");
    info!("live statistic   → GET  /api/statistic/stream");

    axum::serve(listener, app)
        .await
        .context("server exited with error")?;
    Ok(())
}
