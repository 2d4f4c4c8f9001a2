use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Adds `X-Response-Time-Us` and `Server-Timing` headers and logs one
/// line per API request.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros();

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }

    let server_timing =
        format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    // ── Log ─────────────────────────────────────────────────────
    let status = response.status().as_u16();
    // Headers go out before the SSE body, so this is the open, not the close
    if path.ends_with("/stream") {
        debug!(%method, path = %path, status, "stream opened");
    } else if status >= 400 {
        warn!(%method, path = %path, status, elapsed_us = us as u64, "request");
    } else {
        info!(%method, path = %path, status, elapsed_us = us as u64, "request");
    }

    response
}
