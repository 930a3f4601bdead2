//! HTTP Server and Update Loop
//!
//! This module wires the exporter together: it builds the metric stores, spawns the
//! SMART update loop and serves the scrape endpoint.
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Health check (200 if the last device enumeration succeeded, 503 otherwise)
//!
//! # Error Handling
//!
//! Update failures never reach a scrape: `/metrics` always returns whatever values are
//! currently stored, possibly stale or mid-update.

use crate::config::Config;
use crate::devices::Lsblk;
use crate::metrics::MetricsCollector;
use crate::sampler::Smartctl;
use crate::updater::Updater;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    metrics: MetricsCollector,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = MetricsCollector::new()?;

    let updater = Updater::new(
        Arc::new(Lsblk::new(config.smart.lsblk_path.clone())),
        Arc::new(Smartctl::new(
            config.smart.smartctl_path.clone(),
            config.smart.device_dir.clone(),
        )),
        metrics.clone(),
        config.smart.update_interval(),
    )
    .with_concurrency(config.smart.concurrency_limit());

    // Collect device metrics independently of the HTTP handlers
    tokio::spawn(async move {
        updater.run().await;
    });

    let app = router(metrics);

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the exporter's HTTP routes around an existing collector
pub fn router(metrics: MetricsCollector) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { metrics })
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>SMART Exporter</title></head>
<body>
<h1>SMART Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.metrics.up.get() > 0.0 {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Block devices could not be listed",
        )
    }
}
