//! Server integration tests
//!
//! Tests for the exposition output and health logic behind the HTTP endpoints.

mod common;

use common::*;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use smart_exporter::server::router;
use tower::ServiceExt;

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    // Given: A metrics collector with a stored device value
    let metrics = create_test_metrics();
    metrics.up.set(1.0);
    metrics.store(GROWN_DEFECTS).unwrap().set("sdb", 12.0);

    // When: Rendering metrics to Prometheus format
    let rendered = metrics.render().expect("Failed to render metrics");

    // Then: Output should be valid Prometheus format
    assert!(rendered.contains("# HELP"), "Missing HELP comment");
    assert!(rendered.contains("# TYPE"), "Missing TYPE comment");
    assert!(rendered.contains("smart_exporter_up 1"), "Missing up metric");
    assert!(
        rendered.contains("smart_grown_defect_list_total{device=\"sdb\"} 12"),
        "Labels not in correct format"
    );
}

#[test]
fn test_metrics_rendering_is_stable() {
    // Given: A metrics collector with values set
    let metrics = create_test_metrics();
    metrics.up.set(1.0);
    metrics.store(REALLOCATED).unwrap().set("sda", 0.0);

    // When: Rendering the same metrics twice
    let render1 = metrics.render().expect("First render failed");
    let render2 = metrics.render().expect("Second render failed");

    // Then: Both renderings should be identical
    assert_eq!(render1, render2, "Metrics rendering is not stable");
}

#[test]
fn test_empty_stores_render_only_exporter_metrics() {
    // Given: No device has been sampled yet
    let metrics = create_test_metrics();

    // When: Rendering
    let rendered = metrics.render().expect("Failed to render");

    // Then: Only the scalar exporter gauges appear
    assert!(rendered.contains("smart_exporter_up"));
    assert!(rendered.contains("smart_exporter_last_update_timestamp_seconds"));
    assert!(!rendered.contains("smart_reallocated_sectors_total"));
}

#[test]
fn test_each_rule_has_its_own_metric_family() {
    let metrics = create_test_metrics();
    for store in metrics.stores() {
        store.set("sda", 1.0);
    }

    let rendered = metrics.render().expect("Failed to render");

    for name in [REALLOCATED, GROWN_DEFECTS, READ_ERRORS, WRITE_ERRORS] {
        assert!(
            rendered.contains(&format!("# TYPE {} gauge", name)),
            "Missing family {}",
            name
        );
    }
}

async fn get(metrics: &smart_exporter::metrics::MetricsCollector, uri: &str) -> (StatusCode, String) {
    let response = router(metrics.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("router should respond");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    (status, String::from_utf8(body.to_vec()).expect("body is UTF-8"))
}

#[tokio::test]
async fn test_health_unavailable_before_first_enumeration() {
    // Given: A fresh collector, no cycle has run yet
    let metrics = create_test_metrics();

    // When: Requesting /health
    let (status, _) = get(&metrics, "/health").await;

    // Then: The exporter reports itself unavailable
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health_ok_after_successful_enumeration() {
    // Given: The last enumeration succeeded
    let metrics = create_test_metrics();
    metrics.up.set(1.0);

    // When: Requesting /health
    let (status, body) = get(&metrics, "/health").await;

    // Then: Health check passes
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_metrics_route_serves_stored_series() {
    // Given: A stored value for sda
    let metrics = create_test_metrics();
    metrics.store(REALLOCATED).unwrap().set("sda", 5.0);

    // When: Scraping /metrics
    let (status, body) = get(&metrics, "/metrics").await;

    // Then: The series is in the response body
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("smart_reallocated_sectors_total{device=\"sda\"} 5"));
}

#[tokio::test]
async fn test_root_route_links_to_metrics() {
    let metrics = create_test_metrics();

    let (status, body) = get(&metrics, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("href=\"/metrics\""));
}
