use anyhow::{Context, Result};
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tracing::info;

/// Installs the Prometheus recorder. Must run before any metric is recorded
/// for those metrics to be exported.
pub fn init_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        // 1ms .. 10s
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Suffix("_ms".to_string()),
            &[
                1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
            ],
        )
        .context("Failed to set histogram buckets")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Registers the counters at zero so they show up before the first event
pub fn initialize_flightops_metrics() {
    metrics::counter!("reconcile.records_total").absolute(0);
    metrics::counter!("reconcile.records_rejected_total").absolute(0);
    metrics::counter!("reconcile.aircraft_created_total").absolute(0);
    metrics::counter!("reconcile.flights_relinked_total").absolute(0);
    metrics::counter!("reconcile.integrity_failures_total").absolute(0);

    metrics::counter!("flight_ingest.records_total").absolute(0);
    metrics::counter!("flight_ingest.flights_inserted_total").absolute(0);
    metrics::counter!("flight_ingest.orphans_total").absolute(0);

    metrics::counter!("analytics.cache.hit").absolute(0);
    metrics::counter!("analytics.cache.miss").absolute(0);

    metrics::counter!("web.server_errors_total").absolute(0);
}

/// Serves `/metrics` on its own port
pub async fn start_metrics_server(interface: &str, port: u16) -> Result<()> {
    let handle = init_metrics()?;
    initialize_flightops_metrics();

    let app = Router::new().route("/metrics", get(move || async move { handle.render() }));

    let addr: SocketAddr = format!("{}:{}", interface, port)
        .parse()
        .with_context(|| format!("Invalid metrics address {}:{}", interface, port))?;
    info!("Starting metrics server on http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics server to {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("Metrics server failed")
}
