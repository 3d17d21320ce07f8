use anyhow::Result;
use flightops::config::WebConfig;
use flightops::metrics::start_metrics_server;
use flightops::web::{AppState, start_web_server};
use tracing::{error, info};

pub async fn handle_serve(
    web: &WebConfig,
    interface: Option<String>,
    port: Option<u16>,
    app_state: AppState,
) -> Result<()> {
    let interface = interface.unwrap_or_else(|| web.interface.clone());
    let port = port.unwrap_or(web.port);

    if let Some(metrics_port) = web.metrics_port {
        let metrics_interface = interface.clone();
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(&metrics_interface, metrics_port).await {
                error!("Metrics server stopped: {:#}", e);
            }
        });
    }

    info!(
        "Serving analytics with long-flight threshold {}s",
        app_state.analytics.config().long_flight_threshold_secs
    );
    start_web_server(interface, port, app_state).await
}
