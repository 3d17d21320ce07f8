use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::actions;
use crate::aircraft_service::AircraftService;
use crate::analytics_cache::AnalyticsCache;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AircraftService>,
    pub analytics: AnalyticsCache,
}

impl AppState {
    pub fn new(service: Arc<AircraftService>, analytics: AnalyticsCache) -> Self {
        Self { service, analytics }
    }
}

async fn handle_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn request_logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string()[..8].to_string();
    let start_time = Instant::now();

    info!("Started {} {} [{}]", method, path, request_id);

    let response = next.run(request).await;
    let duration = start_time.elapsed();
    let status = response.status();

    info!(
        "Completed {} {} [{}] {} in {:.2}ms",
        method,
        path,
        request_id,
        status.as_u16(),
        duration.as_secs_f64() * 1000.0
    );
    metrics::histogram!("web.request_ms").record(duration.as_secs_f64() * 1000.0);

    response
}

async fn server_error_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    if response.status().is_server_error() {
        let status = response.status();
        error!("HTTP {} error on {} {}", status.as_u16(), method, uri);
        metrics::counter!("web.server_errors_total").increment(1);
    }

    response
}

/// Routes under `/data`, plus logging and CORS layers
pub fn router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route(
            "/aircraft",
            get(actions::list_aircraft).post(actions::create_aircraft),
        )
        .route("/aircraft/bulk", post(actions::create_aircraft_bulk))
        .route(
            "/aircraft/{icao24}",
            get(actions::get_aircraft)
                .put(actions::replace_aircraft)
                .patch(actions::patch_aircraft)
                .delete(actions::delete_aircraft),
        )
        .route(
            "/aircraft/{icao24}/flights",
            get(actions::get_aircraft_flights),
        )
        .route("/flights/bulk", post(actions::ingest_flights_bulk))
        .route("/operators/{name}/aircraft", get(actions::get_operator_fleet))
        .route("/models/{name}/aircraft", get(actions::get_model_aircraft))
        .route("/analytics/top-aircraft", get(actions::get_top_aircraft))
        .route("/analytics/top-operators", get(actions::get_top_operators))
        .with_state(app_state);

    Router::new()
        .nest("/data", api_router)
        .fallback(handle_not_found)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(middleware::from_fn(server_error_middleware))
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping web server");
}

pub async fn start_web_server(interface: String, port: u16, app_state: AppState) -> Result<()> {
    info!("Starting web server on {}:{}", interface, port);

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", interface, port)).await?;
    info!("Web server listening on http://{}:{}", interface, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
