pub mod aircraft;
pub mod analytics;
pub mod flights;

pub use aircraft::*;
pub use analytics::*;
pub use flights::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;

use crate::aircraft_service::AircraftError;

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct DataListResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    errors: &'a str,
}

pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { errors: message })).into_response()
}

/// Maps a service error to its HTTP status
pub fn service_error(e: AircraftError) -> Response {
    match &e {
        AircraftError::NotFound(_) => json_error(StatusCode::NOT_FOUND, &e.to_string()),
        AircraftError::Invalid(_) => json_error(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
        AircraftError::InvalidState(_) => json_error(StatusCode::CONFLICT, &e.to_string()),
        AircraftError::Store(store_error) => {
            error!("Store error: {}", store_error);
            metrics::counter!("web.store_errors_total").increment(1);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
        }
    }
}

/// Runs a synchronous service call off the async runtime
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, AircraftError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(service_error(e)),
        Err(e) => {
            error!("Blocking task failed: {}", e);
            Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
    }
}
