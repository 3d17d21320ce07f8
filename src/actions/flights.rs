use axum::{
    extract::State,
    response::{IntoResponse, Json},
};

use crate::actions::{DataResponse, run_blocking};
use crate::flights::FlightRecord;
use crate::web::AppState;

/// POST /data/flights/bulk
/// Stores a batch of observed flights, linking those whose aircraft is known
pub async fn ingest_flights_bulk(
    State(state): State<AppState>,
    Json(batch): Json<Vec<FlightRecord>>,
) -> impl IntoResponse {
    metrics::counter!("flights.api.bulk.requests_total").increment(1);
    let service = state.service.clone();
    match run_blocking(move || service.ingest_flights(&batch)).await {
        Ok(data) => Json(DataResponse { data }).into_response(),
        Err(response) => response,
    }
}
