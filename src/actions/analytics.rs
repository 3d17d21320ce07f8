use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use crate::actions::{DataListResponse, run_blocking};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub n: Option<usize>,
}

/// GET /data/analytics/top-aircraft
/// Aircraft with the highest share of long flights
pub async fn get_top_aircraft(
    Query(params): Query<TopParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    metrics::counter!("analytics.api.top_aircraft.requests_total").increment(1);

    let cache = state.analytics.clone();
    match run_blocking(move || cache.get_top_aircraft(params.n)).await {
        Ok(data) => (StatusCode::OK, Json(DataListResponse { data })).into_response(),
        Err(response) => {
            metrics::counter!("analytics.api.errors_total").increment(1);
            response
        }
    }
}

/// GET /data/analytics/top-operators
/// Same ranking, each entry resolved to the aircraft's operator
pub async fn get_top_operators(
    Query(params): Query<TopParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    metrics::counter!("analytics.api.top_operators.requests_total").increment(1);

    let cache = state.analytics.clone();
    match run_blocking(move || cache.get_top_operators(params.n)).await {
        Ok(data) => (StatusCode::OK, Json(DataListResponse { data })).into_response(),
        Err(response) => {
            metrics::counter!("analytics.api.errors_total").increment(1);
            response
        }
    }
}
