use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::actions::{DataListResponse, DataResponse, run_blocking};
use crate::aircraft::{AircraftPatch, AircraftRecord};
use crate::web::AppState;

/// GET /data/aircraft
pub async fn list_aircraft(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.service.clone();
    match run_blocking(move || service.list()).await {
        Ok(data) => Json(DataListResponse { data }).into_response(),
        Err(response) => response,
    }
}

/// POST /data/aircraft
///
/// 201 with the stored aircraft, or 204 when the record was invalid or the
/// aircraft already existed.
pub async fn create_aircraft(
    State(state): State<AppState>,
    Json(record): Json<AircraftRecord>,
) -> impl IntoResponse {
    metrics::counter!("aircraft.api.create.requests_total").increment(1);
    let service = state.service.clone();
    match run_blocking(move || service.create(&record)).await {
        Ok(Some(data)) => (StatusCode::CREATED, Json(DataResponse { data })).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}

/// POST /data/aircraft/bulk
pub async fn create_aircraft_bulk(
    State(state): State<AppState>,
    Json(batch): Json<Vec<AircraftRecord>>,
) -> impl IntoResponse {
    metrics::counter!("aircraft.api.bulk.requests_total").increment(1);
    let service = state.service.clone();
    match run_blocking(move || service.create_bulk(&batch)).await {
        Ok(data) => Json(DataResponse { data }).into_response(),
        Err(response) => response,
    }
}

/// GET /data/aircraft/{icao24}
pub async fn get_aircraft(
    State(state): State<AppState>,
    Path(icao24): Path<String>,
) -> impl IntoResponse {
    let service = state.service.clone();
    match run_blocking(move || service.get(&icao24)).await {
        Ok(data) => Json(DataResponse { data }).into_response(),
        Err(response) => response,
    }
}

/// PUT /data/aircraft/{icao24}
///
/// The body carries model, operator and owner; all three are required.
pub async fn replace_aircraft(
    State(state): State<AppState>,
    Path(icao24): Path<String>,
    Json(body): Json<AircraftPatch>,
) -> impl IntoResponse {
    let service = state.service.clone();
    let record = AircraftRecord {
        icao24: icao24.clone(),
        model: body.model,
        operator: body.operator,
        owner: body.owner,
    };
    match run_blocking(move || service.replace(&icao24, &record)).await {
        Ok(data) => Json(DataResponse { data }).into_response(),
        Err(response) => response,
    }
}

/// PATCH /data/aircraft/{icao24}
pub async fn patch_aircraft(
    State(state): State<AppState>,
    Path(icao24): Path<String>,
    Json(patch): Json<AircraftPatch>,
) -> impl IntoResponse {
    let service = state.service.clone();
    match run_blocking(move || service.patch(&icao24, &patch)).await {
        Ok(data) => Json(DataResponse { data }).into_response(),
        Err(response) => response,
    }
}

/// DELETE /data/aircraft/{icao24}
pub async fn delete_aircraft(
    State(state): State<AppState>,
    Path(icao24): Path<String>,
) -> impl IntoResponse {
    let service = state.service.clone();
    match run_blocking(move || service.delete(&icao24)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}

/// GET /data/aircraft/{icao24}/flights
pub async fn get_aircraft_flights(
    State(state): State<AppState>,
    Path(icao24): Path<String>,
) -> impl IntoResponse {
    let service = state.service.clone();
    match run_blocking(move || service.flights_for(&icao24)).await {
        Ok(data) => Json(DataListResponse { data }).into_response(),
        Err(response) => response,
    }
}

/// GET /data/operators/{name}/aircraft
pub async fn get_operator_fleet(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let service = state.service.clone();
    match run_blocking(move || service.aircraft_for_operator(&name)).await {
        Ok(data) => Json(DataListResponse { data }).into_response(),
        Err(response) => response,
    }
}

/// GET /data/models/{name}/aircraft
pub async fn get_model_aircraft(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let service = state.service.clone();
    match run_blocking(move || service.aircraft_for_model(&name)).await {
        Ok(data) => Json(DataListResponse { data }).into_response(),
        Err(response) => response,
    }
}
