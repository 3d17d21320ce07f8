use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use flightops::aircraft_service::AircraftService;
use flightops::analytics_cache::AnalyticsCache;
use flightops::config::AnalyticsConfig;
use flightops::memory_store::MemoryStore;
use flightops::web::{AppState, router};

fn app() -> Router {
    let service = Arc::new(AircraftService::new(Arc::new(MemoryStore::new())));
    let analytics = AnalyticsCache::new(service.clone(), AnalyticsConfig::default());
    router(AppState::new(service, analytics))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_create_then_fetch_aircraft() {
    let app = app();
    let record = json!({
        "icao24": "abc123",
        "model": "A320",
        "operator": "Wizz Air",
        "owner": "Wizz Air Hungary"
    });

    let (status, body) = send(&app, Method::POST, "/data/aircraft", Some(record.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["icao24"], "ABC123");

    let (status, _) = send(&app, Method::POST, "/data/aircraft", Some(record)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/data/aircraft/ABC123", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["operator"], "Wizz Air");

    let (status, body) = send(&app, Method::GET, "/data/aircraft", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_errors_map_to_status_codes() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/data/aircraft/bulk",
        Some(json!([{"icao24": "abc123", "model": "A320", "operator": "Wizz Air", "owner": "W"}])),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/data/aircraft/ffffff",
        Some(json!({"owner": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/data/aircraft/ffffff",
        Some(json!({"model": "A321", "operator": "NULL"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/data/aircraft/abc123",
        Some(json!({"model": "A321", "operator": "NULL", "owner": "W"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"].is_string());

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/data/aircraft/abc123",
        Some(json!({"operator": "Wizz Air UK"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["operator"], "Wizz Air UK");
    assert_eq!(body["data"]["model"], "A320");

    let (status, _) = send(&app, Method::DELETE, "/data/aircraft/abc123", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, "/data/aircraft/abc123", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_flights_and_ranking() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/data/aircraft/bulk",
        Some(json!([
            {"icao24": "aaaaaa", "model": "B77W", "operator": "Emirates", "owner": "Emirates"},
            {"icao24": "bbbbbb", "model": "A320", "operator": "easyJet", "owner": "easyJet"},
            {"icao24": "cccccc", "model": "A320", "operator": "NULL", "owner": "easyJet"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created_aircraft"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["rejected"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/data/flights/bulk",
        Some(json!([
            {"icao24": "aaaaaa", "firstSeen": 0, "lastSeen": 50000, "estDepartureAirport": "OMDB", "estArrivalAirport": "YSSY"},
            {"icao24": "bbbbbb", "firstSeen": 0, "lastSeen": 3000, "estDepartureAirport": "EGKK", "estArrivalAirport": "LEPA"},
            {"icao24": "bbbbbb", "firstSeen": 9000, "lastSeen": 30000, "estDepartureAirport": "EGKK", "estArrivalAirport": "OJAQ"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["linked"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, Method::GET, "/data/analytics/top-aircraft?n=5", None).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["icao24"], "AAAAAA");
    assert_eq!(data[0]["value"], 100.0);
    assert_eq!(data[1]["value"], 50.0);

    let (status, body) = send(&app, Method::GET, "/data/analytics/top-operators?n=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["operator"], "Emirates");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/data/aircraft/bbbbbb/flights", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["route"]["arrival_airport"], "LEPA");
    assert_eq!(body["data"][1]["route"]["arrival_airport"], "OJAQ");

    let (status, body) = send(&app, Method::GET, "/data/operators/easyJet/aircraft", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_flights_without_route_conflict() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/data/aircraft",
        Some(json!({"icao24": "dddddd", "model": "AT76", "operator": "Binter", "owner": "Binter"})),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/data/flights/bulk",
        Some(json!([
            {"icao24": "dddddd", "first_seen": 0, "last_seen": 100, "departure_airport": "GCLP"},
            {"icao24": "dddddd", "first_seen": 500, "last_seen": 900}
        ])),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/data/aircraft/dddddd/flights", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["errors"].as_str().unwrap().contains("DDDDDD"));
}
