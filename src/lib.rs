//! flightops - fleet reconciliation and flight analytics
//!
//! Aircraft batches are reconciled against the stored fleet, creating missing
//! operators and models and linking flights that arrived before their
//! aircraft. Flights can be listed in route order and aircraft ranked by
//! their share of long flights.

pub mod actions;
pub mod aircraft;
pub mod aircraft_models;
pub mod aircraft_service;
pub mod analytics;
pub mod analytics_cache;
pub mod config;
pub mod flight_ingest;
pub mod flight_order;
pub mod flights;
pub mod loader;
pub mod logging;
pub mod memory_store;
pub mod metrics;
pub mod operators;
pub mod reconcile;
pub mod store;
pub mod web;

#[cfg(feature = "postgres")]
pub mod aircraft_models_repo;
#[cfg(feature = "postgres")]
pub mod aircraft_repo;
#[cfg(feature = "postgres")]
pub mod db;
#[cfg(feature = "postgres")]
pub mod flights_repo;
#[cfg(feature = "postgres")]
pub mod operators_repo;
#[cfg(feature = "postgres")]
pub mod schema;

pub use aircraft::{Aircraft, AircraftPatch, AircraftRecord, Icao24, ValidationError};
pub use aircraft_service::{AircraftError, AircraftService};
pub use analytics::{Output, RankedOperator, top_n_by_long_flight_percentage, top_operators};
pub use flight_order::{FlightOrderError, compare_flights, sort_flights};
pub use flights::{Flight, FlightKey, FlightRecord, Route};
pub use memory_store::MemoryStore;
pub use reconcile::{ReconcileReport, reconcile};
pub use store::{Store, StoreError};
