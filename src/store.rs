//! Persistence boundary.
//!
//! One trait per entity type. Engines take any [`Store`] by reference; the
//! caller decides which implementation backs it. Multi-row inserts are
//! all-or-nothing and report uniqueness, foreign-key and check violations as
//! [`StoreError::Integrity`], which callers can tell apart from a missing row.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::aircraft::{Aircraft, Icao24};
use crate::aircraft_models::AircraftModel;
use crate::flights::{Flight, FlightKey};
use crate::operators::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Aircraft,
    Flight,
    Operator,
    Model,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Aircraft => write!(f, "aircraft"),
            EntityKind::Flight => write!(f, "flight"),
            EntityKind::Operator => write!(f, "operator"),
            EntityKind::Model => write!(f, "model"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("integrity violation on {entity} {key}: {reason}")]
    Integrity {
        entity: EntityKind,
        key: String,
        reason: String,
    },
    #[error("{entity} {key} not found")]
    NotFound { entity: EntityKind, key: String },
    #[error("store backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn integrity(entity: EntityKind, key: impl fmt::Display, reason: impl Into<String>) -> Self {
        StoreError::Integrity {
            entity,
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: EntityKind, key: impl fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::Integrity { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait OperatorStore {
    fn find_operator(&self, name: &str) -> StoreResult<Option<Operator>>;
    fn all_operators(&self) -> StoreResult<Vec<Operator>>;
    fn insert_operators(&self, operators: &[Operator]) -> StoreResult<()>;
}

pub trait ModelStore {
    fn find_model(&self, name: &str) -> StoreResult<Option<AircraftModel>>;
    fn all_models(&self) -> StoreResult<Vec<AircraftModel>>;
    fn insert_models(&self, models: &[AircraftModel]) -> StoreResult<()>;
}

pub trait AircraftStore {
    fn find_aircraft(&self, icao24: &Icao24) -> StoreResult<Option<Aircraft>>;
    fn all_aircraft(&self) -> StoreResult<Vec<Aircraft>>;
    fn all_icao24s(&self) -> StoreResult<HashSet<Icao24>>;
    fn aircraft_by_operator(&self, operator: &str) -> StoreResult<Vec<Aircraft>>;
    fn aircraft_by_model(&self, model: &str) -> StoreResult<Vec<Aircraft>>;
    /// Operator and model must already exist
    fn insert_aircraft(&self, aircraft: &[Aircraft]) -> StoreResult<()>;
    /// Overwrites owner, model and operator of an existing aircraft
    fn update_aircraft(&self, aircraft: &Aircraft) -> StoreResult<()>;
    /// Removes the aircraft together with the flights linked to it.
    /// Operator and model are kept. Returns false when nothing was deleted.
    fn delete_aircraft(&self, icao24: &Icao24) -> StoreResult<bool>;
}

pub trait FlightStore {
    fn find_flight(&self, key: &FlightKey) -> StoreResult<Option<Flight>>;
    fn all_flights(&self) -> StoreResult<Vec<Flight>>;
    /// Subset of `keys` already present in the store
    fn existing_flight_keys(&self, keys: &[FlightKey]) -> StoreResult<HashSet<FlightKey>>;
    fn flights_for_aircraft(&self, icao24: &Icao24) -> StoreResult<Vec<Flight>>;
    /// Flights with no aircraft link whose icao24 is in `icao24s`
    fn orphan_flights_for(&self, icao24s: &HashSet<Icao24>) -> StoreResult<Vec<Flight>>;
    /// A linked aircraft must already exist
    fn insert_flights(&self, flights: &[Flight]) -> StoreResult<()>;
    /// Persists the aircraft link of flights already in the store
    fn update_flight_links(&self, flights: &[Flight]) -> StoreResult<()>;
}

/// Everything the engines need from persistence
pub trait Store: AircraftStore + FlightStore + OperatorStore + ModelStore + Send + Sync {}

impl<T> Store for T where T: AircraftStore + FlightStore + OperatorStore + ModelStore + Send + Sync {}
