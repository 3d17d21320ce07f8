use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::aircraft::{
    Aircraft, AircraftPatch, AircraftRecord, Icao24, ValidationError, check_reference_field,
};
use crate::aircraft_models::AircraftModel;
use crate::flight_ingest::{FlightIngestReport, ingest_flights};
use crate::flight_order::{FlightOrderError, sort_flights};
use crate::flights::{Flight, FlightRecord};
use crate::operators::Operator;
use crate::reconcile::{ReconcileReport, reconcile, relink_orphans};
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AircraftError {
    #[error("aircraft {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    InvalidState(#[from] FlightOrderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AircraftResult<T> = Result<T, AircraftError>;

/// Entry point for every read and write of aircraft data.
///
/// Writers are serialised through `write_lock`, so two batches never race to
/// create the same aircraft, operator or model. Reads do not take the lock.
pub struct AircraftService {
    store: Arc<dyn Store>,
    write_lock: Mutex<()>,
    generation: AtomicU64,
}

impl AircraftService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Bumped after every write; lets caches tell stale results apart
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn written(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn lookup(&self, icao24: &str) -> AircraftResult<Aircraft> {
        let not_found = || AircraftError::NotFound(icao24.to_string());
        let key = Icao24::parse(icao24).map_err(|_| not_found())?;
        self.store.find_aircraft(&key)?.ok_or_else(not_found)
    }

    pub fn list(&self) -> AircraftResult<Vec<AircraftRecord>> {
        Ok(self
            .store
            .all_aircraft()?
            .iter()
            .map(Aircraft::to_record)
            .collect())
    }

    pub fn get(&self, icao24: &str) -> AircraftResult<AircraftRecord> {
        Ok(self.lookup(icao24)?.to_record())
    }

    /// Creates one aircraft. Returns `None` when the record is invalid or the
    /// aircraft already exists; nothing is written in that case.
    #[tracing::instrument(skip(self, record), fields(icao24 = %record.icao24))]
    pub fn create(&self, record: &AircraftRecord) -> AircraftResult<Option<AircraftRecord>> {
        let _guard = self.write_lock.lock();

        let aircraft = match record.validate() {
            Ok(aircraft) => aircraft,
            Err(e) => {
                debug!("Not creating aircraft: {}", e);
                return Ok(None);
            }
        };
        if self.store.find_aircraft(&aircraft.icao24)?.is_some() {
            debug!("Aircraft {} already exists", aircraft.icao24);
            return Ok(None);
        }

        self.ensure_operator(&aircraft.operator)?;
        self.ensure_model(&aircraft.model)?;
        self.store.insert_aircraft(std::slice::from_ref(&aircraft))?;
        self.written();

        let mut failures = Vec::new();
        let created: HashSet<Icao24> = [aircraft.icao24.clone()].into_iter().collect();
        let relinked = relink_orphans(self.store(), &created, &mut failures)?;
        for failure in &failures {
            warn!("Flight {} left unlinked: {}", failure.key, failure.reason);
        }

        info!(
            "Created aircraft {} ({} flights relinked)",
            aircraft.icao24,
            relinked.len()
        );
        Ok(Some(aircraft.to_record()))
    }

    pub fn create_bulk(&self, batch: &[AircraftRecord]) -> AircraftResult<ReconcileReport> {
        let _guard = self.write_lock.lock();
        let report = reconcile(self.store(), batch)?;
        self.written();
        Ok(report)
    }

    pub fn ingest_flights(&self, batch: &[FlightRecord]) -> AircraftResult<FlightIngestReport> {
        let _guard = self.write_lock.lock();
        let report = ingest_flights(self.store(), batch)?;
        self.written();
        Ok(report)
    }

    /// Replaces model, operator and owner. All three must be valid.
    /// An unknown icao24 is NotFound whatever the body holds.
    #[tracing::instrument(skip(self, record))]
    pub fn replace(&self, icao24: &str, record: &AircraftRecord) -> AircraftResult<AircraftRecord> {
        self.lookup(icao24)?;
        let patch = AircraftPatch {
            model: Some(check_reference_field("model", record.model.as_deref())?.to_string()),
            operator: Some(
                check_reference_field("operator", record.operator.as_deref())?.to_string(),
            ),
            owner: Some(check_reference_field("owner", record.owner.as_deref())?.to_string()),
        };
        self.patch(icao24, &patch)
    }

    /// Updates only the fields present in `patch`
    #[tracing::instrument(skip(self, patch))]
    pub fn patch(&self, icao24: &str, patch: &AircraftPatch) -> AircraftResult<AircraftRecord> {
        let _guard = self.write_lock.lock();
        let mut aircraft = self.lookup(icao24)?;

        let model = patch
            .model
            .as_deref()
            .map(|m| check_reference_field("model", Some(m)))
            .transpose()?;
        let operator = patch
            .operator
            .as_deref()
            .map(|o| check_reference_field("operator", Some(o)))
            .transpose()?;
        let owner = patch
            .owner
            .as_deref()
            .map(|o| check_reference_field("owner", Some(o)))
            .transpose()?;

        if let Some(model) = model {
            self.ensure_model(model)?;
            aircraft.model = model.to_string();
        }
        if let Some(operator) = operator {
            self.ensure_operator(operator)?;
            aircraft.operator = operator.to_string();
        }
        if let Some(owner) = owner {
            aircraft.owner = owner.to_string();
        }

        match self.store.update_aircraft(&aircraft) {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => {
                return Err(AircraftError::NotFound(icao24.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        self.written();
        info!("Updated aircraft {}", aircraft.icao24);
        Ok(aircraft.to_record())
    }

    /// Deletes the aircraft and its flights; operator and model stay
    pub fn delete(&self, icao24: &str) -> AircraftResult<()> {
        let _guard = self.write_lock.lock();
        let aircraft = self.lookup(icao24)?;
        if !self.store.delete_aircraft(&aircraft.icao24)? {
            return Err(AircraftError::NotFound(icao24.to_string()));
        }
        self.written();
        info!("Deleted aircraft {}", aircraft.icao24);
        Ok(())
    }

    /// Flights of an aircraft in display order
    pub fn flights_for(&self, icao24: &str) -> AircraftResult<Vec<Flight>> {
        let aircraft = self.lookup(icao24)?;
        let mut flights = self.store.flights_for_aircraft(&aircraft.icao24)?;
        sort_flights(&mut flights)?;
        Ok(flights)
    }

    pub fn aircraft_for_operator(&self, operator: &str) -> AircraftResult<Vec<AircraftRecord>> {
        Ok(self
            .store
            .aircraft_by_operator(operator)?
            .iter()
            .map(Aircraft::to_record)
            .collect())
    }

    pub fn aircraft_for_model(&self, model: &str) -> AircraftResult<Vec<AircraftRecord>> {
        Ok(self
            .store
            .aircraft_by_model(model)?
            .iter()
            .map(Aircraft::to_record)
            .collect())
    }

    fn ensure_operator(&self, name: &str) -> AircraftResult<()> {
        if self.store.find_operator(name)?.is_none() {
            debug!("Creating operator {:?}", name);
            self.store.insert_operators(&[Operator::new(name)])?;
        }
        Ok(())
    }

    fn ensure_model(&self, name: &str) -> AircraftResult<()> {
        if self.store.find_model(name)?.is_none() {
            debug!("Creating model {:?}", name);
            self.store.insert_models(&[AircraftModel::new(name)])?;
        }
        Ok(())
    }
}
