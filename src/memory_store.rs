use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;

use crate::aircraft::{Aircraft, Icao24};
use crate::aircraft_models::AircraftModel;
use crate::flights::{Flight, FlightKey};
use crate::operators::Operator;
use crate::store::{
    AircraftStore, EntityKind, FlightStore, ModelStore, OperatorStore, StoreError, StoreResult,
};

/// In-process store enforcing the same keys and references as the SQL schema.
///
/// Reads go straight to the maps. Writes hold `write_gate` so the
/// check-then-insert of a multi-row insert is atomic.
#[derive(Default)]
pub struct MemoryStore {
    aircraft: DashMap<Icao24, Aircraft>,
    flights: DashMap<FlightKey, Flight>,
    operators: DashMap<String, Operator>,
    models: DashMap<String, AircraftModel>,
    write_gate: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_aircraft_references(&self, aircraft: &Aircraft) -> StoreResult<()> {
        if !self.operators.contains_key(&aircraft.operator) {
            return Err(StoreError::integrity(
                EntityKind::Aircraft,
                &aircraft.icao24,
                format!("operator {:?} does not exist", aircraft.operator),
            ));
        }
        if !self.models.contains_key(&aircraft.model) {
            return Err(StoreError::integrity(
                EntityKind::Aircraft,
                &aircraft.icao24,
                format!("model {:?} does not exist", aircraft.model),
            ));
        }
        Ok(())
    }

    fn check_flight_link(&self, flight: &Flight) -> StoreResult<()> {
        if let Some(link) = &flight.aircraft {
            if *link != flight.icao24 {
                return Err(StoreError::integrity(
                    EntityKind::Flight,
                    flight.key(),
                    format!("linked to aircraft {} with a different address", link),
                ));
            }
            if !self.aircraft.contains_key(link) {
                return Err(StoreError::integrity(
                    EntityKind::Flight,
                    flight.key(),
                    format!("aircraft {} does not exist", link),
                ));
            }
        }
        Ok(())
    }
}

impl OperatorStore for MemoryStore {
    fn find_operator(&self, name: &str) -> StoreResult<Option<Operator>> {
        Ok(self.operators.get(name).map(|entry| entry.value().clone()))
    }

    fn all_operators(&self) -> StoreResult<Vec<Operator>> {
        let mut operators: Vec<Operator> =
            self.operators.iter().map(|e| e.value().clone()).collect();
        operators.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(operators)
    }

    fn insert_operators(&self, operators: &[Operator]) -> StoreResult<()> {
        let _guard = self.write_gate.lock();
        let mut seen = HashSet::new();
        for operator in operators {
            if !seen.insert(operator.name.as_str()) || self.operators.contains_key(&operator.name)
            {
                return Err(StoreError::integrity(
                    EntityKind::Operator,
                    &operator.name,
                    "duplicate operator name",
                ));
            }
        }
        for operator in operators {
            self.operators
                .insert(operator.name.clone(), operator.clone());
        }
        Ok(())
    }
}

impl ModelStore for MemoryStore {
    fn find_model(&self, name: &str) -> StoreResult<Option<AircraftModel>> {
        Ok(self.models.get(name).map(|entry| entry.value().clone()))
    }

    fn all_models(&self) -> StoreResult<Vec<AircraftModel>> {
        let mut models: Vec<AircraftModel> =
            self.models.iter().map(|e| e.value().clone()).collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }

    fn insert_models(&self, models: &[AircraftModel]) -> StoreResult<()> {
        let _guard = self.write_gate.lock();
        let mut seen = HashSet::new();
        for model in models {
            if !seen.insert(model.name.as_str()) || self.models.contains_key(&model.name) {
                return Err(StoreError::integrity(
                    EntityKind::Model,
                    &model.name,
                    "duplicate model name",
                ));
            }
        }
        for model in models {
            self.models.insert(model.name.clone(), model.clone());
        }
        Ok(())
    }
}

impl AircraftStore for MemoryStore {
    fn find_aircraft(&self, icao24: &Icao24) -> StoreResult<Option<Aircraft>> {
        Ok(self.aircraft.get(icao24).map(|entry| entry.value().clone()))
    }

    fn all_aircraft(&self) -> StoreResult<Vec<Aircraft>> {
        let mut aircraft: Vec<Aircraft> =
            self.aircraft.iter().map(|e| e.value().clone()).collect();
        aircraft.sort_by(|a, b| a.icao24.cmp(&b.icao24));
        Ok(aircraft)
    }

    fn all_icao24s(&self) -> StoreResult<HashSet<Icao24>> {
        Ok(self.aircraft.iter().map(|e| e.key().clone()).collect())
    }

    fn aircraft_by_operator(&self, operator: &str) -> StoreResult<Vec<Aircraft>> {
        Ok(self
            .all_aircraft()?
            .into_iter()
            .filter(|a| a.operator == operator)
            .collect())
    }

    fn aircraft_by_model(&self, model: &str) -> StoreResult<Vec<Aircraft>> {
        Ok(self
            .all_aircraft()?
            .into_iter()
            .filter(|a| a.model == model)
            .collect())
    }

    fn insert_aircraft(&self, aircraft: &[Aircraft]) -> StoreResult<()> {
        let _guard = self.write_gate.lock();
        let mut seen = HashSet::new();
        for entry in aircraft {
            if !seen.insert(&entry.icao24) || self.aircraft.contains_key(&entry.icao24) {
                return Err(StoreError::integrity(
                    EntityKind::Aircraft,
                    &entry.icao24,
                    "duplicate icao24",
                ));
            }
            self.check_aircraft_references(entry)?;
        }
        for entry in aircraft {
            self.aircraft.insert(entry.icao24.clone(), entry.clone());
        }
        Ok(())
    }

    fn update_aircraft(&self, aircraft: &Aircraft) -> StoreResult<()> {
        let _guard = self.write_gate.lock();
        if !self.aircraft.contains_key(&aircraft.icao24) {
            return Err(StoreError::not_found(EntityKind::Aircraft, &aircraft.icao24));
        }
        self.check_aircraft_references(aircraft)?;
        self.aircraft
            .insert(aircraft.icao24.clone(), aircraft.clone());
        Ok(())
    }

    fn delete_aircraft(&self, icao24: &Icao24) -> StoreResult<bool> {
        let _guard = self.write_gate.lock();
        if self.aircraft.remove(icao24).is_none() {
            return Ok(false);
        }
        self.flights
            .retain(|_, flight| flight.aircraft.as_ref() != Some(icao24));
        Ok(true)
    }
}

impl FlightStore for MemoryStore {
    fn find_flight(&self, key: &FlightKey) -> StoreResult<Option<Flight>> {
        Ok(self.flights.get(key).map(|entry| entry.value().clone()))
    }

    fn all_flights(&self) -> StoreResult<Vec<Flight>> {
        let mut flights: Vec<Flight> = self.flights.iter().map(|e| e.value().clone()).collect();
        flights.sort_by_key(|f| f.key());
        Ok(flights)
    }

    fn existing_flight_keys(&self, keys: &[FlightKey]) -> StoreResult<HashSet<FlightKey>> {
        Ok(keys
            .iter()
            .filter(|key| self.flights.contains_key(*key))
            .cloned()
            .collect())
    }

    fn flights_for_aircraft(&self, icao24: &Icao24) -> StoreResult<Vec<Flight>> {
        Ok(self
            .all_flights()?
            .into_iter()
            .filter(|f| f.aircraft.as_ref() == Some(icao24))
            .collect())
    }

    fn orphan_flights_for(&self, icao24s: &HashSet<Icao24>) -> StoreResult<Vec<Flight>> {
        Ok(self
            .all_flights()?
            .into_iter()
            .filter(|f| f.is_orphan() && icao24s.contains(&f.icao24))
            .collect())
    }

    fn insert_flights(&self, flights: &[Flight]) -> StoreResult<()> {
        let _guard = self.write_gate.lock();
        let mut seen = HashSet::new();
        for flight in flights {
            let key = flight.key();
            if self.flights.contains_key(&key) || !seen.insert(key.clone()) {
                return Err(StoreError::integrity(
                    EntityKind::Flight,
                    key,
                    "duplicate (icao24, first_seen)",
                ));
            }
            self.check_flight_link(flight)?;
        }
        for flight in flights {
            self.flights.insert(flight.key(), flight.clone());
        }
        Ok(())
    }

    fn update_flight_links(&self, flights: &[Flight]) -> StoreResult<()> {
        let _guard = self.write_gate.lock();
        for flight in flights {
            if !self.flights.contains_key(&flight.key()) {
                return Err(StoreError::not_found(EntityKind::Flight, flight.key()));
            }
            self.check_flight_link(flight)?;
        }
        for flight in flights {
            if let Some(mut stored) = self.flights.get_mut(&flight.key()) {
                stored.aircraft = flight.aircraft.clone();
            }
        }
        Ok(())
    }
}
