//! Bulk aircraft ingestion.
//!
//! A batch goes through six steps, strictly in this order:
//!
//! 1. drop records whose icao24, operator, model or owner is invalid
//! 2. resolve operators and models by exact name, staging the missing ones
//!    once per batch
//! 3. drop candidates whose icao24 is already stored
//! 4. persist new operators, then models, then aircraft
//! 5. link orphan flights of every aircraft persisted in step 4
//! 6. echo every candidate from step 2, stored before or not
//!
//! Integrity violations in steps 4 and 5 never abort the batch. The failing
//! stage is retried row by row and each row that still fails is recorded in
//! [`ReconcileReport::failures`]; nothing already written is rolled back.

use metrics::counter;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::aircraft::{Aircraft, AircraftRecord, Icao24};
use crate::aircraft_models::AircraftModel;
use crate::flights::{Flight, FlightKey};
use crate::operators::Operator;
use crate::store::{EntityKind, Store, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub icao24: String,
    pub reason: String,
}

/// A row the store refused to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistFailure {
    pub entity: EntityKind,
    pub key: String,
    pub reason: String,
}

/// Outcome of one reconciliation batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Every valid record of the batch, normalised, including already stored aircraft
    pub records: Vec<AircraftRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub created_operators: Vec<String>,
    pub created_models: Vec<String>,
    pub created_aircraft: Vec<Icao24>,
    pub existing_aircraft: Vec<Icao24>,
    pub relinked_flights: Vec<FlightKey>,
    pub failures: Vec<PersistFailure>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[tracing::instrument(skip(store, batch), fields(records = batch.len()))]
pub fn reconcile<S: Store + ?Sized>(
    store: &S,
    batch: &[AircraftRecord],
) -> StoreResult<ReconcileReport> {
    let start = Instant::now();
    let mut report = ReconcileReport::default();
    counter!("reconcile.records_total").increment(batch.len() as u64);

    let mut candidates = Vec::with_capacity(batch.len());
    for record in batch {
        match record.validate() {
            Ok(aircraft) => candidates.push(aircraft),
            Err(e) => {
                debug!("Dropping aircraft record {:?}: {}", record.icao24, e);
                report.rejected.push(RejectedRecord {
                    icao24: record.icao24.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    counter!("reconcile.records_rejected_total").increment(report.rejected.len() as u64);

    let (new_operators, new_models) = stage_references(store, &candidates)?;

    let stored = store.all_icao24s()?;
    let mut new_aircraft = Vec::new();
    for candidate in &candidates {
        if stored.contains(&candidate.icao24) {
            report.existing_aircraft.push(candidate.icao24.clone());
        } else {
            new_aircraft.push(candidate.clone());
        }
    }

    report.created_operators = persist_stage(
        EntityKind::Operator,
        &new_operators,
        |o| o.name.clone(),
        |rows| store.insert_operators(rows),
        &mut report.failures,
    )?
    .into_iter()
    .map(|o| o.name.clone())
    .collect();

    report.created_models = persist_stage(
        EntityKind::Model,
        &new_models,
        |m| m.name.clone(),
        |rows| store.insert_models(rows),
        &mut report.failures,
    )?
    .into_iter()
    .map(|m| m.name.clone())
    .collect();

    report.created_aircraft = persist_stage(
        EntityKind::Aircraft,
        &new_aircraft,
        |a| a.icao24.to_string(),
        |rows| store.insert_aircraft(rows),
        &mut report.failures,
    )?
    .into_iter()
    .map(|a| a.icao24.clone())
    .collect();

    let created: HashSet<Icao24> = report.created_aircraft.iter().cloned().collect();
    report.relinked_flights = relink_orphans(store, &created, &mut report.failures)?;

    report.records = candidates.iter().map(Aircraft::to_record).collect();

    counter!("reconcile.aircraft_created_total").increment(report.created_aircraft.len() as u64);
    counter!("reconcile.flights_relinked_total").increment(report.relinked_flights.len() as u64);
    counter!("reconcile.integrity_failures_total").increment(report.failures.len() as u64);
    metrics::histogram!("reconcile.batch_ms").record(start.elapsed().as_secs_f64() * 1000.0);

    info!(
        "Reconciled {} records: {} rejected, {} existing, {} aircraft / {} operators / {} models created, {} flights relinked, {} failures",
        batch.len(),
        report.rejected.len(),
        report.existing_aircraft.len(),
        report.created_aircraft.len(),
        report.created_operators.len(),
        report.created_models.len(),
        report.relinked_flights.len(),
        report.failures.len()
    );

    Ok(report)
}

/// Resolves each candidate's operator and model against the store.
/// Names missing from the store are staged once, however many records use them.
fn stage_references<S: Store + ?Sized>(
    store: &S,
    candidates: &[Aircraft],
) -> StoreResult<(Vec<Operator>, Vec<AircraftModel>)> {
    let mut operators: HashMap<String, Operator> = store
        .all_operators()?
        .into_iter()
        .map(|o| (o.name.clone(), o))
        .collect();
    let mut models: HashMap<String, AircraftModel> = store
        .all_models()?
        .into_iter()
        .map(|m| (m.name.clone(), m))
        .collect();

    let mut new_operators = Vec::new();
    let mut new_models = Vec::new();

    for candidate in candidates {
        if !operators.contains_key(&candidate.operator) {
            debug!("Staging new operator {:?}", candidate.operator);
            let operator = Operator::new(candidate.operator.clone());
            operators.insert(operator.name.clone(), operator.clone());
            new_operators.push(operator);
        }
        if !models.contains_key(&candidate.model) {
            debug!("Staging new model {:?}", candidate.model);
            let model = AircraftModel::new(candidate.model.clone());
            models.insert(model.name.clone(), model.clone());
            new_models.push(model);
        }
    }

    Ok((new_operators, new_models))
}

/// Links every orphan flight whose icao24 is in `icao24s` to that aircraft.
/// The aircraft must already be persisted.
pub(crate) fn relink_orphans<S: Store + ?Sized>(
    store: &S,
    icao24s: &HashSet<Icao24>,
    failures: &mut Vec<PersistFailure>,
) -> StoreResult<Vec<FlightKey>> {
    if icao24s.is_empty() {
        return Ok(Vec::new());
    }

    let mut orphans = store.orphan_flights_for(icao24s)?;
    for flight in &mut orphans {
        flight.aircraft = Some(flight.icao24.clone());
    }

    let linked = persist_stage(
        EntityKind::Flight,
        &orphans,
        |f| f.key().to_string(),
        |rows| store.update_flight_links(rows),
        failures,
    )?;

    Ok(linked.into_iter().map(Flight::key).collect())
}

/// Writes `rows` in one call. On an integrity violation, retries one row at a
/// time and records the rows that still fail. Returns the rows that were written.
pub(crate) fn persist_stage<'a, T>(
    entity: EntityKind,
    rows: &'a [T],
    key: impl Fn(&T) -> String,
    write: impl Fn(&[T]) -> StoreResult<()>,
    failures: &mut Vec<PersistFailure>,
) -> StoreResult<Vec<&'a T>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    match write(rows) {
        Ok(()) => return Ok(rows.iter().collect()),
        Err(e) if e.is_integrity() => {
            warn!(
                "Saving {} {} rows failed ({}), retrying row by row",
                rows.len(),
                entity,
                e
            );
        }
        Err(e) => return Err(e),
    }

    let mut written = Vec::with_capacity(rows.len());
    for row in rows {
        match write(std::slice::from_ref(row)) {
            Ok(()) => written.push(row),
            Err(e) if e.is_integrity() => {
                warn!("Error saving {} {}: {}", entity, key(row), e);
                failures.push(PersistFailure {
                    entity,
                    key: key(row),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::store::{AircraftStore, FlightStore, ModelStore, OperatorStore};

    fn icao(s: &str) -> Icao24 {
        Icao24::parse(s).unwrap()
    }

    fn sample_batch() -> Vec<AircraftRecord> {
        vec![
            AircraftRecord::new("a1b2c3", "A321", "Delta", "Wells Fargo"),
            AircraftRecord::new("a1b2c4", "B739", "Delta", "Delta Air Lines"),
            AircraftRecord::new("0d0a11", "A321", "LOT", "LOT"),
        ]
    }

    #[test]
    fn test_new_operator_is_created_once_per_batch() {
        let store = MemoryStore::new();
        let report = reconcile(&store, &sample_batch()).unwrap();

        assert_eq!(report.created_operators, vec!["Delta", "LOT"]);
        assert_eq!(report.created_models, vec!["A321", "B739"]);
        assert_eq!(store.all_operators().unwrap().len(), 2);

        let fleet = store.aircraft_by_operator("Delta").unwrap();
        assert_eq!(fleet.len(), 2);
        assert!(fleet.iter().all(|a| a.operator == "Delta"));
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let store = MemoryStore::new();
        let first = reconcile(&store, &sample_batch()).unwrap();
        let second = reconcile(&store, &sample_batch()).unwrap();

        assert!(second.created_aircraft.is_empty());
        assert!(second.created_operators.is_empty());
        assert!(second.created_models.is_empty());
        assert_eq!(second.existing_aircraft.len(), 3);

        let icaos = |r: &ReconcileReport| {
            r.records
                .iter()
                .map(|rec| rec.icao24.clone())
                .collect::<HashSet<_>>()
        };
        assert_eq!(icaos(&first), icaos(&second));
        assert_eq!(store.all_aircraft().unwrap().len(), 3);
        assert_eq!(store.all_models().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_records_are_dropped_silently() {
        let store = MemoryStore::new();
        let batch = vec![
            AircraftRecord::new("abc001", "M", "", "O"),
            AircraftRecord::new("abc002", "M", "NULL", "O"),
            AircraftRecord {
                icao24: "abc003".into(),
                model: None,
                operator: Some("Op".into()),
                owner: Some("O".into()),
            },
            AircraftRecord::new("not-hex", "M", "Op", "O"),
            AircraftRecord::new("abc004", "M", "Op", "O"),
        ];

        let report = reconcile(&store, &batch).unwrap();

        assert_eq!(report.rejected.len(), 4);
        assert_eq!(report.created_aircraft, vec![icao("ABC004")]);
        assert_eq!(report.records.len(), 1);
        assert!(store.find_operator("").unwrap().is_none());
        assert!(store.find_operator("NULL").unwrap().is_none());
    }

    #[test]
    fn test_existing_aircraft_are_echoed_but_not_recreated() {
        let store = MemoryStore::new();
        reconcile(&store, &sample_batch()[..1]).unwrap();

        let report = reconcile(&store, &sample_batch()).unwrap();

        assert_eq!(report.existing_aircraft, vec![icao("A1B2C3")]);
        assert_eq!(report.created_aircraft.len(), 2);
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[0].icao24, "A1B2C3");
    }

    #[test]
    fn test_orphan_flights_are_linked_to_new_aircraft() {
        let store = MemoryStore::new();
        let orphan = Flight::new(icao("ABC123"), 1_700_000_000, 1_700_003_600).unwrap();
        let unrelated = Flight::new(icao("FFF000"), 1_700_000_000, 1_700_003_600).unwrap();
        store
            .insert_flights(&[orphan.clone(), unrelated.clone()])
            .unwrap();

        let report = reconcile(
            &store,
            &[AircraftRecord::new("abc123", "A20N", "Wizz Air", "Wizz Air")],
        )
        .unwrap();

        assert_eq!(report.relinked_flights, vec![orphan.key()]);

        let stored = store.find_flight(&orphan.key()).unwrap().unwrap();
        assert_eq!(stored.aircraft, Some(icao("ABC123")));
        assert!(
            store
                .flights_for_aircraft(&icao("ABC123"))
                .unwrap()
                .contains(&orphan)
        );
        assert!(
            store
                .find_flight(&unrelated.key())
                .unwrap()
                .unwrap()
                .is_orphan()
        );
    }

    #[test]
    fn test_integrity_failure_is_recorded_and_batch_continues() {
        let store = MemoryStore::new();
        let orphan = Flight::new(icao("BBB222"), 0, 100).unwrap();
        store.insert_flights(&[orphan.clone()]).unwrap();

        // Same icao24 twice in one batch: the bulk insert violates uniqueness.
        let batch = vec![
            AircraftRecord::new("aaa111", "A320", "Delta", "First"),
            AircraftRecord::new("aaa111", "A320", "Delta", "Second"),
            AircraftRecord::new("bbb222", "A320", "Delta", "Third"),
        ];
        let report = reconcile(&store, &batch).unwrap();

        assert_eq!(
            report.created_aircraft,
            vec![icao("AAA111"), icao("BBB222")]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].entity, EntityKind::Aircraft);
        assert_eq!(report.failures[0].key, "AAA111");
        assert!(!report.is_clean());

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.relinked_flights, vec![orphan.key()]);
        let owner = store.find_aircraft(&icao("AAA111")).unwrap().unwrap().owner;
        assert_eq!(owner, "First");
    }

    #[test]
    fn test_existing_references_are_reused() {
        let store = MemoryStore::new();
        store.insert_operators(&[Operator::new("Delta")]).unwrap();
        store.insert_models(&[AircraftModel::new("A321")]).unwrap();

        let report = reconcile(&store, &sample_batch()[..1]).unwrap();

        assert!(report.created_operators.is_empty());
        assert!(report.created_models.is_empty());
        assert_eq!(report.created_aircraft.len(), 1);
    }

    #[test]
    fn test_operator_names_are_case_sensitive() {
        let store = MemoryStore::new();
        let batch = vec![
            AircraftRecord::new("c00001", "A320", "Delta", "O"),
            AircraftRecord::new("c00002", "A320", "DELTA", "O"),
        ];
        let report = reconcile(&store, &batch).unwrap();
        assert_eq!(report.created_operators, vec!["Delta", "DELTA"]);
    }
}
