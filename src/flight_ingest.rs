use metrics::counter;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::flights::{FlightKey, FlightRecord};
use crate::reconcile::{PersistFailure, RejectedRecord, persist_stage};
use crate::store::{EntityKind, Store, StoreResult};

/// Outcome of one flight batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlightIngestReport {
    pub rejected: Vec<RejectedRecord>,
    /// Already stored, or repeated earlier in the same batch
    pub duplicates: Vec<FlightKey>,
    pub linked: Vec<FlightKey>,
    pub orphaned: Vec<FlightKey>,
    pub failures: Vec<PersistFailure>,
}

impl FlightIngestReport {
    pub fn inserted(&self) -> usize {
        self.linked.len() + self.orphaned.len()
    }
}

/// Stores a batch of flights.
///
/// A flight whose aircraft is already stored is linked right away; the others
/// are kept as orphans until reconciliation creates their aircraft.
#[tracing::instrument(skip(store, batch), fields(records = batch.len()))]
pub fn ingest_flights<S: Store + ?Sized>(
    store: &S,
    batch: &[FlightRecord],
) -> StoreResult<FlightIngestReport> {
    let mut report = FlightIngestReport::default();
    counter!("flight_ingest.records_total").increment(batch.len() as u64);

    let mut seen = HashSet::new();
    let mut flights = Vec::with_capacity(batch.len());
    for record in batch {
        match record.to_flight() {
            Ok(flight) => {
                if seen.insert(flight.key()) {
                    flights.push(flight);
                } else {
                    report.duplicates.push(flight.key());
                }
            }
            Err(e) => {
                debug!("Dropping flight record {:?}: {}", record.icao24, e);
                report.rejected.push(RejectedRecord {
                    icao24: record.icao24.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let keys: Vec<FlightKey> = flights.iter().map(|f| f.key()).collect();
    let stored = store.existing_flight_keys(&keys)?;
    let known_aircraft = store.all_icao24s()?;

    let mut new_flights = Vec::with_capacity(flights.len());
    for mut flight in flights {
        if stored.contains(&flight.key()) {
            report.duplicates.push(flight.key());
            continue;
        }
        if known_aircraft.contains(&flight.icao24) {
            flight.aircraft = Some(flight.icao24.clone());
        }
        new_flights.push(flight);
    }

    let written = persist_stage(
        EntityKind::Flight,
        &new_flights,
        |f| f.key().to_string(),
        |rows| store.insert_flights(rows),
        &mut report.failures,
    )?;
    for flight in written {
        if flight.is_orphan() {
            report.orphaned.push(flight.key());
        } else {
            report.linked.push(flight.key());
        }
    }

    counter!("flight_ingest.flights_inserted_total").increment(report.inserted() as u64);
    counter!("flight_ingest.orphans_total").increment(report.orphaned.len() as u64);

    info!(
        "Ingested {} flight records: {} linked, {} orphaned, {} duplicates, {} rejected, {} failures",
        batch.len(),
        report.linked.len(),
        report.orphaned.len(),
        report.duplicates.len(),
        report.rejected.len(),
        report.failures.len()
    );

    Ok(report)
}
