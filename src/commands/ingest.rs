use anyhow::{Context, Result};
use clap::Args;
use flightops::aircraft_service::AircraftService;
use flightops::loader::{read_aircraft_file, read_flights_file};
use std::path::PathBuf;
use tracing::{info, warn};

/// Input files shared by every command that loads data
#[derive(Args, Debug, Clone, Default)]
pub struct DataFiles {
    /// Aircraft file (.csv or .json); may be repeated
    #[arg(long = "aircraft")]
    pub aircraft: Vec<PathBuf>,
    /// Flights file (.csv or .json); may be repeated
    #[arg(long = "flights")]
    pub flights: Vec<PathBuf>,
}

impl DataFiles {
    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty() && self.flights.is_empty()
    }
}

/// Loads aircraft files first, then flights, so flights link immediately
/// whenever their aircraft is part of the same run.
pub fn handle_ingest(service: &AircraftService, files: &DataFiles) -> Result<()> {
    if files.is_empty() {
        warn!("Nothing to ingest: pass --aircraft and/or --flights");
        return Ok(());
    }

    for path in &files.aircraft {
        let records = read_aircraft_file(path)?;
        let report = service
            .create_bulk(&records)
            .with_context(|| format!("Reconciling aircraft from {:?}", path))?;
        info!(
            "{:?}: {} aircraft created, {} already known, {} rejected, {} flights relinked",
            path,
            report.created_aircraft.len(),
            report.existing_aircraft.len(),
            report.rejected.len(),
            report.relinked_flights.len()
        );
        for failure in &report.failures {
            warn!(
                "{:?}: {} {} not stored: {}",
                path, failure.entity, failure.key, failure.reason
            );
        }
    }

    for path in &files.flights {
        let records = read_flights_file(path)?;
        let report = service
            .ingest_flights(&records)
            .with_context(|| format!("Ingesting flights from {:?}", path))?;
        info!(
            "{:?}: {} flights stored ({} orphaned), {} duplicates, {} rejected",
            path,
            report.inserted(),
            report.orphaned.len(),
            report.duplicates.len(),
            report.rejected.len()
        );
        for failure in &report.failures {
            warn!(
                "{:?}: {} {} not stored: {}",
                path, failure.entity, failure.key, failure.reason
            );
        }
    }

    Ok(())
}
