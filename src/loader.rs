use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

use crate::aircraft::AircraftRecord;
use crate::flights::FlightRecord;

/// File formats accepted by `ingest`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Csv,
    Json,
}

impl RecordFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(RecordFormat::Csv),
            Some("json") => Ok(RecordFormat::Json),
            _ => bail!("Unsupported file type {:?} (expected .csv or .json)", path),
        }
    }
}

/// Reads CSV rows with a header line. Extra columns are ignored and empty
/// cells become `None`. Rows that fail to parse are skipped with a warning.
pub fn read_csv<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut out = Vec::new();
    for (line, row) in csv_reader.deserialize::<T>().enumerate() {
        match row {
            Ok(record) => out.push(record),
            // +2: one for the header, one for 1-based line numbers
            Err(e) => warn!("Skipping CSV row {}: {}", line + 2, e),
        }
    }
    Ok(out)
}

/// Reads a JSON array of records
pub fn read_json<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    serde_json::from_reader(reader).context("Failed to parse JSON records")
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let format = RecordFormat::from_path(path)?;
    let f = File::open(path).with_context(|| format!("Opening {:?}", path))?;
    let reader = BufReader::new(f);
    let records = match format {
        RecordFormat::Csv => read_csv(reader)?,
        RecordFormat::Json => {
            read_json(reader).with_context(|| format!("Reading {:?}", path))?
        }
    };
    info!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

pub fn read_aircraft_file(path: &Path) -> Result<Vec<AircraftRecord>> {
    read_file(path)
}

pub fn read_flights_file(path: &Path) -> Result<Vec<FlightRecord>> {
    read_file(path)
}
