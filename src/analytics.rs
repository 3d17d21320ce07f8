use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use tracing::debug;

use crate::aircraft::Icao24;
use crate::flights::Flight;
use crate::store::{Store, StoreResult};

/// One ranked analytics result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub icao24: Icao24,
    /// Percentage in [0, 100]
    pub value: f64,
}

impl Output {
    pub fn new(icao24: Icao24, value: f64) -> Self {
        Self { icao24, value }
    }
}

/// Ranked aircraft resolved to the operator flying it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedOperator {
    pub operator: String,
    pub icao24: Icao24,
    pub value: f64,
}

/// Share of long flights as a percentage. `None` when there are no flights.
pub fn long_flight_percentage<'a, I>(flights: I, threshold_seconds: i64) -> Option<f64>
where
    I: IntoIterator<Item = &'a Flight>,
{
    let (total, long) = flights.into_iter().fold((0usize, 0usize), |(total, long), f| {
        (total + 1, long + usize::from(f.is_long(threshold_seconds)))
    });
    if total == 0 {
        return None;
    }
    Some(long as f64 * 100.0 / total as f64)
}

/// Ranks aircraft by their share of long flights, highest first, ties by icao24.
///
/// Only flights linked to an aircraft count; orphans have no aircraft yet.
/// Aircraft without flights do not appear at all.
pub fn rank_by_long_flight_percentage(
    flights: &[Flight],
    threshold_seconds: i64,
    n: NonZeroUsize,
) -> Vec<Output> {
    let mut by_aircraft: BTreeMap<&Icao24, Vec<&Flight>> = BTreeMap::new();
    for flight in flights {
        if let Some(icao24) = &flight.aircraft {
            by_aircraft.entry(icao24).or_default().push(flight);
        }
    }

    let mut ranked: Vec<Output> = by_aircraft
        .into_iter()
        .filter_map(|(icao24, flights)| {
            long_flight_percentage(flights, threshold_seconds)
                .map(|value| Output::new(icao24.clone(), value))
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.icao24.cmp(&b.icao24))
    });
    ranked.truncate(n.get());
    ranked
}

/// Top `n` aircraft by share of flights longer than `threshold_seconds`
#[tracing::instrument(skip(store))]
pub fn top_n_by_long_flight_percentage<S: Store + ?Sized>(
    store: &S,
    threshold_seconds: i64,
    n: NonZeroUsize,
) -> StoreResult<Vec<Output>> {
    let flights = store.all_flights()?;
    let ranked = rank_by_long_flight_percentage(&flights, threshold_seconds, n);
    debug!(
        "Ranked {} aircraft from {} flights",
        ranked.len(),
        flights.len()
    );
    Ok(ranked)
}

/// Resolves each ranked aircraft to its operator, keeping the ranking order
pub fn resolve_operators<S: Store + ?Sized>(
    store: &S,
    outputs: &[Output],
) -> StoreResult<Vec<RankedOperator>> {
    let mut resolved = Vec::with_capacity(outputs.len());
    for output in outputs {
        match store.find_aircraft(&output.icao24)? {
            Some(aircraft) => resolved.push(RankedOperator {
                operator: aircraft.operator,
                icao24: output.icao24.clone(),
                value: output.value,
            }),
            None => debug!("Ranked aircraft {} vanished before lookup", output.icao24),
        }
    }
    Ok(resolved)
}

pub fn top_operators<S: Store + ?Sized>(
    store: &S,
    threshold_seconds: i64,
    n: NonZeroUsize,
) -> StoreResult<Vec<RankedOperator>> {
    let outputs = top_n_by_long_flight_percentage(store, threshold_seconds, n)?;
    resolve_operators(store, &outputs)
}
