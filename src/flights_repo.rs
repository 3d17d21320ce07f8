use anyhow::anyhow;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use std::collections::HashSet;

use crate::aircraft::Icao24;
use crate::aircraft_repo::stored_icao24;
use crate::db::{INSERT_CHUNK_SIZE, PgStore, batch_key, conn, store_error};
use crate::flights::{Flight, FlightKey, Route};
use crate::schema::flights;
use crate::store::{EntityKind, FlightStore, StoreError, StoreResult};

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = flights)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct FlightRow {
    icao24: String,
    first_seen: i64,
    last_seen: i64,
    departure_airport: Option<String>,
    arrival_airport: Option<String>,
    aircraft_icao24: Option<String>,
}

impl From<&Flight> for FlightRow {
    fn from(f: &Flight) -> Self {
        let (departure_airport, arrival_airport) = match &f.route {
            Some(route) => (
                route.departure_airport.clone(),
                route.arrival_airport.clone(),
            ),
            None => (None, None),
        };
        Self {
            icao24: f.icao24.as_str().to_string(),
            first_seen: f.first_seen(),
            last_seen: f.last_seen(),
            departure_airport,
            arrival_airport,
            aircraft_icao24: f.aircraft.as_ref().map(|a| a.as_str().to_string()),
        }
    }
}

impl TryFrom<FlightRow> for Flight {
    type Error = StoreError;

    fn try_from(row: FlightRow) -> StoreResult<Self> {
        let icao24 = stored_icao24(&row.icao24)?;
        let mut flight = Flight::new(icao24, row.first_seen, row.last_seen)
            .map_err(|e| StoreError::Backend(anyhow!("Stored flight: {}", e)))?
            .with_route(Route::from_airports(
                row.departure_airport.as_deref(),
                row.arrival_airport.as_deref(),
            ));
        flight.aircraft = row
            .aircraft_icao24
            .as_deref()
            .map(stored_icao24)
            .transpose()?;
        Ok(flight)
    }
}

fn to_flights(rows: Vec<FlightRow>) -> StoreResult<Vec<Flight>> {
    rows.into_iter().map(Flight::try_from).collect()
}

impl FlightStore for PgStore {
    fn find_flight(&self, key: &FlightKey) -> StoreResult<Option<Flight>> {
        let mut conn = conn(self)?;
        let row = flights::table
            .find((key.icao24.as_str(), key.first_seen))
            .select(FlightRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| store_error(EntityKind::Flight, key, e))?;
        row.map(Flight::try_from).transpose()
    }

    fn all_flights(&self) -> StoreResult<Vec<Flight>> {
        let mut conn = conn(self)?;
        let rows = flights::table
            .select(FlightRow::as_select())
            .order((flights::icao24.asc(), flights::first_seen.asc()))
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Flight, "*", e))?;
        to_flights(rows)
    }

    fn existing_flight_keys(&self, keys: &[FlightKey]) -> StoreResult<HashSet<FlightKey>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }
        let wanted: HashSet<&FlightKey> = keys.iter().collect();
        let icao24s: Vec<&str> = keys
            .iter()
            .map(|k| k.icao24.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let first_seens: Vec<i64> = keys
            .iter()
            .map(|k| k.first_seen)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        // Over-fetches the cross product of both lists; the exact pairs are
        // picked out below.
        let mut conn = conn(self)?;
        let candidates: Vec<(String, i64)> = flights::table
            .filter(flights::icao24.eq_any(icao24s))
            .filter(flights::first_seen.eq_any(first_seens))
            .select((flights::icao24, flights::first_seen))
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Flight, batch_key(keys.len()), e))?;

        let mut existing = HashSet::new();
        for (icao24, first_seen) in candidates {
            let key = FlightKey {
                icao24: stored_icao24(&icao24)?,
                first_seen,
            };
            if wanted.contains(&key) {
                existing.insert(key);
            }
        }
        Ok(existing)
    }

    fn flights_for_aircraft(&self, icao24: &Icao24) -> StoreResult<Vec<Flight>> {
        let mut conn = conn(self)?;
        let rows = flights::table
            .filter(flights::aircraft_icao24.eq(icao24.as_str()))
            .select(FlightRow::as_select())
            .order(flights::first_seen.asc())
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Aircraft, icao24, e))?;
        to_flights(rows)
    }

    fn orphan_flights_for(&self, icao24s: &HashSet<Icao24>) -> StoreResult<Vec<Flight>> {
        if icao24s.is_empty() {
            return Ok(Vec::new());
        }
        let addresses: Vec<&str> = icao24s.iter().map(Icao24::as_str).collect();
        let count = addresses.len();
        let mut conn = conn(self)?;
        let rows = flights::table
            .filter(flights::aircraft_icao24.is_null())
            .filter(flights::icao24.eq_any(addresses))
            .select(FlightRow::as_select())
            .order((flights::icao24.asc(), flights::first_seen.asc()))
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Flight, batch_key(count), e))?;
        to_flights(rows)
    }

    fn insert_flights(&self, batch: &[Flight]) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let rows: Vec<FlightRow> = batch.iter().map(FlightRow::from).collect();

        let mut conn = conn(self)?;
        conn.transaction::<_, DieselError, _>(|conn| {
            for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                diesel::insert_into(flights::table)
                    .values(chunk)
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| store_error(EntityKind::Flight, batch_key(rows.len()), e))
    }

    fn update_flight_links(&self, batch: &[Flight]) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut missing = None;
        let mut conn = conn(self)?;
        let result = conn.transaction::<_, DieselError, _>(|conn| {
            for flight in batch {
                let updated = diesel::update(
                    flights::table.find((flight.icao24.as_str(), flight.first_seen())),
                )
                .set(flights::aircraft_icao24.eq(flight.aircraft.as_ref().map(Icao24::as_str)))
                .execute(conn)?;
                if updated == 0 {
                    missing = Some(flight.key());
                    return Err(DieselError::RollbackTransaction);
                }
            }
            Ok(())
        });

        match (result, missing) {
            (Err(_), Some(key)) => Err(StoreError::not_found(EntityKind::Flight, key)),
            (result, _) => {
                result.map_err(|e| store_error(EntityKind::Flight, batch_key(batch.len()), e))
            }
        }
    }
}
