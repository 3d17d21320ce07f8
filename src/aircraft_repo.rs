use anyhow::anyhow;
use diesel::prelude::*;
use std::collections::HashSet;

use crate::aircraft::{Aircraft, Icao24};
use crate::db::{INSERT_CHUNK_SIZE, PgStore, batch_key, conn, store_error};
use crate::schema::aircraft;
use crate::store::{AircraftStore, EntityKind, StoreError, StoreResult};

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = aircraft)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AircraftRow {
    icao24: String,
    owner: String,
    model_name: String,
    operator_name: String,
}

impl From<&Aircraft> for AircraftRow {
    fn from(a: &Aircraft) -> Self {
        Self {
            icao24: a.icao24.as_str().to_string(),
            owner: a.owner.clone(),
            model_name: a.model.clone(),
            operator_name: a.operator.clone(),
        }
    }
}

/// Stored addresses passed the table's CHECK constraint, so a parse failure
/// means the schema and the code disagree.
pub(crate) fn stored_icao24(raw: &str) -> StoreResult<Icao24> {
    Icao24::parse(raw).map_err(|e| StoreError::Backend(anyhow!("Stored icao24 {:?}: {}", raw, e)))
}

impl TryFrom<AircraftRow> for Aircraft {
    type Error = StoreError;

    fn try_from(row: AircraftRow) -> StoreResult<Self> {
        Ok(Aircraft::new(
            stored_icao24(&row.icao24)?,
            row.model_name,
            row.operator_name,
            row.owner,
        ))
    }
}

fn to_aircraft(rows: Vec<AircraftRow>) -> StoreResult<Vec<Aircraft>> {
    rows.into_iter().map(Aircraft::try_from).collect()
}

impl AircraftStore for PgStore {
    fn find_aircraft(&self, icao24: &Icao24) -> StoreResult<Option<Aircraft>> {
        let mut conn = conn(self)?;
        let row = aircraft::table
            .find(icao24.as_str())
            .select(AircraftRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| store_error(EntityKind::Aircraft, icao24, e))?;
        row.map(Aircraft::try_from).transpose()
    }

    fn all_aircraft(&self) -> StoreResult<Vec<Aircraft>> {
        let mut conn = conn(self)?;
        let rows = aircraft::table
            .select(AircraftRow::as_select())
            .order(aircraft::icao24.asc())
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Aircraft, "*", e))?;
        to_aircraft(rows)
    }

    fn all_icao24s(&self) -> StoreResult<HashSet<Icao24>> {
        let mut conn = conn(self)?;
        let keys: Vec<String> = aircraft::table
            .select(aircraft::icao24)
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Aircraft, "*", e))?;
        keys.iter().map(|k| stored_icao24(k)).collect()
    }

    fn aircraft_by_operator(&self, operator: &str) -> StoreResult<Vec<Aircraft>> {
        let mut conn = conn(self)?;
        let rows = aircraft::table
            .filter(aircraft::operator_name.eq(operator))
            .select(AircraftRow::as_select())
            .order(aircraft::icao24.asc())
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Operator, operator, e))?;
        to_aircraft(rows)
    }

    fn aircraft_by_model(&self, model: &str) -> StoreResult<Vec<Aircraft>> {
        let mut conn = conn(self)?;
        let rows = aircraft::table
            .filter(aircraft::model_name.eq(model))
            .select(AircraftRow::as_select())
            .order(aircraft::icao24.asc())
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Model, model, e))?;
        to_aircraft(rows)
    }

    fn insert_aircraft(&self, batch: &[Aircraft]) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let rows: Vec<AircraftRow> = batch.iter().map(AircraftRow::from).collect();

        let mut conn = conn(self)?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                diesel::insert_into(aircraft::table)
                    .values(chunk)
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| store_error(EntityKind::Aircraft, batch_key(rows.len()), e))
    }

    fn update_aircraft(&self, entry: &Aircraft) -> StoreResult<()> {
        let mut conn = conn(self)?;
        let updated = diesel::update(aircraft::table.find(entry.icao24.as_str()))
            .set((
                aircraft::owner.eq(&entry.owner),
                aircraft::model_name.eq(&entry.model),
                aircraft::operator_name.eq(&entry.operator),
                aircraft::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .map_err(|e| store_error(EntityKind::Aircraft, &entry.icao24, e))?;
        if updated == 0 {
            return Err(StoreError::not_found(EntityKind::Aircraft, &entry.icao24));
        }
        Ok(())
    }

    fn delete_aircraft(&self, icao24: &Icao24) -> StoreResult<bool> {
        let mut conn = conn(self)?;
        // Linked flights go with it through ON DELETE CASCADE
        let deleted = diesel::delete(aircraft::table.find(icao24.as_str()))
            .execute(&mut conn)
            .map_err(|e| store_error(EntityKind::Aircraft, icao24, e))?;
        Ok(deleted > 0)
    }
}
