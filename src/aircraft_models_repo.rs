use diesel::prelude::*;

use crate::aircraft_models::AircraftModel;
use crate::db::{INSERT_CHUNK_SIZE, PgStore, batch_key, conn, store_error};
use crate::schema::aircraft_models;
use crate::store::{EntityKind, ModelStore, StoreResult};

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = aircraft_models)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ModelRow {
    name: String,
}

impl ModelStore for PgStore {
    fn find_model(&self, name: &str) -> StoreResult<Option<AircraftModel>> {
        let mut conn = conn(self)?;
        let row = aircraft_models::table
            .filter(aircraft_models::name.eq(name))
            .select(ModelRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| store_error(EntityKind::Model, name, e))?;
        Ok(row.map(|r| AircraftModel::new(r.name)))
    }

    fn all_models(&self) -> StoreResult<Vec<AircraftModel>> {
        let mut conn = conn(self)?;
        let rows = aircraft_models::table
            .select(ModelRow::as_select())
            .order(aircraft_models::name.asc())
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Model, "*", e))?;
        Ok(rows.into_iter().map(|r| AircraftModel::new(r.name)).collect())
    }

    fn insert_models(&self, models: &[AircraftModel]) -> StoreResult<()> {
        if models.is_empty() {
            return Ok(());
        }
        let rows: Vec<ModelRow> = models
            .iter()
            .map(|m| ModelRow {
                name: m.name.clone(),
            })
            .collect();

        let mut conn = conn(self)?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                diesel::insert_into(aircraft_models::table)
                    .values(chunk)
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| store_error(EntityKind::Model, batch_key(rows.len()), e))
    }
}
