use diesel::prelude::*;

use crate::db::{INSERT_CHUNK_SIZE, PgStore, batch_key, conn, store_error};
use crate::operators::Operator;
use crate::schema::operators;
use crate::store::{EntityKind, OperatorStore, StoreResult};

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = operators)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct OperatorRow {
    name: String,
}

impl OperatorStore for PgStore {
    fn find_operator(&self, name: &str) -> StoreResult<Option<Operator>> {
        let mut conn = conn(self)?;
        let row = operators::table
            .filter(operators::name.eq(name))
            .select(OperatorRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| store_error(EntityKind::Operator, name, e))?;
        Ok(row.map(|r| Operator::new(r.name)))
    }

    fn all_operators(&self) -> StoreResult<Vec<Operator>> {
        let mut conn = conn(self)?;
        let rows = operators::table
            .select(OperatorRow::as_select())
            .order(operators::name.asc())
            .load(&mut conn)
            .map_err(|e| store_error(EntityKind::Operator, "*", e))?;
        Ok(rows.into_iter().map(|r| Operator::new(r.name)).collect())
    }

    fn insert_operators(&self, operators: &[Operator]) -> StoreResult<()> {
        if operators.is_empty() {
            return Ok(());
        }
        let rows: Vec<OperatorRow> = operators
            .iter()
            .map(|o| OperatorRow {
                name: o.name.clone(),
            })
            .collect();

        let mut conn = conn(self)?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                diesel::insert_into(operators::table)
                    .values(chunk)
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| store_error(EntityKind::Operator, batch_key(rows.len()), e))
    }
}
