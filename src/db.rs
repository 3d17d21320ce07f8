//! PostgreSQL backend. Each `*_repo` module implements one store trait for
//! [`PgStore`]; this module owns the pool, migrations and error mapping.

use anyhow::{Context, anyhow};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::fmt;
use tracing::info;

use crate::store::{EntityKind, StoreError, StoreResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Rows per INSERT statement; keeps bind parameters well under the protocol limit
pub(crate) const INSERT_CHUNK_SIZE: usize = 1000;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn connect(database_url: &str) -> anyhow::Result<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .context("Failed to create database pool")?;
        info!("Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    pub fn run_migrations(&self) -> anyhow::Result<()> {
        let mut conn = self.get_connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to run database migrations: {}", e))?;
        info!("Applied {} database migration(s)", applied.len());
        Ok(())
    }

    pub(crate) fn get_connection(&self) -> anyhow::Result<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|e| anyhow!("Failed to get database connection: {}", e))
    }
}

/// Constraint violations become [`StoreError::Integrity`]; anything else is a
/// backend failure.
pub(crate) fn store_error(entity: EntityKind, key: impl fmt::Display, e: DieselError) -> StoreError {
    match e {
        DieselError::DatabaseError(
            kind @ (DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::CheckViolation
            | DatabaseErrorKind::NotNullViolation),
            info,
        ) => StoreError::integrity(entity, key, format!("{:?}: {}", kind, info.message())),
        other => StoreError::Backend(
            anyhow::Error::new(other).context(format!("Database error on {} {}", entity, key)),
        ),
    }
}

pub(crate) fn batch_key(len: usize) -> String {
    format!("batch of {}", len)
}

pub(crate) fn conn(store: &PgStore) -> StoreResult<PgPooledConnection> {
    store.get_connection().map_err(StoreError::Backend)
}
