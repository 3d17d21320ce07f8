//! Isolated PostgreSQL databases for integration tests.
//!
//! Each [`TestDatabase`] creates `flightops_test_<random>` on the server named
//! by `TEST_DATABASE_URL` (default `postgresql://localhost/flightops_test`),
//! applies the migrations and drops the database again on `Drop`.
//!
//! ```no_run
//! let Some(test_db) = TestDatabase::try_new() else { return };
//! let store = test_db.store();
//! ```

use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use flightops::db::PgStore;

pub struct TestDatabase {
    db_name: String,
    store: PgStore,
    admin_url: String,
}

impl TestDatabase {
    /// Creates a fresh database, or `None` when no server is reachable so
    /// the calling test can skip itself.
    pub fn try_new() -> Option<Self> {
        match Self::new() {
            Ok(db) => Some(db),
            Err(e) => {
                eprintln!("Skipping database test: {:#}", e);
                None
            }
        }
    }

    pub fn new() -> Result<Self> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/flightops_test".to_string());
        let (server_url, _) = base_url
            .rsplit_once('/')
            .context("TEST_DATABASE_URL has no database name")?;

        let admin_url = format!("{}/postgres", server_url);
        let db_name = format!("flightops_test_{}", uuid::Uuid::new_v4().simple());

        let mut admin_conn = PgConnection::establish(&admin_url)
            .with_context(|| format!("Failed to connect to {}", admin_url))?;
        diesel::sql_query(format!("CREATE DATABASE {}", db_name))
            .execute(&mut admin_conn)
            .with_context(|| format!("Failed to create {}", db_name))?;

        let manager = ConnectionManager::<PgConnection>::new(format!("{}/{}", server_url, db_name));
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .with_context(|| format!("Failed to create connection pool for {}", db_name))?;
        let store = PgStore::new(pool);
        store.run_migrations()?;

        Ok(Self {
            db_name,
            store,
            admin_url,
        })
    }

    pub fn store(&self) -> PgStore {
        self.store.clone()
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Ok(mut admin_conn) = PgConnection::establish(&self.admin_url) {
            let _ = diesel::sql_query(format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", self.db_name))
                .execute(&mut admin_conn);
        }
    }
}
