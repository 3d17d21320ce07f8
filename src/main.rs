use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use flightops::aircraft_service::AircraftService;
use flightops::analytics_cache::AnalyticsCache;
use flightops::config::AppConfig;
use flightops::logging::init_tracing;
use flightops::memory_store::MemoryStore;
use flightops::store::Store;
use flightops::web::AppState;

mod commands;

use commands::{DataFiles, handle_ingest, handle_serve, handle_top_operators};

#[derive(Parser, Debug)]
#[command(
    name = "flightops",
    about = "Reconcile aircraft batches with tracked flights and rank long-haul fleets"
)]
struct Cli {
    /// Configuration file (defaults to $FLIGHTOPS_CONFIG or ./flightops.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// PostgreSQL URL; without it data lives in memory for this run only
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load aircraft and flight files into the store
    Ingest {
        #[command(flatten)]
        files: DataFiles,
    },
    /// Print the operators of the aircraft with the most long flights
    TopOperators {
        /// How many entries to print
        #[arg(short, long)]
        n: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
        #[command(flatten)]
        files: DataFiles,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        interface: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        files: DataFiles,
    },
}

fn open_store(database_url: Option<&str>) -> Result<Arc<dyn Store>> {
    #[cfg(feature = "postgres")]
    if let Some(url) = database_url {
        let store = flightops::db::PgStore::connect(url)?;
        store.run_migrations()?;
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "postgres"))]
    if database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but this build has no postgres support; using memory store");
    }

    info!("Using in-memory store");
    Ok(Arc::new(MemoryStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let store = open_store(cli.database_url.as_deref())?;
    let service = Arc::new(AircraftService::new(store));
    let analytics = AnalyticsCache::new(service.clone(), config.analytics.clone());

    match cli.command {
        Commands::Ingest { files } => handle_ingest(&service, &files),
        Commands::TopOperators { n, json, files } => {
            if !files.is_empty() {
                handle_ingest(&service, &files)?;
            }
            handle_top_operators(&analytics, n, json)
        }
        Commands::Serve {
            interface,
            port,
            files,
        } => {
            if !files.is_empty() {
                handle_ingest(&service, &files)?;
            }
            handle_serve(
                &config.web,
                interface,
                port,
                AppState::new(service.clone(), analytics),
            )
            .await
        }
    }
}
