use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

mod api;
mod config;
mod db;
mod error;
mod roster;
mod scoring;

use api::AppState;
use config::{Config, StorageBackend};
use db::Database;
use roster::Roster;
use scoring::{Scorer, Stores};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let stores = match config.storage {
        StorageBackend::Sqlite => {
            let db = Database::open(&config.database_path)?;
            info!("Database opened: {}", config.database_path);
            Stores::sqlite(&db)
        }
        StorageBackend::Csv => {
            std::fs::create_dir_all(&config.data_dir)?;
            info!("CSV tables under {}", config.data_dir.display());
            Stores::csv(&config.data_dir)
        }
        StorageBackend::Memory => {
            info!("🟡 In-memory storage: nothing will be saved");
            Stores::memory()
        }
    };

    let roster = Roster::from_csv(&config.roster_path)?;
    if roster.is_empty() {
        warn!("Roster is empty: games cannot start until players are added");
    } else {
        info!("Roster loaded: {} player(s)", roster.len());
    }

    let scorer = Scorer::open(Arc::new(roster), stores, config.history_csv.clone())?;

    let app = api::router(AppState::new(&config.team_name, scorer));
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("{} scorebook listening on http://{}", config.team_name, addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
