// src/main.rs
//
// Report binary: loads the working set from the configured database and
// prints the curated homepage, rank collisions and safety warnings as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};

use homepage_curator::application::{curation_report, AppState};
use homepage_curator::config::CurationConfig;
use homepage_curator::db::{
    create_connection_pool, get_connection, initialize_database, verify_database_integrity,
};
use homepage_curator::logging::init_logging;
use homepage_curator::repositories::{SqliteStoryStore, StoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. CONFIGURATION
    let config = CurationConfig::from_env().context("invalid configuration")?;
    init_logging(&config.log_level)?;

    // 2. INFRASTRUCTURE
    let pool = Arc::new(
        create_connection_pool(&config.database_path, config.pool_size)
            .with_context(|| format!("cannot open {}", config.database_path.display()))?,
    );

    // Initialize schema (idempotent)
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn)?;
        verify_database_integrity(&conn)?;
    }

    // 3. STORE + COORDINATOR
    let store: Arc<dyn StoryStore> = Arc::new(SqliteStoryStore::new(pool));
    let state = AppState::new(store, config.homepage_limits);

    state.coordinator.load().await?;

    // 4. REPORT
    let report = curation_report(&state)
        .await
        .map_err(anyhow::Error::msg)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
