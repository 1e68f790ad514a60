use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;
pub mod transaction;
pub mod utils;

pub async fn init_database(config: &Config) -> Result<PgPool> {
    log::info!(
        "Connecting to database (max {} connections)",
        config.database_max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    log::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Migrations completed successfully");

    Ok(pool)
}
