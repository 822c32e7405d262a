//! # SQLite storage
//!
//! Low-level SQLite interactions live in plain functions that accept a `&mut SqliteConnection`, grouped by table.
//! Callers take a connection from the pool, or open a transaction when several calls must succeed or fail together,
//! and pass it through unchanged. [`SqliteDatabase`] wires these functions up to the storage traits.
pub mod db;
mod errors;

pub mod orders;
pub mod packages;
pub mod schedules;
pub mod users;

use std::{env, str::FromStr};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/booking.db";

pub fn db_url() -> String {
    let result = env::var("DBK_DATABASE_URL").unwrap_or_else(|_| {
        info!("DBK_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Opens a connection pool. The database file is created if it does not exist yet. Foreign keys are enforced.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
