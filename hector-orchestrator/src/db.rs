//! SQLite pool construction and migration.
//!
//! The whole store is a single two-column table: the entity kind is encoded
//! as a prefix on the id and the content column holds the JSON serialization
//! of the entity. The pool is capped at one connection so read-modify-write
//! updates to a ResultDefinition row serialize without busy-loop handling in
//! the store layer.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::time::Duration;

pub async fn create_pool(database_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("CREATE TABLE IF NOT EXISTS hector(id TEXT PRIMARY KEY, content TEXT)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
