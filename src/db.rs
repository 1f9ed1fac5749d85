//! SQLite database connection management.
//!
//! Provides a connection pool with WAL mode enabled so the HTTP server can
//! serve searches while a CLI write is in progress. The database file and
//! its parent directories are created on first connect.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::Config;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Create a connection pool to the configured SQLite database.
///
/// Foreign keys are enforced so deleting a theme detaches its snippets.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Connect and ensure the schema exists, returning a ready store.
pub async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = connect(config).await?;
    migrate::apply_schema(&pool).await?;
    Ok(SqliteStore::new(pool))
}
