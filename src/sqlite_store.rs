//! SQLite-backed [`SnippetStore`] implementation.
//!
//! Timestamps are stored as Unix milliseconds; tags as a JSON array in
//! `snippets.tags_json`. Unparsable tag data reads back as no tags.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use snipvault_core::error::SnipError;
use snipvault_core::models::{Snippet, Theme};
use snipvault_core::store::{SnippetStore, SnippetUpdate};

const SNIPPET_COLUMNS: &str = "id, content, tags_json, created_at, source_url, source_title, source_host, theme_id";

/// SQLite implementation of the [`SnippetStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn parse_tags(raw: Option<String>) -> Vec<String> {
    raw.and_then(|json| serde_json::from_str::<Option<Vec<String>>>(&json).ok())
        .flatten()
        .unwrap_or_default()
}

/// Turn a UNIQUE constraint failure into a typed conflict.
fn map_unique(err: sqlx::Error, kind: &'static str, key: &str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            SnipError::conflict(kind, key).into()
        }
        _ => anyhow::Error::new(err).context(format!("failed to write {} {}", kind, key)),
    }
}

fn snippet_from_row(row: &SqliteRow) -> Snippet {
    Snippet {
        id: row.get("id"),
        content: row.get("content"),
        tags: parse_tags(row.get("tags_json")),
        created_at: from_millis(row.get("created_at")),
        source_url: row.get("source_url"),
        source_title: row.get("source_title"),
        source_host: row.get("source_host"),
        theme_id: row.get("theme_id"),
    }
}

fn theme_from_row(row: &SqliteRow) -> Theme {
    Theme {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: from_millis(row.get("created_at")),
        updated_at: from_millis(row.get("updated_at")),
    }
}

#[async_trait]
impl SnippetStore for SqliteStore {
    async fn list_snippets(&self) -> Result<Vec<Snippet>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM snippets ORDER BY seq ASC",
            SNIPPET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to load snippets")?;
        Ok(rows.iter().map(snippet_from_row).collect())
    }

    async fn get_snippet(&self, id: &str) -> Result<Option<Snippet>> {
        let row = sqlx::query(&format!("SELECT {} FROM snippets WHERE id = ?", SNIPPET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(snippet_from_row))
    }

    async fn insert_snippet(&self, snippet: &Snippet) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snippets (id, content, tags_json, created_at,
                                  source_url, source_title, source_host, theme_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snippet.id)
        .bind(&snippet.content)
        .bind(serde_json::to_string(&snippet.tags)?)
        .bind(snippet.created_at.timestamp_millis())
        .bind(&snippet.source_url)
        .bind(&snippet.source_title)
        .bind(&snippet.source_host)
        .bind(&snippet.theme_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "snippet", &snippet.id))?;
        Ok(())
    }

    async fn update_snippet(&self, id: &str, update: &SnippetUpdate) -> Result<Option<Snippet>> {
        let tags_json = serde_json::to_string(&update.tags)?;
        let result = match &update.theme_id {
            Some(theme_id) => {
                sqlx::query(
                    "UPDATE snippets SET content = ?, tags_json = ?, theme_id = ? WHERE id = ?",
                )
                .bind(&update.content)
                .bind(&tags_json)
                .bind(theme_id)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("UPDATE snippets SET content = ?, tags_json = ? WHERE id = ?")
                    .bind(&update.content)
                    .bind(&tags_json)
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_snippet(id).await
    }

    async fn delete_snippet(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_themes(&self) -> Result<Vec<Theme>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM themes ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(theme_from_row).collect())
    }

    async fn get_theme(&self, id: &str) -> Result<Option<Theme>> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM themes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(theme_from_row))
    }

    async fn insert_theme(&self, theme: &Theme) -> Result<()> {
        sqlx::query(
            "INSERT INTO themes (id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&theme.id)
        .bind(&theme.name)
        .bind(&theme.description)
        .bind(theme.created_at.timestamp_millis())
        .bind(theme.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "theme", &theme.name))?;
        Ok(())
    }

    async fn update_theme(&self, theme: &Theme) -> Result<bool> {
        let result =
            sqlx::query("UPDATE themes SET name = ?, description = ?, updated_at = ? WHERE id = ?")
                .bind(&theme.name)
                .bind(&theme.description)
                .bind(theme.updated_at.timestamp_millis())
                .bind(&theme.id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_unique(e, "theme", &theme.name))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_theme(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE snippets SET theme_id = NULL WHERE theme_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM themes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_snippet_theme(&self, snippet_id: &str, theme_id: Option<&str>) -> Result<bool> {
        let result = sqlx::query("UPDATE snippets SET theme_id = ? WHERE id = ?")
            .bind(theme_id)
            .bind(snippet_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
