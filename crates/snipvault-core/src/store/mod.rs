//! Storage abstraction for snipvault.
//!
//! The [`SnippetStore`] trait is the corpus supplier for search and tag
//! aggregation, and the persistence target of the write path. Backends
//! (SQLite in the application crate, [`memory::InMemoryStore`] here) store
//! exactly what they are given: tag canonicalization happens before a
//! snippet reaches the store.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Snippet, Theme};

/// Replacement values for [`SnippetStore::update_snippet`].
///
/// `theme_id`: `None` keeps the stored theme, `Some(None)` clears it.
#[derive(Debug, Clone)]
pub struct SnippetUpdate {
    pub content: String,
    pub tags: Vec<String>,
    pub theme_id: Option<Option<String>>,
}

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_snippets`](SnippetStore::list_snippets) | Full corpus snapshot, insertion order |
/// | [`get_snippet`](SnippetStore::get_snippet) | One snippet by id |
/// | [`insert_snippet`](SnippetStore::insert_snippet) | Persist a new snippet |
/// | [`update_snippet`](SnippetStore::update_snippet) | Replace content/tags/theme |
/// | [`delete_snippet`](SnippetStore::delete_snippet) | Remove a snippet |
/// | [`list_themes`](SnippetStore::list_themes) | All themes by name |
/// | [`insert_theme`](SnippetStore::insert_theme) | Persist a new theme |
/// | [`update_theme`](SnippetStore::update_theme) | Rename or redescribe a theme |
/// | [`delete_theme`](SnippetStore::delete_theme) | Remove a theme, detaching its snippets |
/// | [`set_snippet_theme`](SnippetStore::set_snippet_theme) | Attach or detach a theme |
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Every stored snippet, oldest first.
    async fn list_snippets(&self) -> Result<Vec<Snippet>>;

    async fn get_snippet(&self, id: &str) -> Result<Option<Snippet>>;

    async fn insert_snippet(&self, snippet: &Snippet) -> Result<()>;

    /// Returns the updated snippet, or `None` if `id` is unknown.
    async fn update_snippet(&self, id: &str, update: &SnippetUpdate) -> Result<Option<Snippet>>;

    /// Returns `false` if `id` is unknown.
    async fn delete_snippet(&self, id: &str) -> Result<bool>;

    /// Every theme, sorted by name.
    async fn list_themes(&self) -> Result<Vec<Theme>>;

    async fn get_theme(&self, id: &str) -> Result<Option<Theme>>;

    /// Fails with [`SnipError::Conflict`](crate::error::SnipError) when the
    /// name is taken.
    async fn insert_theme(&self, theme: &Theme) -> Result<()>;

    /// Overwrite `name`, `description` and `updated_at` of the theme with
    /// `theme.id`. Returns `false` if the id is unknown; fails with
    /// [`SnipError::Conflict`](crate::error::SnipError) when another theme
    /// already has the name.
    async fn update_theme(&self, theme: &Theme) -> Result<bool>;

    /// Returns `false` if `id` is unknown. Snippets in the theme keep
    /// existing with no theme.
    async fn delete_theme(&self, id: &str) -> Result<bool>;

    /// Returns `false` if the snippet is unknown.
    async fn set_snippet_theme(&self, snippet_id: &str, theme_id: Option<&str>) -> Result<bool>;
}
