//! In-memory [`SnippetStore`] implementation for tests and embedding.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Snippets keep insertion order
//! so corpus snapshots are stable across calls.

use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::SnipError;
use crate::models::{Snippet, Theme};

use super::{SnippetStore, SnippetUpdate};

/// In-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    snippets: RwLock<Vec<Snippet>>,
    themes: RwLock<Vec<Theme>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with an existing corpus.
    pub fn with_snippets(snippets: Vec<Snippet>) -> Self {
        Self {
            snippets: RwLock::new(snippets),
            themes: RwLock::new(Vec::new()),
        }
    }
}

fn poisoned<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl SnippetStore for InMemoryStore {
    async fn list_snippets(&self) -> Result<Vec<Snippet>> {
        Ok(self.snippets.read().map_err(poisoned)?.clone())
    }

    async fn get_snippet(&self, id: &str) -> Result<Option<Snippet>> {
        let snippets = self.snippets.read().map_err(poisoned)?;
        Ok(snippets.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_snippet(&self, snippet: &Snippet) -> Result<()> {
        let mut snippets = self.snippets.write().map_err(poisoned)?;
        if snippets.iter().any(|s| s.id == snippet.id) {
            return Err(SnipError::conflict("snippet", &snippet.id).into());
        }
        snippets.push(snippet.clone());
        Ok(())
    }

    async fn update_snippet(&self, id: &str, update: &SnippetUpdate) -> Result<Option<Snippet>> {
        let mut snippets = self.snippets.write().map_err(poisoned)?;
        let Some(stored) = snippets.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        stored.content = update.content.clone();
        stored.tags = update.tags.clone();
        if let Some(theme_id) = &update.theme_id {
            stored.theme_id = theme_id.clone();
        }
        Ok(Some(stored.clone()))
    }

    async fn delete_snippet(&self, id: &str) -> Result<bool> {
        let mut snippets = self.snippets.write().map_err(poisoned)?;
        let before = snippets.len();
        snippets.retain(|s| s.id != id);
        Ok(snippets.len() != before)
    }

    async fn list_themes(&self) -> Result<Vec<Theme>> {
        let mut themes = self.themes.read().map_err(poisoned)?.clone();
        themes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(themes)
    }

    async fn get_theme(&self, id: &str) -> Result<Option<Theme>> {
        let themes = self.themes.read().map_err(poisoned)?;
        Ok(themes.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_theme(&self, theme: &Theme) -> Result<()> {
        let mut themes = self.themes.write().map_err(poisoned)?;
        if themes.iter().any(|t| t.name == theme.name) {
            return Err(SnipError::conflict("theme", &theme.name).into());
        }
        themes.push(theme.clone());
        Ok(())
    }

    async fn update_theme(&self, theme: &Theme) -> Result<bool> {
        let mut themes = self.themes.write().map_err(poisoned)?;
        if themes.iter().any(|t| t.name == theme.name && t.id != theme.id) {
            return Err(SnipError::conflict("theme", &theme.name).into());
        }
        match themes.iter_mut().find(|t| t.id == theme.id) {
            Some(stored) => {
                stored.name = theme.name.clone();
                stored.description = theme.description.clone();
                stored.updated_at = theme.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_theme(&self, id: &str) -> Result<bool> {
        let removed = {
            let mut themes = self.themes.write().map_err(poisoned)?;
            let before = themes.len();
            themes.retain(|t| t.id != id);
            themes.len() != before
        };
        if removed {
            let mut snippets = self.snippets.write().map_err(poisoned)?;
            for s in snippets.iter_mut().filter(|s| s.theme_id.as_deref() == Some(id)) {
                s.theme_id = None;
            }
        }
        Ok(removed)
    }

    async fn set_snippet_theme(&self, snippet_id: &str, theme_id: Option<&str>) -> Result<bool> {
        let mut snippets = self.snippets.write().map_err(poisoned)?;
        match snippets.iter_mut().find(|s| s.id == snippet_id) {
            Some(s) => {
                s.theme_id = theme_id.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
