//! Core data models used throughout snipvault.
//!
//! These types represent the snippets, themes, and derived search/tag
//! records that flow between the store, the ranking engine, and callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A captured text snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub content: String,
    /// Canonical tags. Tolerates `null` or a missing field on input.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_title: Option<String>,
    #[serde(default)]
    pub source_host: Option<String>,
    #[serde(default)]
    pub theme_id: Option<String>,
}

impl Snippet {
    /// Minimal snippet with no source or theme metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            tags,
            created_at: Utc::now(),
            source_url: None,
            source_title: None,
            source_host: None,
            theme_id: None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(tags.unwrap_or_default())
}

/// Input for creating a snippet. Tags are raw user text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSnippet {
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_title: Option<String>,
    #[serde(default)]
    pub source_host: Option<String>,
    #[serde(default)]
    pub theme_id: Option<String>,
}

/// Replacement content and tags for an existing snippet.
///
/// `theme_id`: `None` keeps the current theme, `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetPatch {
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub theme_id: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// A ranked search hit with a preview excerpt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Higher is more relevant. Recomputed per query.
    pub score: i64,
    pub excerpt: String,
}

/// One row of the tag cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub slug: String,
    pub count: usize,
}

/// A named grouping of snippets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTheme {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Changes to an existing theme. Absent fields keep their stored values;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}
