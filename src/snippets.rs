//! Snippet write path and retrieval.
//!
//! Every snippet that reaches a store passes through [`create_snippet`] or
//! [`update_snippet`], which validate content and canonicalize tags with
//! [`normalize_tags`]. Used by both the `snip` CLI and the HTTP server.

use anyhow::Result;
use chrono::{SubsecRound, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use snipvault_core::error::SnipError;
use snipvault_core::models::{NewSnippet, Snippet, SnippetPatch};
use snipvault_core::store::{SnippetStore, SnippetUpdate};
use snipvault_core::tags::normalize_tags;

use crate::config::Config;
use crate::db;

fn require_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(SnipError::validation("content must not be empty").into());
    }
    Ok(())
}

async fn require_theme<S: SnippetStore + ?Sized>(store: &S, theme_id: Option<&str>) -> Result<()> {
    if let Some(id) = theme_id {
        if store.get_theme(id).await?.is_none() {
            return Err(SnipError::not_found("theme", id).into());
        }
    }
    Ok(())
}

/// Extract the host part of an `http(s)://host/...` URL.
pub fn host_from_url(url: &str) -> Option<String> {
    let rest = url.trim().split_once("://").map(|(_, r)| r)?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Validate, canonicalize, and persist a new snippet.
pub async fn create_snippet<S: SnippetStore + ?Sized>(store: &S, input: NewSnippet) -> Result<Snippet> {
    require_content(&input.content)?;
    require_theme(store, input.theme_id.as_deref()).await?;

    let source_host = input
        .source_host
        .or_else(|| input.source_url.as_deref().and_then(host_from_url));

    let snippet = Snippet {
        id: Uuid::new_v4().to_string(),
        content: input.content,
        tags: normalize_tags(&input.tags),
        created_at: Utc::now().trunc_subsecs(3),
        source_url: input.source_url,
        source_title: input.source_title,
        source_host,
        theme_id: input.theme_id,
    };

    store.insert_snippet(&snippet).await?;
    info!(id = %snippet.id, tags = snippet.tags.len(), "snippet created");
    Ok(snippet)
}

/// Replace a snippet's content and tags.
pub async fn update_snippet<S: SnippetStore + ?Sized>(
    store: &S,
    id: &str,
    patch: SnippetPatch,
) -> Result<Snippet> {
    require_content(&patch.content)?;
    if let Some(theme_id) = &patch.theme_id {
        require_theme(store, theme_id.as_deref()).await?;
    }

    let update = SnippetUpdate {
        content: patch.content,
        tags: normalize_tags(&patch.tags),
        theme_id: patch.theme_id,
    };

    match store.update_snippet(id, &update).await? {
        Some(snippet) => {
            info!(id = %snippet.id, "snippet updated");
            Ok(snippet)
        }
        None => Err(SnipError::not_found("snippet", id).into()),
    }
}

pub async fn get_snippet<S: SnippetStore + ?Sized>(store: &S, id: &str) -> Result<Snippet> {
    match store.get_snippet(id).await? {
        Some(s) => Ok(s),
        None => Err(SnipError::not_found("snippet", id).into()),
    }
}

/// All snippets, newest first.
pub async fn list_snippets<S: SnippetStore + ?Sized>(store: &S) -> Result<Vec<Snippet>> {
    let mut snippets = store.list_snippets().await?;
    snippets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    debug!(count = snippets.len(), "listed snippets");
    Ok(snippets)
}

pub async fn delete_snippet<S: SnippetStore + ?Sized>(store: &S, id: &str) -> Result<()> {
    if !store.delete_snippet(id).await? {
        return Err(SnipError::not_found("snippet", id).into());
    }
    info!(id = %id, "snippet deleted");
    Ok(())
}

// ============ CLI entry points ============

fn print_snippet_line(s: &Snippet) {
    let first_line = s.content.lines().next().unwrap_or("").trim();
    let preview: String = first_line.chars().take(72).collect();
    let tags = if s.tags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", s.tags.join(", "))
    };
    println!("{}  {}{}", s.id, preview, tags);
}

pub async fn run_add(config: &Config, input: NewSnippet) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = create_snippet(&store, input).await;
    store.pool().close().await;
    let snippet = result?;
    println!("Created snippet {}", snippet.id);
    if !snippet.tags.is_empty() {
        println!("tags: {}", snippet.tags.join(", "));
    }
    Ok(())
}

pub async fn run_list(config: &Config) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = list_snippets(&store).await;
    store.pool().close().await;
    let snippets = result?;

    if snippets.is_empty() {
        println!("No snippets.");
        return Ok(());
    }
    for s in &snippets {
        print_snippet_line(s);
    }
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = get_snippet(&store, id).await;
    store.pool().close().await;
    let s = result?;

    println!("--- Snippet ---");
    println!("id:           {}", s.id);
    println!("created_at:   {}", s.created_at.format("%Y-%m-%dT%H:%M:%SZ"));
    println!("tags:         {}", s.tags.join(", "));
    if let Some(ref url) = s.source_url {
        println!("source_url:   {}", url);
    }
    if let Some(ref title) = s.source_title {
        println!("source_title: {}", title);
    }
    if let Some(ref host) = s.source_host {
        println!("source_host:  {}", host);
    }
    if let Some(ref theme) = s.theme_id {
        println!("theme_id:     {}", theme);
    }
    println!();
    println!("--- Content ---");
    println!("{}", s.content);
    Ok(())
}

/// `snip edit`: unspecified fields keep their stored values.
pub async fn run_edit(
    config: &Config,
    id: &str,
    content: Option<String>,
    tags: Vec<String>,
    clear_tags: bool,
) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = async {
        let current = get_snippet(&store, id).await?;
        let tags = if clear_tags {
            Vec::new()
        } else if tags.is_empty() {
            current.tags
        } else {
            tags
        };
        let patch = SnippetPatch {
            content: content.unwrap_or(current.content),
            tags,
            theme_id: None,
        };
        update_snippet(&store, id, patch).await
    }
    .await;
    store.pool().close().await;
    let s = result?;
    println!("Updated snippet {}", s.id);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = delete_snippet(&store, id).await;
    store.pool().close().await;
    result?;
    println!("Deleted snippet {}", id);
    Ok(())
}
