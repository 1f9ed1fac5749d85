//! Search and tag-cloud entry points.
//!
//! The ranking algorithm lives in `snipvault_core::search` and works on a
//! corpus snapshot. This wrapper resolves limits from config, loads the
//! corpus through a store, and formats CLI output.

use anyhow::Result;
use tracing::debug;

pub use snipvault_core::models::{SearchResult, TagCount};
pub use snipvault_core::search::AggregateBy;
use snipvault_core::error::SnipError;
use snipvault_core::store::SnippetStore;

use crate::config::Config;
use crate::db;

/// Resolve a caller-supplied limit against `[search]` config.
///
/// `None` means the configured default. Values outside
/// `1..=max_limit` are rejected.
pub fn resolve_limit(config: &Config, limit: Option<usize>) -> Result<usize> {
    match limit {
        None => Ok(config.search.default_limit),
        Some(0) => Err(SnipError::validation("invalid limit: must be >= 1").into()),
        Some(n) if n > config.search.max_limit => Err(SnipError::validation(format!(
            "invalid limit: must be <= {}",
            config.search.max_limit
        ))
        .into()),
        Some(n) => Ok(n),
    }
}

/// Core search function returning structured results.
///
/// Shared by `snip search` and `GET /search`.
pub async fn search_snippets<S: SnippetStore + ?Sized>(
    store: &S,
    config: &Config,
    query: &str,
    limit: Option<usize>,
) -> Result<Vec<SearchResult>> {
    let limit = resolve_limit(config, limit)?;
    let results = snipvault_core::search::search_store(store, query, limit).await?;
    debug!(query = %query.trim(), limit, hits = results.len(), "search complete");
    Ok(results)
}

/// Tag usage counts using the configured aggregation.
pub async fn tag_cloud<S: SnippetStore + ?Sized>(store: &S, config: &Config) -> Result<Vec<TagCount>> {
    snipvault_core::search::list_tags(store, config.tags.aggregate_by).await
}

/// CLI entry point for `snip search`.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = search_snippets(&store, config, query, limit).await;
    store.pool().close().await;
    let results = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, r) in results.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, r.score, r.id);
        if !r.tags.is_empty() {
            println!("    tags: {}", r.tags.join(", "));
        }
        println!("    created: {}", r.created_at.format("%Y-%m-%dT%H:%M:%SZ"));
        println!("    excerpt: \"{}\"", r.excerpt.replace('\n', " ").trim());
        println!();
    }
    Ok(())
}

/// CLI entry point for `snip tags`.
pub async fn run_tags(config: &Config, json: bool) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = tag_cloud(&store, config).await;
    store.pool().close().await;
    let tags = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    if tags.is_empty() {
        println!("No tags.");
        return Ok(());
    }

    println!("{:>6}  {:<32} {}", "COUNT", "TAG", "SLUG");
    for t in &tags {
        println!("{:>6}  {:<32} {}", t.count, t.tag, t.slug);
    }
    Ok(())
}
