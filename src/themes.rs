//! Themes: named groups a snippet can belong to.

use anyhow::Result;
use chrono::{SubsecRound, Utc};
use tracing::info;
use uuid::Uuid;

use snipvault_core::error::SnipError;
use snipvault_core::models::{NewTheme, Theme, ThemePatch};
use snipvault_core::store::SnippetStore;

use crate::config::Config;
use crate::db;

const NAME_MAX_CHARS: usize = 80;
const DESCRIPTION_MAX_CHARS: usize = 2000;

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SnipError::validation("theme name must not be empty").into());
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(SnipError::validation(format!(
            "theme name must be at most {} characters",
            NAME_MAX_CHARS
        ))
        .into());
    }
    Ok(name.to_string())
}

/// Blank descriptions are stored as none.
fn clean_description(description: Option<String>) -> Result<Option<String>> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if let Some(d) = &description {
        if d.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(SnipError::validation(format!(
                "theme description must be at most {} characters",
                DESCRIPTION_MAX_CHARS
            ))
            .into());
        }
    }
    Ok(description)
}

pub async fn create_theme<S: SnippetStore + ?Sized>(store: &S, input: NewTheme) -> Result<Theme> {
    let name = clean_name(&input.name)?;
    let description = clean_description(input.description)?;

    // Millisecond precision, matching what the store persists.
    let now = Utc::now().trunc_subsecs(3);
    let theme = Theme {
        id: Uuid::new_v4().to_string(),
        name,
        description,
        created_at: now,
        updated_at: now,
    };
    store.insert_theme(&theme).await?;
    info!(id = %theme.id, name = %theme.name, "theme created");
    Ok(theme)
}

pub async fn get_theme<S: SnippetStore + ?Sized>(store: &S, id: &str) -> Result<Theme> {
    match store.get_theme(id).await? {
        Some(t) => Ok(t),
        None => Err(SnipError::not_found("theme", id).into()),
    }
}

/// Rename and/or redescribe a theme, bumping `updated_at`.
pub async fn update_theme<S: SnippetStore + ?Sized>(
    store: &S,
    id: &str,
    patch: ThemePatch,
) -> Result<Theme> {
    let mut theme = get_theme(store, id).await?;
    if let Some(name) = &patch.name {
        theme.name = clean_name(name)?;
    }
    if let Some(description) = patch.description {
        theme.description = clean_description(description)?;
    }
    theme.updated_at = Utc::now().trunc_subsecs(3).max(theme.created_at);

    if !store.update_theme(&theme).await? {
        return Err(SnipError::not_found("theme", id).into());
    }
    info!(id = %theme.id, name = %theme.name, "theme updated");
    Ok(theme)
}

pub async fn list_themes<S: SnippetStore + ?Sized>(store: &S) -> Result<Vec<Theme>> {
    store.list_themes().await
}

pub async fn delete_theme<S: SnippetStore + ?Sized>(store: &S, id: &str) -> Result<()> {
    if !store.delete_theme(id).await? {
        return Err(SnipError::not_found("theme", id).into());
    }
    info!(id = %id, "theme deleted");
    Ok(())
}

/// Attach a snippet to a theme, or detach it with `None`.
pub async fn assign_theme<S: SnippetStore + ?Sized>(
    store: &S,
    snippet_id: &str,
    theme_id: Option<&str>,
) -> Result<()> {
    if let Some(id) = theme_id {
        get_theme(store, id).await?;
    }
    if !store.set_snippet_theme(snippet_id, theme_id).await? {
        return Err(SnipError::not_found("snippet", snippet_id).into());
    }
    Ok(())
}

// ============ CLI entry points ============

pub async fn run_list(config: &Config) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = list_themes(&store).await;
    store.pool().close().await;
    let themes = result?;

    if themes.is_empty() {
        println!("No themes.");
        return Ok(());
    }
    for t in &themes {
        match &t.description {
            Some(d) => println!("{}  {}: {}", t.id, t.name, d),
            None => println!("{}  {}", t.id, t.name),
        }
    }
    Ok(())
}

pub async fn run_add(config: &Config, name: String, description: Option<String>) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = create_theme(&store, NewTheme { name, description }).await;
    store.pool().close().await;
    let theme = result?;
    println!("Created theme {} ({})", theme.name, theme.id);
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = get_theme(&store, id).await;
    store.pool().close().await;
    let t = result?;

    println!("id:          {}", t.id);
    println!("name:        {}", t.name);
    if let Some(ref d) = t.description {
        println!("description: {}", d);
    }
    println!("created_at:  {}", t.created_at.format("%Y-%m-%dT%H:%M:%SZ"));
    println!("updated_at:  {}", t.updated_at.format("%Y-%m-%dT%H:%M:%SZ"));
    Ok(())
}

pub async fn run_edit(config: &Config, id: &str, patch: ThemePatch) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = update_theme(&store, id, patch).await;
    store.pool().close().await;
    let theme = result?;
    println!("Updated theme {} ({})", theme.name, theme.id);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = delete_theme(&store, id).await;
    store.pool().close().await;
    result?;
    println!("Deleted theme {}", id);
    Ok(())
}

pub async fn run_assign(config: &Config, snippet_id: &str, theme_id: Option<&str>) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = assign_theme(&store, snippet_id, theme_id).await;
    store.pool().close().await;
    result?;
    match theme_id {
        Some(t) => println!("Snippet {} assigned to theme {}", snippet_id, t),
        None => println!("Snippet {} removed from its theme", snippet_id),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipvault_core::models::Snippet;
    use snipvault_core::store::memory::InMemoryStore;

    fn named(name: &str) -> NewTheme {
        NewTheme {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_validates_name() {
        let store = InMemoryStore::new();
        assert!(create_theme(&store, named("  ")).await.is_err());
        assert!(create_theme(&store, named(&"x".repeat(81))).await.is_err());
        let t = create_theme(&store, named("  Reading list ")).await.unwrap();
        assert_eq!(t.name, "Reading list");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let store = InMemoryStore::new();
        create_theme(&store, named("Ideas")).await.unwrap();
        let err = create_theme(&store, named("Ideas")).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_blank_description_dropped() {
        let store = InMemoryStore::new();
        let t = create_theme(
            &store,
            NewTheme {
                name: "A".into(),
                description: Some("   ".into()),
            },
        )
        .await
        .unwrap();
        assert!(t.description.is_none());
    }

    #[tokio::test]
    async fn test_update_renames_and_bumps_updated_at() {
        let store = InMemoryStore::new();
        let t = create_theme(
            &store,
            NewTheme {
                name: "Ideas".into(),
                description: Some("raw".into()),
            },
        )
        .await
        .unwrap();

        let renamed = update_theme(
            &store,
            &t.id,
            ThemePatch {
                name: Some("  Big ideas ".into()),
                description: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Big ideas");
        assert_eq!(renamed.description.as_deref(), Some("raw"));
        assert_eq!(renamed.created_at, t.created_at);
        assert!(renamed.updated_at >= t.updated_at);
        assert_eq!(get_theme(&store, &t.id).await.unwrap(), renamed);

        let cleared = update_theme(
            &store,
            &t.id,
            ThemePatch {
                name: None,
                description: Some(None),
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.name, "Big ideas");
        assert!(cleared.description.is_none());
    }

    #[tokio::test]
    async fn test_update_validates_and_rejects_taken_name() {
        let store = InMemoryStore::new();
        let a = create_theme(&store, named("A")).await.unwrap();
        create_theme(&store, named("B")).await.unwrap();

        let rename = |name: &str| ThemePatch {
            name: Some(name.to_string()),
            description: None,
        };
        let err = update_theme(&store, &a.id, rename(" ")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<SnipError>(), Some(SnipError::Validation(_))));

        let long = ThemePatch {
            name: None,
            description: Some(Some("d".repeat(2001))),
        };
        assert!(update_theme(&store, &a.id, long).await.is_err());

        let err = update_theme(&store, &a.id, rename("B")).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SnipError>(),
            Some(&SnipError::conflict("theme", "B"))
        );

        let err = update_theme(&store, "missing", rename("C")).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SnipError>(),
            Some(&SnipError::not_found("theme", "missing"))
        );
    }

    #[tokio::test]
    async fn test_assign_and_delete() {
        let store = InMemoryStore::with_snippets(vec![Snippet::new("s1", "x", vec![])]);
        let t = create_theme(&store, named("Ideas")).await.unwrap();

        assign_theme(&store, "s1", Some(&t.id)).await.unwrap();
        assert!(assign_theme(&store, "s1", Some("missing")).await.is_err());
        assert!(assign_theme(&store, "missing", Some(&t.id)).await.is_err());

        delete_theme(&store, &t.id).await.unwrap();
        assert!(store.get_snippet("s1").await.unwrap().unwrap().theme_id.is_none());
        assert!(delete_theme(&store, &t.id).await.is_err());
    }
}
