//! # snipvault CLI (`snip`)
//!
//! Capture text snippets with tags, search them, and serve them over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! snip --config ./config/snip.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `snip init` | Create the SQLite database and schema |
//! | `snip add "<text>"` | Store a snippet (tags are canonicalized) |
//! | `snip list` | List snippets, newest first |
//! | `snip get <id>` | Print one snippet |
//! | `snip edit <id>` | Replace content and/or tags |
//! | `snip delete <id>` | Delete a snippet |
//! | `snip search "<query>"` | Ranked search with excerpts |
//! | `snip tags` | Tag usage counts |
//! | `snip theme ...` | Manage themes (`list`, `add`, `get`, `edit`, `delete`, `assign`) |
//! | `snip serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! snip add "ownership moves on assignment" --tag Rust --tag "#borrow checker"
//! snip search "ownership" --limit 5
//! snip tags --json
//! ```
//!
//! Log verbosity is controlled with `RUST_LOG` (default `warn`, or `info`
//! for `serve`). Logs go to stderr so stdout stays parseable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use snipvault::models::{NewSnippet, ThemePatch};
use snipvault::{config, migrate, search, server, snippets, themes};

/// snipvault: tagged snippet capture and search.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/snip.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "snip",
    about = "snipvault: capture, tag, and search text snippets",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/snip.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent. Other commands also create the schema on first use.
    Init,

    /// Store a new snippet.
    Add {
        /// Snippet text.
        content: String,

        /// Tag to attach; repeatable. Tags are normalized (`#Rust Lang` -> `rust-lang`).
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// URL the snippet was captured from.
        #[arg(long)]
        source_url: Option<String>,

        /// Title of the source page.
        #[arg(long)]
        source_title: Option<String>,

        /// Theme id to file the snippet under.
        #[arg(long)]
        theme: Option<String>,
    },

    /// List snippets, newest first.
    List,

    /// Print a snippet by id.
    Get {
        id: String,
    },

    /// Edit a snippet. Omitted fields keep their stored values.
    Edit {
        id: String,

        /// New content.
        #[arg(long)]
        content: Option<String>,

        /// Replacement tag set; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Remove all tags.
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },

    /// Delete a snippet by id.
    Delete {
        id: String,
    },

    /// Search snippets by content and tags.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results (defaults to `[search].default_limit`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show tag usage counts.
    Tags {
        /// Print counts as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage themes.
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum ThemeAction {
    /// List themes by name.
    List,
    /// Create a theme.
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Print a theme by id.
    Get {
        id: String,
    },
    /// Rename a theme or change its description.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Remove the description.
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
    },
    /// Delete a theme; its snippets are kept and detached.
    Delete {
        id: String,
    },
    /// Assign a snippet to a theme, or detach it when `--theme` is omitted.
    Assign {
        snippet_id: String,
        #[arg(long)]
        theme: Option<String>,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(if matches!(cli.command, Commands::Serve) {
        "info"
    } else {
        "warn"
    });

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Add {
            content,
            tags,
            source_url,
            source_title,
            theme,
        } => {
            let input = NewSnippet {
                content,
                tags,
                source_url,
                source_title,
                theme_id: theme,
                ..Default::default()
            };
            snippets::run_add(&cfg, input).await?;
        }
        Commands::List => {
            snippets::run_list(&cfg).await?;
        }
        Commands::Get { id } => {
            snippets::run_get(&cfg, &id).await?;
        }
        Commands::Edit {
            id,
            content,
            tags,
            clear_tags,
        } => {
            snippets::run_edit(&cfg, &id, content, tags, clear_tags).await?;
        }
        Commands::Delete { id } => {
            snippets::run_delete(&cfg, &id).await?;
        }
        Commands::Search { query, limit, json } => {
            search::run_search(&cfg, &query, limit, json).await?;
        }
        Commands::Tags { json } => {
            search::run_tags(&cfg, json).await?;
        }
        Commands::Theme { action } => match action {
            ThemeAction::List => themes::run_list(&cfg).await?,
            ThemeAction::Add { name, description } => {
                themes::run_add(&cfg, name, description).await?
            }
            ThemeAction::Get { id } => themes::run_get(&cfg, &id).await?,
            ThemeAction::Edit {
                id,
                name,
                description,
                clear_description,
            } => {
                let patch = ThemePatch {
                    name,
                    description: if clear_description {
                        Some(None)
                    } else {
                        description.map(Some)
                    },
                };
                themes::run_edit(&cfg, &id, patch).await?
            }
            ThemeAction::Delete { id } => themes::run_delete(&cfg, &id).await?,
            ThemeAction::Assign { snippet_id, theme } => {
                themes::run_assign(&cfg, &snippet_id, theme.as_deref()).await?
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
