//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/snipvault.sqlite"
//!
//! [search]
//! default_limit = 20
//! max_limit = 50
//!
//! [tags]
//! aggregate_by = "raw"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```
//!
//! Only `[db]` is required; every other section has defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use snipvault_core::search::AggregateBy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub tags: TagsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_limit() -> usize {
    snipvault_core::search::DEFAULT_LIMIT
}
fn default_max_limit() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TagsConfig {
    /// `raw` counts stored tag strings; `slug` merges spellings.
    #[serde(default)]
    pub aggregate_by: AggregateBy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// Validate cross-field constraints after parsing.
    pub fn validate(&self) -> Result<()> {
        if self.search.default_limit == 0 {
            anyhow::bail!("search.default_limit must be >= 1");
        }
        if self.search.max_limit < self.search.default_limit {
            anyhow::bail!(
                "search.max_limit ({}) must be >= search.default_limit ({})",
                self.search.max_limit,
                self.search.default_limit
            );
        }
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }
        Ok(())
    }
}

/// Parse configuration from a TOML string and validate it.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}
