//! # snipvault
//!
//! A local-first store for short text snippets with canonical tags,
//! ranked search, and a tag cloud, exposed through the `snip` CLI and a
//! JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │   CLI    │──▶│  snippets /  │──▶│ SnippetStore │
//! │  (snip)  │   │ themes/search│   │ SQLite | mem │
//! └──────────┘   └──────────────┘   └──────────────┘
//!                       ▲
//! ┌──────────┐          │
//! │   HTTP   │──────────┘
//! │  (axum)  │
//! └──────────┘
//! ```
//!
//! Pure logic (tag normalization, scoring, excerpts, tag counts) lives in
//! the `snipvault-core` crate; this crate adds configuration, SQLite
//! persistence, and the two front ends.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | SQLite pool and store construction |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite [`SnippetStore`](snipvault_core::store::SnippetStore) |
//! | [`snippets`] | Snippet write path and retrieval |
//! | [`themes`] | Theme management |
//! | [`search`] | Search and tag cloud |
//! | [`server`] | HTTP API |

pub mod config;
pub mod db;
pub mod migrate;
pub mod search;
pub mod server;
pub mod snippets;
pub mod sqlite_store;
pub mod themes;

pub use snipvault_core::{error, models, store, tags};
