//! # snipvault core
//!
//! Pure logic shared by every snipvault frontend: snippet models, the tag
//! canonicalizer, the search & ranking engine, tag aggregation, and the
//! store abstraction the engine reads its corpus through.
//!
//! This crate performs no filesystem, database, or network I/O. Callers
//! fetch a corpus snapshot (directly or via a [`store::SnippetStore`]) and
//! hand it to the pure functions in [`search`].

pub mod error;
pub mod models;
pub mod search;
pub mod store;
pub mod tags;
