//! Domain errors raised by the write path and the stores.
//!
//! Services return `anyhow::Result`; these variants travel inside the
//! `anyhow::Error` and are recovered with `downcast_ref` by callers that
//! need to tell a bad request from a missing record (the HTTP layer).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnipError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A uniqueness constraint would be violated.
    #[error("{kind} already exists: {key}")]
    Conflict { kind: &'static str, key: String },
}

impl SnipError {
    pub fn validation(message: impl Into<String>) -> Self {
        SnipError::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        SnipError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conflict(kind: &'static str, key: impl Into<String>) -> Self {
        SnipError::Conflict {
            kind,
            key: key.into(),
        }
    }
}
