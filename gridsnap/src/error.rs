use std::{io, result::Result as StdResult};

use thiserror::Error;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A window or display call failed. Caught where it happens; never aborts a batch.
    #[error("provider error: {0}")]
    Provider(String),

    /// The request cannot be reconciled at all.
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{what} limit of {limit} reached")]
    LimitReached { what: &'static str, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn layout_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "layout",
            id: id.to_string(),
        }
    }
}
