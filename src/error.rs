//! Crate-wide error type.
//!
//! Every fallible operation in the walker, the query service seam, the
//! config loader and the CLI returns [`Result`], so callers can use `?`
//! across module boundaries.

use thiserror::Error;

/// Errors raised by the graph walker and its collaborators.
#[derive(Debug, Error)]
pub enum WalkerError {
    /// The graph query service failed to answer (network, backend, bad query).
    #[error("graph query failed: {0}")]
    Fetch(String),

    /// A domain node requested by id does not exist.
    #[error("graph node {0} not found")]
    NotFound(i32),

    /// A visual node id is not present in the materialized graph.
    #[error("visual node {0} is not materialized")]
    UnknownNode(String),

    /// A command was issued against a visual node of the wrong kind.
    #[error("visual node {id} is not {expected}")]
    UnexpectedKind { id: String, expected: &'static str },

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

impl WalkerError {
    /// Shorthand for a [`WalkerError::Fetch`] from anything displayable.
    pub fn fetch(message: impl std::fmt::Display) -> Self {
        Self::Fetch(message.to_string())
    }

    /// Whether the error came from the query service rather than from the
    /// walker itself.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, WalkerError>;
