//! Error types for storage and orchestration operations

use thiserror::Error;

/// Storage layer error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Domain error: {0}")]
    Domain(#[from] triage_core::Error),

    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Create a not found error for a specific entity type and id
    pub fn not_found<S: Into<String>, I: ToString>(entity: S, id: I) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Check if this error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this error wraps a rejected lifecycle transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Error::Domain(inner) if inner.is_invalid_transition())
    }
}

/// Convenience result type for storage operations
pub type Result<T> = std::result::Result<T, Error>;
