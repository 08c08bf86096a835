//! Error types for rgdir-core

use rgdir_api::ApiError;
use thiserror::Error;

/// Result type alias for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Main error type for directory operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Network or backend failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Client-side form validation failed; nothing was sent
    #[error("{0}")]
    Validation(String),

    /// Editor operation not allowed in its current state
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    /// A cache entry held a different kind of data than the key implies
    #[error("Cache entry {key} does not hold {expected}")]
    CacheMismatch { key: String, expected: &'static str },

    /// The requested item is not in the loaded data
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Publication editor state errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// No publication is open for editing
    #[error("no publication is being edited")]
    NotEditing,

    /// A save is already running
    #[error("a save is already in progress")]
    SaveInProgress,

    /// `finish_save` without a matching `begin_save`
    #[error("no save in progress")]
    NotSaving,
}

impl DirectoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        DirectoryError::Validation(message.into())
    }

    /// Whether the failure happened before any request was sent
    pub fn is_client_side(&self) -> bool {
        !matches!(self, DirectoryError::Api(_))
    }
}
