use crate::core::guard::InvalidPath;
use crate::core::validate::ValidationErrors;
use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoursekitError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("The given data was invalid: {0}")]
    ValidationError(ValidationErrors),
    #[error("Path error: {0}")]
    PathError(#[from] InvalidPath),
    #[error("{0} already exists.")]
    AlreadyExists(&'static str),
    #[error("{0} not found.")]
    NotFound(&'static str),
    #[error("Unauthenticated.")]
    Unauthorized,
    #[error("Background task failed: {0}")]
    TaskError(String),
}

impl CoursekitError {
    /// Folds an unsafe path segment into the resource's `NotFound`, so a
    /// traversal attempt reads exactly like a missing resource.
    pub fn conceal_path(self, resource: &'static str) -> Self {
        match self {
            CoursekitError::PathError(err) => {
                tracing::warn!(segment = %err.segment, reason = err.reason, "rejected path segment");
                CoursekitError::NotFound(resource)
            }
            other => other,
        }
    }
}
