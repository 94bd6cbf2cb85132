//! Core error types for studyflow-core.
//!
//! Most runtime data problems (unreadable keys, failed writes) are recovered
//! from inside the engines and only logged. The variants below cover what
//! callers actually see: opening storage, loading configuration, and wiring
//! the service graph.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studyflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A required collaborator was never supplied to the tracker builder.
    #[error("Missing provider: {0} must be supplied before building the tracker")]
    MissingProvider(&'static str),

    /// Lookup by id failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty text where content is required
    #[error("'{field}' must not be empty")]
    Empty { field: &'static str },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
