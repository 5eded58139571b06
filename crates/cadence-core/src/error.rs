//! Core error types for cadence-core.
//!
//! This module defines the error hierarchy using thiserror. Every failure
//! here is per-operation and recoverable by retrying the triggering action;
//! nothing in the core is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

use crate::goal::GoalId;

/// Core error type for cadence-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Bad input to a goal operation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Completion attempted before the goal's interval elapsed
    #[error("Goal '{goal_id}' can be completed again in {minutes_remaining} minutes")]
    TooSoon {
        goal_id: GoalId,
        minutes_remaining: u64,
    },

    /// Operation on a goal id that is not tracked or not stored
    #[error("Goal not found: {0}")]
    NotFound(GoalId),

    /// The goal store could not serve the request
    #[error("Goal store unavailable: {message}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for a store failure without an underlying source.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        CoreError::StoreUnavailable {
            message: message.into(),
            source: None,
        }
    }
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

    /// Stored row could not be decoded
    #[error("Corrupt row in '{table}': {message}")]
    CorruptRow { table: String, message: String },

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

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Notification delivery errors. These are logged and swallowed by the
/// controller, never propagated to callers of goal operations.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Delivery channel refused the notice
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// Delivery did not finish within the configured timeout
    #[error("Delivery timed out")]
    Timeout,

    /// The delivery queue is full or closed
    #[error("Notification queue unavailable: {0}")]
    QueueUnavailable(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty or whitespace-only label
    #[error("Goal label must not be empty")]
    EmptyLabel,

    /// Interval below the one-minute granularity
    #[error("Goal interval must be at least 1 minute (got {0})")]
    IntervalTooShort(u32),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
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

impl From<tokio::time::error::Elapsed> for NotifyError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        NotifyError::Timeout
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
