//! Error types for tankwatch-core
//!
//! Insufficient history is not an error: the analyzers return degraded
//! results for it. Everything here is a real failure that a caller has to
//! decide about.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::EntityKind;

/// Core error type for tankwatch operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Store Errors
    // ===================
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: EntityKind, id: String },

    #[error("History store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Id {id} is already used by a {existing}")]
    DuplicateId { id: String, existing: EntityKind },

    #[error("History window of {hours}h is out of range (max {max}h)")]
    InvalidWindow { hours: u32, max: u32 },

    #[error("Failed to fetch history for {kind} {id}: {message}")]
    HistoryFetch {
        kind: EntityKind,
        id: String,
        message: String,
    },

    // ===================
    // Aggregation Errors
    // ===================
    #[error("Analytics task for {id} failed: {message}")]
    TaskFailed { id: String, message: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML in {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    // ===================
    // Seed Errors
    // ===================
    #[error("Failed to read seed file: {path}")]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in {path}: {message}")]
    SeedParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CoreError {
    /// True for failures of the store itself rather than of one entity
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::EntityNotFound { .. })
    }

    /// True for errors caused by the caller's arguments
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidWindow { .. } | CoreError::DuplicateId { .. }
        )
    }
}
