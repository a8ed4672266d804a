// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Medvault reminder engine.

use thiserror::Error;

/// The primary error type used across collaborator traits and engine operations.
#[derive(Debug, Error)]
pub enum MedvaultError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Notification delivery errors (SMTP rejection, transport failure).
    #[error("notification error: {message}")]
    Notify {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A status change was requested from a status that does not allow it.
    #[error("invalid transition for {id} from status {status}")]
    InvalidTransition { id: String, status: String },

    /// A medication schedule entry could not be parsed.
    #[error("invalid schedule entry: {0}")]
    InvalidSchedule(String),

    /// Input rejected before reaching the store (e.g. start after end).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MedvaultError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MedvaultError::Storage {
            source: Box::new(err),
        }
    }

    /// Build a delivery failure with an underlying cause.
    pub fn notify<E>(message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MedvaultError::Notify {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }
}
