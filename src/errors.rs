//! Unified error types for the order backend.
//!
//! Domain failures carry enough context for the HTTP layer to pick a status code
//! and a human-readable message; infrastructure failures wrap their source.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed fields, or references to inactive/nonexistent entities
    #[error("{message}")]
    InvalidInput { message: String },

    /// The addressed entity does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The requested state change is not allowed from the current state
    #[error("{message}")]
    InvalidTransition { message: String },

    /// An ingredient does not hold enough stock for the requested decrement
    #[error("Insufficient stock for ingredient '{ingredient}': available {available}, required {required}")]
    InsufficientStock {
        ingredient: String,
        available: Decimal,
        required: Decimal,
    },

    /// Required seed data is missing or inconsistent
    #[error("Internal invariant violated: {message}")]
    InternalInvariantViolation { message: String },

    /// No usable credentials were presented
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The caller's role is not allowed to perform the operation
    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    /// A row changed underneath a read-modify-write and retries ran out
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Password hashing or token generation failed
    #[error("Credential error: {message}")]
    Credential { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for an [`Error::InvalidInput`] with the given message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::NotFound`] on the given entity and id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
