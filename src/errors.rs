//! Unified error type and `Result` alias for the whole crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Draft expenditure not found: {id}")]
    DraftNotFound { id: String },

    #[error("No classification registered for minor category: {minor}")]
    ClassificationNotFound { minor: String },

    #[error("Malformed postback payload: {0}")]
    Postback(#[from] serde_json::Error),

    #[error("Invalid date string: {value}")]
    InvalidDate { value: String },

    #[error("Unknown payment method key: {value}")]
    UnknownPaymentMethod { value: String },

    #[error("{service} API error: {message}")]
    ExternalApi {
        service: &'static str,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for an external-collaborator failure.
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalApi {
            service,
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
