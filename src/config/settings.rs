//! Application settings collected from environment variables.
//!
//! Secrets (channel credentials, OCR key) stay in the environment and are
//! read once at startup into an [`AppConfig`] that the rest of the
//! application borrows.

use crate::errors::{Error, Result};
use std::env;

/// Everything the binary needs to run, resolved at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SeaORM connection string
    pub database_url: String,
    /// Address the webhook server binds to
    pub bind_address: String,
    /// LINE channel secret, used for webhook signature verification
    pub channel_secret: String,
    /// LINE channel access token, used for outbound Messaging API calls
    pub channel_access_token: String,
    /// Azure Document Intelligence endpoint
    pub ocr_endpoint: String,
    /// Azure Document Intelligence API key
    pub ocr_api_key: String,
    /// Azure Document Intelligence API version
    pub ocr_api_version: String,
    /// HTTP endpoint that appends rows to the household spreadsheet
    pub ledger_endpoint: String,
    /// Bearer token for the ledger endpoint
    pub ledger_token: String,
    /// Path to the classification seed file
    pub classifications_path: String,
    /// Seconds between queue polls of the analysis worker
    pub worker_poll_secs: u64,
    /// Delivery attempts before a job is dropped
    pub worker_max_attempts: i32,
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| Error::Config {
        message: format!("{key} must be set"),
    })
}

impl AppConfig {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    /// Returns a configuration error if a required variable is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        let worker_poll_secs = env::var("WORKER_POLL_SECS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|e| Error::Config {
                message: format!("WORKER_POLL_SECS must be an integer: {e}"),
            })?;
        let worker_max_attempts = env::var("WORKER_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|e| Error::Config {
                message: format!("WORKER_MAX_ATTEMPTS must be an integer: {e}"),
            })?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/receipt_ledger.sqlite?mode=rwc".to_string()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            channel_secret: required("LINE_CHANNEL_SECRET")?,
            channel_access_token: required("LINE_CHANNEL_ACCESS_TOKEN")?,
            ocr_endpoint: required("OCR_ENDPOINT")?,
            ocr_api_key: required("OCR_API_KEY")?,
            ocr_api_version: env::var("OCR_API_VERSION")
                .unwrap_or_else(|_| "2024-11-30".to_string()),
            ledger_endpoint: required("LEDGER_ENDPOINT")?,
            ledger_token: required("LEDGER_TOKEN")?,
            classifications_path: env::var("CLASSIFICATIONS_PATH")
                .unwrap_or_else(|_| "classifications.toml".to_string()),
            worker_poll_secs,
            worker_max_attempts,
        })
    }
}
