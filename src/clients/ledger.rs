//! HTTP client for the household ledger spreadsheet.
//!
//! The spreadsheet sits behind a small append-only web endpoint: one POST
//! per commit, carrying the rows to append in order.

use crate::clients::LedgerSink;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::info;

pub struct HttpLedgerSink {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpLedgerSink {
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl LedgerSink for HttpLedgerSink {
    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
        let count = rows.len();
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "rows": rows }))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::external("ledger", format!("{status}: {body}")));
        }
        info!(rows = count, "appended to household ledger");
        Ok(())
    }
}
