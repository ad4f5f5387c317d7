//! Azure Document Intelligence client for the prebuilt receipt model.
//!
//! Analysis is asynchronous on the service side: submitting an image returns
//! an operation URL which is polled until the analysis resolves. The raw
//! field tree is then flattened into [`ReceiptResult`]s.

use crate::clients::ReceiptAnalyzer;
use crate::core::receipt::ReceiptResult;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const MODEL_ID: &str = "prebuilt-receipt";
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 60;

pub struct AzureReceiptAnalyzer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    status: String,
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    fields: Fields,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Fields {
    items: Option<Field>,
    total: Option<Field>,
    transaction_date: Option<Field>,
    merchant_name: Option<Field>,
}

/// One node of the service's field tree. Only the value variants the
/// receipt model produces are mapped.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Field {
    value_string: Option<String>,
    value_date: Option<NaiveDate>,
    value_currency: Option<Currency>,
    #[serde(default)]
    value_array: Vec<Field>,
    // Boxed: Field and ItemObject reference each other
    value_object: Option<Box<ItemObject>>,
}

#[derive(Deserialize)]
struct Currency {
    amount: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemObject {
    description: Option<Field>,
    total_price: Option<Field>,
}

impl AzureReceiptAnalyzer {
    pub fn new(endpoint: &str, api_key: &str, api_version: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
        })
    }

    async fn submit(&self, image: &[u8]) -> Result<String> {
        let url = format!(
            "{}/documentintelligence/documentModels/{MODEL_ID}:analyze?api-version={}",
            self.endpoint, self.api_version
        );
        let response = self
            .http
            .post(url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::external("OCR", format!("submit failed {status}: {body}")));
        }
        response
            .headers()
            .get("Operation-Location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| Error::external("OCR", "missing Operation-Location header"))
    }

    async fn poll(&self, operation_url: &str) -> Result<AnalyzeResult> {
        for _ in 0..MAX_POLLS {
            let response: OperationResponse = self
                .http
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await?
                .json()
                .await?;
            match response.status.as_str() {
                "succeeded" => {
                    return response
                        .analyze_result
                        .ok_or_else(|| Error::external("OCR", "succeeded without a result"));
                }
                "failed" => return Err(Error::external("OCR", "analysis failed")),
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
        Err(Error::external("OCR", "analysis did not finish in time"))
    }
}

fn to_receipt(document: Document) -> ReceiptResult {
    let fields = document.fields;
    let raw_items: Vec<(String, i64)> = fields
        .items
        .map(|items| items.value_array)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| entry.value_object.map(|object| *object))
        .filter_map(|object| {
            let price = object
                .total_price
                .and_then(|p| p.value_currency)
                .map(|c| c.amount as i64)?;
            let name = object
                .description
                .and_then(|d| d.value_string)
                .unwrap_or_else(|| "item".to_string());
            Some((name, price))
        })
        .collect();

    let total = fields
        .total
        .and_then(|t| t.value_currency)
        .map(|c| c.amount as i64);
    let date = fields.transaction_date.and_then(|d| d.value_date);
    let store = fields
        .merchant_name
        .and_then(|m| m.value_string)
        .unwrap_or_default();

    ReceiptResult::from_parts(raw_items, total, date, store)
}

#[async_trait]
impl ReceiptAnalyzer for AzureReceiptAnalyzer {
    async fn analyze(&self, image: &[u8]) -> Result<Vec<ReceiptResult>> {
        let operation_url = self.submit(image).await?;
        let result = self.poll(&operation_url).await?;
        debug!(documents = result.documents.len(), "receipt analysis resolved");
        Ok(result
            .documents
            .into_iter()
            .map(to_receipt)
            .filter(|receipt| !receipt.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_field_tree_maps_to_receipt() {
        let raw = json!({
            "fields": {
                "MerchantName": { "valueString": "Market" },
                "TransactionDate": { "valueDate": "2026-08-01" },
                "Total": { "valueCurrency": { "amount": 150.0 } },
                "Items": {
                    "valueArray": [
                        {
                            "valueObject": {
                                "Description": { "valueString": "Apple" },
                                "TotalPrice": { "valueCurrency": { "amount": 150.0 } }
                            }
                        },
                        {
                            "valueObject": {
                                "Description": { "valueString": "unpriced row" }
                            }
                        }
                    ]
                }
            }
        });
        let document: Document = serde_json::from_value(raw).unwrap();
        let receipt = to_receipt(document);

        assert_eq!(receipt.store, "Market");
        assert_eq!(receipt.total, Some(150));
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2026, 8, 1));
        // Rows without a price are skipped
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Apple");
    }

    #[test]
    fn test_empty_document_yields_empty_receipt() {
        let document: Document = serde_json::from_value(json!({ "fields": {} })).unwrap();
        assert!(to_receipt(document).is_empty());
    }
}
