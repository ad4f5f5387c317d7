//! Draft expenditure entity - a pending, not-yet-committed expenditure
//! extracted from one receipt image.
//!
//! The extracted and user-edited receipt data lives in the `data` JSON column
//! so individual field edits never have to rewrite the rest of the row.
use chrono::NaiveDate;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Analysis lifecycle of a draft. `New` only exists between a category
/// shortcut command and the arrival of the photo; records created from an
/// image enter directly at `Analyzing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum DraftStatus {
    #[sea_orm(string_value = "NEW")]
    #[serde(rename = "NEW")]
    New,
    #[sea_orm(string_value = "ANALYZING")]
    #[serde(rename = "ANALYZING")]
    Analyzing,
    #[sea_orm(string_value = "ANALYZED")]
    #[serde(rename = "ANALYZED")]
    Analyzed,
    #[sea_orm(string_value = "INVALID_IMAGE")]
    #[serde(rename = "INVALID_IMAGE")]
    InvalidImage,
}

/// How the payer settled the bill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "ADVANCE_PAYMENT")]
    AdvancePayment,
    #[serde(rename = "FAMILY_CARD")]
    FamilyCard,
}

impl PaymentMethod {
    /// Human-readable label used in messages and ledger rows.
    pub const fn label(self) -> &'static str {
        match self {
            Self::AdvancePayment => "advance payment",
            Self::FamilyCard => "family card",
        }
    }

    /// Parses the stable key carried in postback payloads.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ADVANCE_PAYMENT" => Some(Self::AdvancePayment),
            "FAMILY_CARD" => Some(Self::FamilyCard),
            _ => None,
        }
    }

    /// Stable key carried in postback payloads.
    pub const fn key(self) -> &'static str {
        match self {
            Self::AdvancePayment => "ADVANCE_PAYMENT",
            Self::FamilyCard => "FAMILY_CARD",
        }
    }
}

/// One line item of a receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    /// Whole yen. Never negative in a stored record; discounts are folded
    /// into the preceding item before persistence.
    pub price: i64,
    pub remarks: String,
}

impl Default for ReceiptItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: 0,
            remarks: "via LINE.".to_string(),
        }
    }
}

/// Structured expenditure data extracted from the receipt and refined by the
/// editing dialog. Stored as one JSON column on the draft row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ExpenditureData {
    pub items: Vec<ReceiptItem>,
    pub total: Option<i64>,
    pub date: Option<NaiveDate>,
    pub store: String,
    pub major_classification: String,
    pub minor_classification: String,
    pub payer: String,
    pub for_whom: String,
    pub payment_method: PaymentMethod,
    /// How many receipts the source image contained beyond the first.
    pub extra_receipts: u32,
}

impl Default for ExpenditureData {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
            date: None,
            store: String::new(),
            major_classification: "living".to_string(),
            minor_classification: "groceries".to_string(),
            payer: String::new(),
            for_whom: "shared".to_string(),
            payment_method: PaymentMethod::default(),
            extra_receipts: 0,
        }
    }
}

impl ExpenditureData {
    /// Renders the classification/payer block shown in confirmation views.
    pub fn common_info(&self) -> String {
        format!(
            "[Common info]\n\
             Major category: {}\n\
             Minor category: {}\n\
             Payer: {}\n\
             For whom: {}\n\
             Payment method: {}",
            self.major_classification,
            self.minor_classification,
            self.payer,
            self.for_whom,
            self.payment_method.label()
        )
    }

    /// Renders the extracted receipt fields, with footnotes for anything the
    /// analysis could not read or reconcile.
    pub fn receipt_info(&self) -> String {
        let date = self
            .date
            .map_or_else(|| "unknown".to_string(), |d| d.to_string());
        let total = self
            .total
            .map_or_else(|| "?".to_string(), |t| t.to_string());
        let mut out = format!(
            "[Receipt analysis]\nDate: {date}\nTotal: {total} yen\nStore: {}\n\n--- Items ---\n",
            self.store
        );
        let mut sum = 0;
        for item in &self.items {
            sum += item.price;
            out.push_str(&format!("- {}: {} yen\n", item.name, item.price));
        }
        if self.total.is_none() {
            out.push_str("\n* The total could not be read.\n");
        } else if self.items.is_empty() {
            out.push_str("\n* No line items could be read.\n");
        } else if Some(sum) != self.total {
            out.push_str(&format!(
                "\n* The item sum does not match the total. Item sum: {sum} yen\n"
            ));
        }
        if self.extra_receipts > 0 {
            out.push_str("\n* The image contained more than one receipt.\n");
        }
        out
    }
}

/// Draft expenditure database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "draft_expenditures")]
pub struct Model {
    /// Opaque unique id, generated at creation
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Platform user who owns this draft
    pub line_user_id: String,
    /// Platform id of the source image; empty until a photo arrives
    pub line_image_id: String,
    /// Analysis lifecycle status
    pub status: DraftStatus,
    /// Extracted and edited expenditure data
    #[sea_orm(column_type = "Json")]
    pub data: ExpenditureData,
    /// Set only when the source image was part of a multi-image submission
    pub image_set_id: Option<String>,
    /// Unix timestamp after which the draft counts as expired
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
