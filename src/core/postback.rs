//! Postback payload wire format.
//!
//! Every interactive button carries a small JSON payload identifying the
//! action, the draft it belongs to, and optionally the value picked.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostbackAction {
    RegisterExpenditure,
    RegisterOnlyTotal,
    ShowDetail,
    ChangeClassification,
    UpdateClassification,
    ChangeForWhom,
    UpdateForWhom,
    ChangePayer,
    UpdatePayer,
    ChangePaymentMethod,
    UpdatePaymentMethod,
    UpdateDate,
    Discard,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PostbackPayload {
    pub action: PostbackAction,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_item: Option<String>,
}

impl PostbackPayload {
    pub fn new(action: PostbackAction, id: impl Into<String>) -> Self {
        Self {
            action,
            id: id.into(),
            updated_item: None,
        }
    }

    pub fn with_item(action: PostbackAction, id: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            action,
            id: id.into(),
            updated_item: Some(item.into()),
        }
    }

    /// Serialized form placed in a button's `data` field.
    pub fn encode(&self) -> String {
        // The payload is a small flat struct, serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
