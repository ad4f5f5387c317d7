//! Conversation session entity - short-lived single-slot dialog state per user.
//!
//! One row per platform user, last-write-wins. Consumed (read and deleted)
//! by the next inbound text or image event from that user.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which multi-step dialog is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SessionType {
    #[sea_orm(string_value = "REGISTER_USER")]
    #[serde(rename = "REGISTER_USER")]
    RegisterUser,
    #[sea_orm(string_value = "REGISTER_EXPENDITURE")]
    #[serde(rename = "REGISTER_EXPENDITURE")]
    RegisterExpenditure,
}

/// Conversation session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Platform user id; one session per user
    #[sea_orm(primary_key, auto_increment = false)]
    pub line_user_id: String,
    /// Dialog in progress
    pub session_type: SessionType,
    /// Draft expenditure the dialog concerns, if any
    pub draft_id: Option<String>,
    /// Unix timestamp after which the session counts as expired
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
