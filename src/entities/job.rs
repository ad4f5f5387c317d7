//! Analysis job entity - the work-queue transport for receipt analysis.
//!
//! A row is a queued job referencing a draft expenditure. Consumers must
//! delete the row only on success; failed attempts push `visible_at` back so
//! the job is redelivered after a backoff.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Analysis job database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    /// Queue-assigned job id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Draft expenditure to analyze
    pub draft_id: String,
    /// Delivery attempts so far
    pub attempts: i32,
    /// Unix timestamp before which the job is invisible to consumers
    pub visible_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
