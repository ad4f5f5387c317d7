//! User directory entity - maps a platform identity to a ledger display name.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User directory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Platform user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub line_user_id: String,
    /// Display name reported by the platform profile
    pub line_name: String,
    /// Chosen ledger name; empty until the registration dialog completes
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
