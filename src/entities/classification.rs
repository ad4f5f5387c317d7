//! Classification entity - immutable reference data mapping a minor spending
//! category to its parent major category and a display color.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classifications")]
pub struct Model {
    /// Minor category name
    #[sea_orm(primary_key, auto_increment = false)]
    pub minor: String,
    /// Parent major category name
    pub major: String,
    /// Display color (hex) for chat bubbles
    pub color: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
