//! Image batch entity - header record for a multi-image receipt submission.
//!
//! Per-image status lives in [`super::batch_image`]; this row only carries the
//! declared image count and the TTL. Deleting this row is the serialization
//! point for the single aggregated notification.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Image batch database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_batches")]
pub struct Model {
    /// Platform-assigned image-set id
    #[sea_orm(primary_key, auto_increment = false)]
    pub image_set_id: String,
    /// Declared number of images in the set
    pub total: i32,
    /// Unix timestamp after which the tracker counts as expired
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Per-image status entries of this batch
    #[sea_orm(has_many = "super::batch_image::Entity")]
    BatchImage,
}

impl Related<super::batch_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchImage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
