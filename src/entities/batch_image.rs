//! Batch image entity - per-image analysis status within an image batch.
//!
//! One row per image keeps concurrent analysis workers from clobbering each
//! other's status writes; the aggregate is recomputed from all rows.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::draft_expenditure::DraftStatus;

/// Batch image database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch_images")]
pub struct Model {
    /// Platform image id (unique across batches)
    #[sea_orm(primary_key, auto_increment = false)]
    pub line_image_id: String,
    /// Image set this entry belongs to
    pub image_set_id: String,
    /// Analysis status of this one image
    pub status: DraftStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one batch header. Cascade: deleting the header
    /// is the notification claim and must take the entries with it.
    #[sea_orm(
        belongs_to = "super::image_batch::Entity",
        from = "Column::ImageSetId",
        to = "super::image_batch::Column::ImageSetId",
        on_delete = "Cascade"
    )]
    ImageBatch,
}

impl Related<super::image_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImageBatch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
