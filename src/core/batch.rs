//! Image batch business logic - reconciles multi-image receipt submissions
//! into one aggregate analysis outcome.
//!
//! Each analysis invocation only updates its own entry row and recomputes
//! the aggregate from the full set, so interleaved workers stay consistent.
//! The batch header's conditional delete ([`claim_batch`]) is the
//! serialization point that keeps the aggregated notification at-most-once.

use crate::entities::{
    BatchImage, BatchImageColumn, DraftStatus, ImageBatch, ImageBatchColumn, batch_image,
    image_batch, ttl_timestamp,
};
use crate::errors::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Lifetime of a tracker whose images never all resolve.
pub const BATCH_TTL_SECS: i64 = 15 * 60;

/// Registers one image of a batch: creates the header on first contact and
/// appends the per-image entry at `ANALYZING`. Re-registration of an already
/// known image is a no-op.
///
/// Not every delivery declares the set's image count; a header stays at 0
/// (undeclared, never resolves) until some event supplies the count.
pub async fn register_image(
    db: &DatabaseConnection,
    image_set_id: &str,
    total: Option<i32>,
    line_image_id: &str,
) -> Result<()> {
    match ImageBatch::find_by_id(image_set_id).one(db).await? {
        None => {
            image_batch::ActiveModel {
                image_set_id: Set(image_set_id.to_string()),
                total: Set(total.unwrap_or(0)),
                expires_at: Set(ttl_timestamp(BATCH_TTL_SECS)),
            }
            .insert(db)
            .await?;
        }
        Some(header) => {
            if let Some(total) = total {
                if total > header.total {
                    image_batch::ActiveModel {
                        image_set_id: Set(image_set_id.to_string()),
                        total: Set(total),
                        ..Default::default()
                    }
                    .update(db)
                    .await?;
                }
            }
        }
    }

    if BatchImage::find_by_id(line_image_id).one(db).await?.is_none() {
        batch_image::ActiveModel {
            line_image_id: Set(line_image_id.to_string()),
            image_set_id: Set(image_set_id.to_string()),
            status: Set(DraftStatus::Analyzing),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Records the analysis outcome of one image of a batch.
pub async fn update_entry_status(
    db: &DatabaseConnection,
    line_image_id: &str,
    status: DraftStatus,
) -> Result<()> {
    if BatchImage::find_by_id(line_image_id).one(db).await?.is_some() {
        batch_image::ActiveModel {
            line_image_id: Set(line_image_id.to_string()),
            status: Set(status),
            ..Default::default()
        }
        .update(db)
        .await?;
    }
    Ok(())
}

/// Computes the aggregate status of a batch from its full entry state, or
/// `None` when the tracker is gone (already claimed, or expired).
pub async fn aggregate_status(
    db: &DatabaseConnection,
    image_set_id: &str,
) -> Result<Option<DraftStatus>> {
    let header = ImageBatch::find_by_id(image_set_id)
        .filter(ImageBatchColumn::ExpiresAt.gt(Utc::now().timestamp()))
        .one(db)
        .await?;
    let Some(header) = header else {
        return Ok(None);
    };

    let statuses: Vec<DraftStatus> = BatchImage::find()
        .filter(BatchImageColumn::ImageSetId.eq(image_set_id))
        .all(db)
        .await?
        .into_iter()
        .map(|entry| entry.status)
        .collect();
    Ok(Some(overall_status(header.total, &statuses)))
}

/// Aggregate of per-image statuses: still `Analyzing` while any image is
/// pending or undeclared, `InvalidImage` if any image failed, `Analyzed`
/// only when every declared image succeeded. A batch whose image count was
/// never declared (`total <= 0`) cannot resolve.
pub fn overall_status(total: i32, statuses: &[DraftStatus]) -> DraftStatus {
    if total <= 0 || (statuses.len() as i32) < total {
        return DraftStatus::Analyzing;
    }
    let mut invalid_exists = false;
    for status in statuses {
        match status {
            DraftStatus::Analyzing | DraftStatus::New => return DraftStatus::Analyzing,
            DraftStatus::InvalidImage => invalid_exists = true,
            DraftStatus::Analyzed => {}
        }
    }
    if invalid_exists {
        DraftStatus::InvalidImage
    } else {
        DraftStatus::Analyzed
    }
}

/// Claims the right to send the single aggregated notification by deleting
/// the batch header. Returns `true` for exactly one caller; losers see the
/// header already gone. Per-image entries go with the header via the
/// cascading foreign key.
pub async fn claim_batch(db: &DatabaseConnection, image_set_id: &str) -> Result<bool> {
    let deleted = ImageBatch::delete_by_id(image_set_id).exec(db).await?;
    Ok(deleted.rows_affected == 1)
}
