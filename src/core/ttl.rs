//! Background expiry sweeping.
//!
//! Reads already filter expired rows, so the sweeper only reclaims storage;
//! correctness never depends on it having run.

use crate::entities::{
    BatchImage, BatchImageColumn, DraftColumn, DraftExpenditure, ImageBatch, ImageBatchColumn,
    Session, SessionColumn,
};
use crate::errors::Result;
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

/// Deletes every expired draft, session, and batch tracker (with its
/// per-image entries).
pub async fn purge_expired(db: &DatabaseConnection) -> Result<()> {
    let now = Utc::now().timestamp();

    let drafts = DraftExpenditure::delete_many()
        .filter(DraftColumn::ExpiresAt.lte(now))
        .exec(db)
        .await?;
    let sessions = Session::delete_many()
        .filter(SessionColumn::ExpiresAt.lte(now))
        .exec(db)
        .await?;

    let expired_batches: Vec<String> = ImageBatch::find()
        .filter(ImageBatchColumn::ExpiresAt.lte(now))
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.image_set_id)
        .collect();
    for image_set_id in &expired_batches {
        BatchImage::delete_many()
            .filter(BatchImageColumn::ImageSetId.eq(image_set_id))
            .exec(db)
            .await?;
        ImageBatch::delete_by_id(image_set_id).exec(db).await?;
    }

    debug!(
        drafts = drafts.rows_affected,
        sessions = sessions.rows_affected,
        batches = expired_batches.len(),
        "purged expired rows"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::draft;
    use crate::entities::{DraftStatus, ExpenditureData, batch_image, image_batch, session};
    use crate::entities::SessionType;
    use crate::test_utils::*;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn test_purge_removes_only_expired_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let past = Utc::now().timestamp() - 10;

        let live = create_test_draft(&db, "user1").await?;
        let mut stale =
            draft::new_draft("user1", "img2", DraftStatus::New, ExpenditureData::default(), None);
        stale.expires_at = past;
        draft::create_draft(&db, stale.clone()).await?;

        session::ActiveModel {
            line_user_id: Set("user1".to_string()),
            session_type: Set(SessionType::RegisterUser),
            draft_id: Set(None),
            expires_at: Set(past),
        }
        .insert(&db)
        .await?;

        image_batch::ActiveModel {
            image_set_id: Set("set1".to_string()),
            total: Set(2),
            expires_at: Set(past),
        }
        .insert(&db)
        .await?;
        batch_image::ActiveModel {
            line_image_id: Set("img3".to_string()),
            image_set_id: Set("set1".to_string()),
            status: Set(DraftStatus::Analyzing),
        }
        .insert(&db)
        .await?;

        purge_expired(&db).await?;

        assert!(draft::get_draft(&db, &live.id).await?.is_some());
        assert!(DraftExpenditure::find_by_id(&stale.id).one(&db).await?.is_none());
        assert!(Session::find_by_id("user1").one(&db).await?.is_none());
        assert!(ImageBatch::find_by_id("set1").one(&db).await?.is_none());
        assert!(BatchImage::find_by_id("img3").one(&db).await?.is_none());
        Ok(())
    }
}
