//! Draft expenditure business logic - repository operations over pending
//! receipts.
//!
//! Reads treat rows past their expiry timestamp as absent, emulating the
//! store-level TTL of the original deployment. Field edits go through typed
//! [`DraftPatch`] values and update only the columns they name; concurrent
//! edits are last-write-wins.

use crate::core::receipt::ReceiptResult;
use crate::entities::{
    DraftColumn, DraftExpenditure, DraftModel, DraftStatus, ExpenditureData, PaymentMethod,
    draft_expenditure, ttl_timestamp,
};
use crate::errors::Result;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Default lifetime of a draft nobody finishes registering.
pub const DRAFT_TTL_SECS: i64 = 30 * 24 * 60 * 60;
/// Shortened lifetime once analysis failed permanently.
pub const INVALID_IMAGE_TTL_SECS: i64 = 24 * 60 * 60;

/// A typed field edit for a draft's expenditure data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftPatch {
    /// New minor category with its re-derived major category
    Classification { minor: String, major: String },
    Payer(String),
    ForWhom(String),
    PaymentMethod(PaymentMethod),
    Date(NaiveDate),
}

impl DraftPatch {
    fn apply(self, data: &mut ExpenditureData) {
        match self {
            Self::Classification { minor, major } => {
                data.minor_classification = minor;
                data.major_classification = major;
            }
            Self::Payer(payer) => data.payer = payer,
            Self::ForWhom(for_whom) => data.for_whom = for_whom,
            Self::PaymentMethod(method) => data.payment_method = method,
            Self::Date(date) => data.date = Some(date),
        }
    }
}

/// Builds a new draft model with a fresh id and the default TTL.
pub fn new_draft(
    line_user_id: &str,
    line_image_id: &str,
    status: DraftStatus,
    data: ExpenditureData,
    image_set_id: Option<String>,
) -> DraftModel {
    DraftModel {
        id: uuid::Uuid::new_v4().to_string(),
        line_user_id: line_user_id.to_string(),
        line_image_id: line_image_id.to_string(),
        status,
        data,
        image_set_id,
        expires_at: ttl_timestamp(DRAFT_TTL_SECS),
    }
}

/// Inserts a draft.
pub async fn create_draft(db: &DatabaseConnection, draft: DraftModel) -> Result<DraftModel> {
    let active: draft_expenditure::ActiveModel = draft.clone().into();
    DraftExpenditure::insert(active).exec(db).await?;
    Ok(draft)
}

/// Inserts several drafts in one batch write. No atomicity beyond
/// "submitted in one call".
pub async fn create_drafts(db: &DatabaseConnection, drafts: Vec<DraftModel>) -> Result<()> {
    if drafts.is_empty() {
        return Ok(());
    }
    let active: Vec<draft_expenditure::ActiveModel> =
        drafts.into_iter().map(Into::into).collect();
    DraftExpenditure::insert_many(active).exec(db).await?;
    Ok(())
}

/// Fetches a draft by id. Expired drafts count as absent.
pub async fn get_draft(db: &DatabaseConnection, id: &str) -> Result<Option<DraftModel>> {
    Ok(DraftExpenditure::find_by_id(id)
        .one(db)
        .await?
        .filter(|draft| draft.expires_at > Utc::now().timestamp()))
}

/// All live drafts owned by one user, for the pending-receipts list.
pub async fn list_drafts_for_user(
    db: &DatabaseConnection,
    line_user_id: &str,
) -> Result<Vec<DraftModel>> {
    DraftExpenditure::find()
        .filter(DraftColumn::LineUserId.eq(line_user_id))
        .filter(DraftColumn::ExpiresAt.gt(Utc::now().timestamp()))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a field edit and returns the updated draft, or `None` if the
/// draft no longer exists.
pub async fn apply_patch(
    db: &DatabaseConnection,
    id: &str,
    patch: DraftPatch,
) -> Result<Option<DraftModel>> {
    let Some(draft) = get_draft(db, id).await? else {
        return Ok(None);
    };
    let mut data = draft.data;
    patch.apply(&mut data);

    let updated = draft_expenditure::ActiveModel {
        id: Set(id.to_string()),
        data: Set(data),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(Some(updated))
}

/// Attaches a received image to a pre-configured draft and moves it into
/// analysis.
pub async fn attach_image(
    db: &DatabaseConnection,
    id: &str,
    line_image_id: &str,
    image_set_id: Option<String>,
) -> Result<Option<DraftModel>> {
    if get_draft(db, id).await?.is_none() {
        return Ok(None);
    }
    let updated = draft_expenditure::ActiveModel {
        id: Set(id.to_string()),
        line_image_id: Set(line_image_id.to_string()),
        status: Set(DraftStatus::Analyzing),
        image_set_id: Set(image_set_id),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(Some(updated))
}

/// Marks a draft as successfully analyzed, merging the receipt fields into
/// its data. `extra_receipts` is the number of additional receipts found in
/// the same image.
pub async fn update_analysis_success(
    db: &DatabaseConnection,
    id: &str,
    result: &ReceiptResult,
    extra_receipts: u32,
) -> Result<Option<DraftModel>> {
    let Some(draft) = get_draft(db, id).await? else {
        return Ok(None);
    };
    let mut data = draft.data;
    data.items = result.items.clone();
    data.total = result.total;
    data.date = result.date;
    data.store = result.store.clone();
    data.extra_receipts = extra_receipts;

    let updated = draft_expenditure::ActiveModel {
        id: Set(id.to_string()),
        status: Set(DraftStatus::Analyzed),
        data: Set(data),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(Some(updated))
}

/// Marks a draft as an unusable image and shortens its lifetime to one day.
pub async fn update_analysis_failure(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<DraftModel>> {
    if get_draft(db, id).await?.is_none() {
        return Ok(None);
    }
    let updated = draft_expenditure::ActiveModel {
        id: Set(id.to_string()),
        status: Set(DraftStatus::InvalidImage),
        expires_at: Set(ttl_timestamp(INVALID_IMAGE_TTL_SECS)),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(Some(updated))
}

/// Deletes a draft (commit or discard). Deleting an absent draft is a no-op.
pub async fn delete_draft(db: &DatabaseConnection, id: &str) -> Result<()> {
    DraftExpenditure::delete_by_id(id).exec(db).await?;
    Ok(())
}

/// A sibling draft carrying another receipt found in the same image. The
/// copy gets its own id and is not linked to the original.
pub fn sibling_draft(base: &DraftModel, result: &ReceiptResult) -> DraftModel {
    let mut data = base.data.clone();
    data.items = result.items.clone();
    data.total = result.total;
    data.date = result.date;
    data.store = result.store.clone();
    data.extra_receipts = 0;

    DraftModel {
        id: uuid::Uuid::new_v4().to_string(),
        line_user_id: base.line_user_id.clone(),
        line_image_id: base.line_image_id.clone(),
        status: DraftStatus::Analyzed,
        data,
        image_set_id: None,
        expires_at: base.expires_at,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::ReceiptItem;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_and_get_draft() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = create_test_draft(&db, "user1").await?;

        let found = get_draft(&db, &draft.id).await?.unwrap();
        assert_eq!(found, draft);
        assert_eq!(found.status, DraftStatus::Analyzing);

        assert!(get_draft(&db, "missing").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_draft_counts_as_absent() -> Result<()> {
        let db = setup_test_db().await?;
        let mut draft = new_draft(
            "user1",
            "img1",
            DraftStatus::Analyzing,
            ExpenditureData::default(),
            None,
        );
        draft.expires_at = Utc::now().timestamp() - 10;
        let draft = create_draft(&db, draft).await?;

        assert!(get_draft(&db, &draft.id).await?.is_none());
        assert!(list_drafts_for_user(&db, "user1").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_drafts_scoped_to_user() -> Result<()> {
        let db = setup_test_db().await?;
        let mine = create_test_draft(&db, "user1").await?;
        let _theirs = create_test_draft(&db, "user2").await?;

        let listed = list_drafts_for_user(&db, "user1").await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_classification_patch() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = create_test_draft(&db, "user1").await?;

        let updated = apply_patch(
            &db,
            &draft.id,
            DraftPatch::Classification {
                minor: "eating out".to_string(),
                major: "leisure".to_string(),
            },
        )
        .await?
        .unwrap();
        assert_eq!(updated.data.minor_classification, "eating out");
        assert_eq!(updated.data.major_classification, "leisure");

        // Other fields untouched
        assert_eq!(updated.data.payer, draft.data.payer);
        assert_eq!(updated.status, draft.status);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_patch_missing_draft() -> Result<()> {
        let db = setup_test_db().await?;
        let result = apply_patch(&db, "missing", DraftPatch::Payer("Bob".to_string())).await?;
        assert!(result.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_analysis_success_merges_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = create_test_draft(&db, "user1").await?;

        let result = ReceiptResult {
            items: vec![ReceiptItem {
                name: "Apple".to_string(),
                price: 100,
                remarks: "via LINE.".to_string(),
            }],
            total: Some(100),
            date: None,
            store: "Market".to_string(),
        };
        let updated = update_analysis_success(&db, &draft.id, &result, 0)
            .await?
            .unwrap();

        assert_eq!(updated.status, DraftStatus::Analyzed);
        assert_eq!(updated.data.items, result.items);
        assert_eq!(updated.data.total, Some(100));
        assert_eq!(updated.data.store, "Market");
        // Classification defaults survive the merge
        assert_eq!(updated.data.minor_classification, "groceries");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_analysis_failure_shortens_ttl() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = create_test_draft(&db, "user1").await?;

        let updated = update_analysis_failure(&db, &draft.id).await?.unwrap();
        assert_eq!(updated.status, DraftStatus::InvalidImage);
        let one_day_out = ttl_timestamp(INVALID_IMAGE_TTL_SECS);
        assert!(updated.expires_at <= one_day_out);
        assert!(updated.expires_at > one_day_out - 60);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_draft() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = create_test_draft(&db, "user1").await?;

        delete_draft(&db, &draft.id).await?;
        assert!(get_draft(&db, &draft.id).await?.is_none());

        // Deleting again is a no-op
        delete_draft(&db, &draft.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_sibling_draft_is_independent() -> Result<()> {
        let db = setup_test_db().await?;
        let mut base = create_test_draft(&db, "user1").await?;
        base.image_set_id = Some("set1".to_string());

        let result = ReceiptResult {
            items: vec![],
            total: Some(500),
            date: None,
            store: "Other".to_string(),
        };
        let sibling = sibling_draft(&base, &result);

        assert_ne!(sibling.id, base.id);
        assert_eq!(sibling.line_user_id, base.line_user_id);
        assert_eq!(sibling.status, DraftStatus::Analyzed);
        assert_eq!(sibling.data.total, Some(500));
        assert_eq!(sibling.image_set_id, None);
        Ok(())
    }
}
