//! Conversation session business logic.
//!
//! A session records what the bot is waiting for from a user (a chosen name,
//! a receipt photo). Each user has at most one session, and sessions are
//! consumed on read so a reply never triggers the same prompt twice.

use crate::entities::{Session, SessionColumn, SessionModel, SessionType, session, ttl_timestamp};
use crate::errors::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

pub const SESSION_TTL_SECS: i64 = 15 * 60;

/// Starts a session for a user, replacing any existing one.
pub async fn put_session(
    db: &DatabaseConnection,
    line_user_id: &str,
    session_type: SessionType,
    draft_id: Option<String>,
) -> Result<()> {
    Session::delete_by_id(line_user_id).exec(db).await?;
    session::ActiveModel {
        line_user_id: Set(line_user_id.to_string()),
        session_type: Set(session_type),
        draft_id: Set(draft_id),
        expires_at: Set(ttl_timestamp(SESSION_TTL_SECS)),
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Removes and returns the user's pending session, or `None` if there is
/// none or it has expired.
pub async fn take_session(
    db: &DatabaseConnection,
    line_user_id: &str,
) -> Result<Option<SessionModel>> {
    let found = Session::find_by_id(line_user_id)
        .filter(SessionColumn::ExpiresAt.gt(Utc::now().timestamp()))
        .one(db)
        .await?;
    if found.is_some() {
        Session::delete_by_id(line_user_id).exec(db).await?;
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_session_is_consumed_on_take() -> Result<()> {
        let db = setup_test_db().await?;
        put_session(&db, "user1", SessionType::RegisterUser, None).await?;

        let taken = take_session(&db, "user1").await?.unwrap();
        assert_eq!(taken.session_type, SessionType::RegisterUser);
        assert!(take_session(&db, "user1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_put_session_replaces_existing() -> Result<()> {
        let db = setup_test_db().await?;
        put_session(&db, "user1", SessionType::RegisterUser, None).await?;
        put_session(
            &db,
            "user1",
            SessionType::RegisterExpenditure,
            Some("draft1".to_string()),
        )
        .await?;

        let taken = take_session(&db, "user1").await?.unwrap();
        assert_eq!(taken.session_type, SessionType::RegisterExpenditure);
        assert_eq!(taken.draft_id.as_deref(), Some("draft1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_session_is_invisible() -> Result<()> {
        let db = setup_test_db().await?;
        session::ActiveModel {
            line_user_id: Set("user1".to_string()),
            session_type: Set(SessionType::RegisterUser),
            draft_id: Set(None),
            expires_at: Set(Utc::now().timestamp() - 10),
        }
        .insert(&db)
        .await?;

        assert!(take_session(&db, "user1").await?.is_none());
        Ok(())
    }
}
