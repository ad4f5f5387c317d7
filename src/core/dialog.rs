//! Conversation orchestration - turns incoming platform events into state
//! changes and reply messages.
//!
//! Every handler returns the messages to reply with; nothing here talks to
//! the webhook layer directly. External collaborators come in as trait
//! objects so the flows are testable against fakes.

use crate::clients::{JobQueue, LedgerSink, MessagingClient};
use crate::core::postback::{PostbackAction, PostbackPayload};
use crate::core::{batch, classification, draft, session, user};
use crate::entities::{
    DraftModel, DraftStatus, ExpenditureData, PaymentMethod, SessionType,
};
use crate::errors::{Error, Result};
use crate::messages::{self, Message};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{info, warn};

const CMD_REGISTER_USER: &str = "register user";
const CMD_PENDING_RECEIPTS: &str = "pending receipts";

pub struct DialogOrchestrator {
    db: DatabaseConnection,
    messaging: Arc<dyn MessagingClient>,
    ledger: Arc<dyn LedgerSink>,
    queue: Arc<dyn JobQueue>,
}

impl DialogOrchestrator {
    pub fn new(
        db: DatabaseConnection,
        messaging: Arc<dyn MessagingClient>,
        ledger: Arc<dyn LedgerSink>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            db,
            messaging,
            ledger,
            queue,
        }
    }

    /// A user followed (or re-followed) the bot.
    pub async fn handle_follow(&self, line_user_id: &str) -> Result<Vec<Message>> {
        let profile = self.messaging.fetch_profile(line_user_id).await?;
        user::upsert_on_follow(&self.db, line_user_id, &profile.display_name).await?;
        info!(user = line_user_id, "new follower");
        Ok(vec![messages::greeting(&profile.display_name)])
    }

    /// A user unfollowed the bot. Their data stays until it expires.
    pub fn handle_unfollow(&self, line_user_id: &str) {
        info!(user = line_user_id, "unfollowed");
    }

    /// A text message arrived. Pending sessions take priority over commands.
    pub async fn handle_text(&self, line_user_id: &str, text: &str) -> Result<Vec<Message>> {
        let text = text.trim();

        if let Some(open) = session::take_session(&self.db, line_user_id).await? {
            match open.session_type {
                SessionType::RegisterUser => {
                    user::set_chosen_name(&self.db, line_user_id, text).await?;
                    return Ok(vec![messages::register_user_done(text)]);
                }
                SessionType::RegisterExpenditure => {
                    // Any text while a photo is expected cancels the entry
                    if let Some(draft_id) = open.draft_id {
                        draft::delete_draft(&self.db, &draft_id).await?;
                    }
                    return Ok(vec![messages::expenditure_cancelled()]);
                }
            }
        }

        if text.eq_ignore_ascii_case(CMD_REGISTER_USER) {
            session::put_session(&self.db, line_user_id, SessionType::RegisterUser, None).await?;
            return Ok(vec![messages::prompt_user_name()]);
        }

        if text.eq_ignore_ascii_case(CMD_PENDING_RECEIPTS) {
            let drafts = draft::list_drafts_for_user(&self.db, line_user_id).await?;
            return Ok(vec![messages::pending_list(&drafts)]);
        }

        // A minor category name is a shortcut: pre-classify a draft and wait
        // for the photo.
        match classification::get_major(&self.db, text).await {
            Ok(major) => return self.start_preclassified(line_user_id, text, major).await,
            Err(Error::ClassificationNotFound { .. }) => {}
            Err(err) => return Err(err),
        }

        if let Some(reply) = messages::canned_response(&text.to_lowercase()) {
            return Ok(vec![reply]);
        }
        Ok(vec![messages::not_understood()])
    }

    async fn start_preclassified(
        &self,
        line_user_id: &str,
        minor: &str,
        major: String,
    ) -> Result<Vec<Message>> {
        let data = ExpenditureData {
            major_classification: major,
            minor_classification: minor.to_string(),
            payer: user::payer_name(&self.db, line_user_id).await?,
            ..Default::default()
        };
        let created = draft::create_draft(
            &self.db,
            draft::new_draft(line_user_id, "", DraftStatus::New, data, None),
        )
        .await?;
        session::put_session(
            &self.db,
            line_user_id,
            SessionType::RegisterExpenditure,
            Some(created.id),
        )
        .await?;
        Ok(vec![messages::prompt_receipt_photo(minor)])
    }

    /// An image arrived, possibly as part of a multi-image submission.
    pub async fn handle_image(
        &self,
        line_user_id: &str,
        line_image_id: &str,
        image_set: Option<(&str, Option<i32>)>,
    ) -> Result<Vec<Message>> {
        let image_set_id = match image_set {
            Some((set_id, total)) => {
                batch::register_image(&self.db, set_id, total, line_image_id).await?;
                Some(set_id.to_string())
            }
            None => None,
        };

        let open = session::take_session(&self.db, line_user_id).await?;
        let draft_id = match open.and_then(|s| {
            (s.session_type == SessionType::RegisterExpenditure)
                .then_some(s.draft_id)
                .flatten()
        }) {
            Some(existing) => {
                match draft::attach_image(
                    &self.db,
                    &existing,
                    line_image_id,
                    image_set_id.clone(),
                )
                .await?
                {
                    Some(updated) => updated.id,
                    // Pre-configured draft expired under the session
                    None => self
                        .create_from_image(line_user_id, line_image_id, image_set_id)
                        .await?,
                }
            }
            None => {
                self.create_from_image(line_user_id, line_image_id, image_set_id)
                    .await?
            }
        };

        self.queue.enqueue(&draft_id).await?;
        if let Err(error) = self.messaging.show_loading(line_user_id).await {
            warn!(%error, "loading indicator failed");
        }
        Ok(vec![messages::analysis_started(&draft_id)])
    }

    async fn create_from_image(
        &self,
        line_user_id: &str,
        line_image_id: &str,
        image_set_id: Option<String>,
    ) -> Result<String> {
        let data = ExpenditureData {
            payer: user::payer_name(&self.db, line_user_id).await?,
            ..Default::default()
        };
        let created = draft::create_draft(
            &self.db,
            draft::new_draft(
                line_user_id,
                line_image_id,
                DraftStatus::Analyzing,
                data,
                image_set_id,
            ),
        )
        .await?;
        Ok(created.id)
    }

    /// A button was pressed. `picked_date` carries the value of a date
    /// picker, when one was used.
    pub async fn handle_postback(
        &self,
        _line_user_id: &str,
        data: &str,
        picked_date: Option<&str>,
    ) -> Result<Vec<Message>> {
        let payload: PostbackPayload = serde_json::from_str(data)?;

        let Some(found) = draft::get_draft(&self.db, &payload.id).await? else {
            return Ok(vec![messages::not_found()]);
        };

        // Stale buttons: a draft that is still analyzing, or whose image was
        // rejected, only supports viewing and discarding. Re-render the
        // confirm view so the user sees the actual state.
        let read_only = matches!(
            payload.action,
            PostbackAction::ShowDetail | PostbackAction::Discard
        );
        if !read_only && found.status != DraftStatus::Analyzed {
            return Ok(vec![messages::confirm_view(&found)]);
        }

        match payload.action {
            PostbackAction::ShowDetail => Ok(vec![messages::confirm_view(&found)]),

            PostbackAction::RegisterExpenditure => self.commit(found, false).await,
            PostbackAction::RegisterOnlyTotal => self.commit(found, true).await,

            PostbackAction::Discard => {
                draft::delete_draft(&self.db, &found.id).await?;
                Ok(vec![messages::discarded()])
            }

            PostbackAction::ChangeClassification => {
                let groups = classification::grouped_by_major(&self.db).await?;
                Ok(vec![messages::classification_picker(&found.id, &groups)])
            }
            PostbackAction::ChangeForWhom => {
                let users = user::list_registered_users(&self.db).await?;
                Ok(vec![messages::for_whom_picker(&found.id, &users)])
            }
            PostbackAction::ChangePayer => {
                let users = user::list_registered_users(&self.db).await?;
                Ok(vec![messages::payer_picker(&found.id, &users)])
            }
            PostbackAction::ChangePaymentMethod => {
                Ok(vec![messages::payment_method_picker(&found.id)])
            }

            PostbackAction::UpdateClassification => {
                let Some(minor) = payload.updated_item else {
                    return Ok(vec![messages::not_understood()]);
                };
                let major = classification::get_major(&self.db, &minor).await?;
                self.patched(&found.id, draft::DraftPatch::Classification { minor, major })
                    .await
            }
            PostbackAction::UpdateForWhom => {
                let Some(for_whom) = payload.updated_item else {
                    return Ok(vec![messages::not_understood()]);
                };
                self.patched(&found.id, draft::DraftPatch::ForWhom(for_whom))
                    .await
            }
            PostbackAction::UpdatePayer => {
                let Some(payer) = payload.updated_item else {
                    return Ok(vec![messages::not_understood()]);
                };
                self.patched(&found.id, draft::DraftPatch::Payer(payer)).await
            }
            PostbackAction::UpdatePaymentMethod => {
                let Some(key) = payload.updated_item else {
                    return Ok(vec![messages::not_understood()]);
                };
                let method =
                    PaymentMethod::from_key(&key).ok_or(Error::UnknownPaymentMethod {
                        value: key.clone(),
                    })?;
                self.patched(&found.id, draft::DraftPatch::PaymentMethod(method))
                    .await
            }
            PostbackAction::UpdateDate => {
                let Some(raw) = picked_date else {
                    return Ok(vec![messages::not_understood()]);
                };
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    Error::InvalidDate {
                        value: raw.to_string(),
                    }
                })?;
                self.patched(&found.id, draft::DraftPatch::Date(date)).await
            }
        }
    }

    async fn patched(&self, id: &str, patch: draft::DraftPatch) -> Result<Vec<Message>> {
        match draft::apply_patch(&self.db, id, patch).await? {
            Some(updated) => Ok(vec![messages::confirm_view(&updated)]),
            None => Ok(vec![messages::not_found()]),
        }
    }

    /// Appends the draft to the household ledger and removes it.
    async fn commit(&self, found: DraftModel, total_only: bool) -> Result<Vec<Message>> {
        let mut rows = ledger_rows(&found.data, total_only);
        if rows.is_empty() {
            return Ok(vec![messages::confirm_view(&found)]);
        }
        if total_only {
            self.ledger.append_total_only_row(rows.remove(0)).await?;
        } else {
            self.ledger.append_rows(rows).await?;
        }
        draft::delete_draft(&self.db, &found.id).await?;
        info!(draft = %found.id, total_only, "expenditure registered");
        Ok(vec![messages::registered()])
    }
}

/// Ledger row layout: date, store, item, price, major, minor, payer,
/// for whom, payment method, remarks.
fn ledger_rows(data: &ExpenditureData, total_only: bool) -> Vec<Vec<String>> {
    let date = data.date.map_or_else(String::new, |d| d.to_string());
    let row = |name: &str, price: i64, remarks: &str| {
        vec![
            date.clone(),
            data.store.clone(),
            name.to_string(),
            price.to_string(),
            data.major_classification.clone(),
            data.minor_classification.clone(),
            data.payer.clone(),
            data.for_whom.clone(),
            data.payment_method.label().to_string(),
            remarks.to_string(),
        ]
    };

    if total_only {
        return match data.total {
            Some(total) => vec![row("total", total, "via LINE.")],
            None => Vec::new(),
        };
    }
    data.items
        .iter()
        .map(|item| row(&item.name, item.price, &item.remarks))
        .collect()
}
