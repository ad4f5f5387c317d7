//! Receipt analysis worker - consumes queued jobs, runs OCR, and notifies
//! the user when a submission (single image or full batch) has resolved.
//!
//! `process` reports whether the job may be acknowledged. A job for a draft
//! that no longer exists is acknowledged without work, so queue redelivery
//! after a crash never double-analyzes. Notification pushes are best-effort:
//! the draft state is already committed when they fire.

use crate::clients::{MessagingClient, ReceiptAnalyzer};
use crate::core::{batch, draft};
use crate::entities::{DraftModel, DraftStatus};
use crate::errors::Result;
use crate::messages::{self, Message};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct AnalysisWorker {
    db: DatabaseConnection,
    messaging: Arc<dyn MessagingClient>,
    analyzer: Arc<dyn ReceiptAnalyzer>,
}

impl AnalysisWorker {
    pub fn new(
        db: DatabaseConnection,
        messaging: Arc<dyn MessagingClient>,
        analyzer: Arc<dyn ReceiptAnalyzer>,
    ) -> Self {
        Self {
            db,
            messaging,
            analyzer,
        }
    }

    /// Runs one analysis job. Returns `true` when the job is finished and
    /// may be acknowledged, `false` when it should be redelivered.
    pub async fn process(&self, draft_id: &str) -> bool {
        match self.run(draft_id).await {
            Ok(()) => true,
            Err(err) => {
                error!(draft = draft_id, error = %err, "analysis job failed");
                false
            }
        }
    }

    async fn run(&self, draft_id: &str) -> Result<()> {
        let Some(found) = draft::get_draft(&self.db, draft_id).await? else {
            info!(draft = draft_id, "job for absent draft, nothing to do");
            return Ok(());
        };

        let image = self.messaging.fetch_image(&found.line_image_id).await?;
        let results = self.analyzer.analyze(&image).await?;

        let (status, notification) = if results.is_empty() {
            draft::update_analysis_failure(&self.db, draft_id).await?;
            (DraftStatus::InvalidImage, messages::analysis_failed(draft_id))
        } else {
            let extras = &results[1..];
            let updated = draft::update_analysis_success(
                &self.db,
                draft_id,
                &results[0],
                extras.len() as u32,
            )
            .await?;
            if let Some(updated) = &updated {
                self.spawn_siblings(updated, extras).await?;
            }
            (
                DraftStatus::Analyzed,
                messages::analysis_complete(draft_id, results.len()),
            )
        };

        match &found.image_set_id {
            Some(image_set_id) => {
                self.reconcile_batch(&found, image_set_id, status, notification)
                    .await
            }
            None => {
                self.notify(&found.line_user_id, notification).await;
                Ok(())
            }
        }
    }

    /// Additional receipts found in the same image become independent
    /// drafts, already analyzed and ready for review.
    async fn spawn_siblings(
        &self,
        base: &DraftModel,
        extras: &[crate::core::receipt::ReceiptResult],
    ) -> Result<()> {
        if extras.is_empty() {
            return Ok(());
        }
        let siblings = extras
            .iter()
            .map(|result| draft::sibling_draft(base, result))
            .collect();
        draft::create_drafts(&self.db, siblings).await
    }

    /// Folds this image's outcome into its batch and sends the single
    /// aggregated notification if this worker resolved the batch and won
    /// the claim.
    async fn reconcile_batch(
        &self,
        found: &DraftModel,
        image_set_id: &str,
        status: DraftStatus,
        notification: Message,
    ) -> Result<()> {
        batch::update_entry_status(&self.db, &found.line_image_id, status).await?;

        let aggregate = match batch::aggregate_status(&self.db, image_set_id).await? {
            // Tracker already claimed or expired
            None => return Ok(()),
            Some(DraftStatus::Analyzing | DraftStatus::New) => return Ok(()),
            Some(resolved) => resolved,
        };
        if !batch::claim_batch(&self.db, image_set_id).await? {
            return Ok(());
        }

        let message = if aggregate == DraftStatus::InvalidImage {
            messages::analysis_failed(&found.id)
        } else {
            notification
        };
        self.notify(&found.line_user_id, message).await;
        Ok(())
    }

    async fn notify(&self, line_user_id: &str, message: Message) {
        if let Err(err) = self
            .messaging
            .push_message(line_user_id, vec![message])
            .await
        {
            warn!(user = line_user_id, error = %err, "result notification failed");
        }
    }
}
