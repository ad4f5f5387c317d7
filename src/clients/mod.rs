//! Clients for the external collaborators: the messaging platform, the
//! receipt OCR service, the household ledger, and the analysis job queue.
//!
//! Each collaborator is a trait so the dialog and worker logic can be tested
//! against in-memory fakes.

pub mod ledger;
pub mod line;
pub mod ocr;
pub mod queue;

use crate::core::receipt::ReceiptResult;
use crate::errors::Result;
use crate::messages::Message;
use async_trait::async_trait;

/// A messaging platform user profile.
#[derive(Clone, Debug)]
pub struct Profile {
    pub display_name: String,
}

/// Messaging platform operations.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Downloads the binary content of a received image.
    async fn fetch_image(&self, line_image_id: &str) -> Result<Vec<u8>>;

    /// Fetches the profile of a user who follows the bot.
    async fn fetch_profile(&self, line_user_id: &str) -> Result<Profile>;

    /// Pushes messages to a user outside any reply window.
    async fn push_message(&self, line_user_id: &str, messages: Vec<Message>) -> Result<()>;

    /// Replies to a webhook event within its reply window.
    async fn reply_message(&self, reply_token: &str, messages: Vec<Message>) -> Result<()>;

    /// Shows a typing/loading indicator in the chat.
    async fn show_loading(&self, line_user_id: &str) -> Result<()>;
}

/// Receipt image analysis. Returns one result per receipt found in the
/// image; an empty list means the image is not a readable receipt.
#[async_trait]
pub trait ReceiptAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8]) -> Result<Vec<ReceiptResult>>;
}

/// Destination spreadsheet for committed expenditures.
#[async_trait]
pub trait LedgerSink: Send + Sync {
    /// Appends one row per receipt item.
    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()>;

    /// Appends a single summary row carrying only the receipt total.
    async fn append_total_only_row(&self, row: Vec<String>) -> Result<()> {
        self.append_rows(vec![row]).await
    }
}

/// Queue of pending analysis jobs, keyed by draft id.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, draft_id: &str) -> Result<()>;
}
