//! Shared helpers and in-memory fakes for tests.
#![allow(clippy::unwrap_used)]

use crate::clients::{JobQueue, LedgerSink, MessagingClient, Profile, ReceiptAnalyzer};
use crate::config::database::create_tables;
use crate::core::draft;
use crate::core::receipt::ReceiptResult;
use crate::entities::{Classification, DraftModel, DraftStatus, ExpenditureData, classification};
use crate::errors::{Error, Result};
use crate::messages::Message;
use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use std::sync::{Arc, Mutex};

/// Fresh in-memory database with all tables created.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Inserts a default draft in `Analyzing` status for the given user.
pub async fn create_test_draft(db: &DatabaseConnection, line_user_id: &str) -> Result<DraftModel> {
    draft::create_draft(
        db,
        draft::new_draft(
            line_user_id,
            "img1",
            DraftStatus::Analyzing,
            ExpenditureData::default(),
            None,
        ),
    )
    .await
}

/// Seeds a small classification table: two majors, a few minors each.
pub async fn seed_test_classifications(db: &DatabaseConnection) -> Result<()> {
    let rows = [
        ("groceries", "living", "#1f9d55"),
        ("daily necessities", "living", "#3490dc"),
        ("eating out", "leisure", "#e3342f"),
        ("social", "leisure", "#f6993f"),
    ]
    .into_iter()
    .map(|(minor, major, color)| classification::ActiveModel {
        minor: Set(minor.to_string()),
        major: Set(major.to_string()),
        color: Set(color.to_string()),
    });
    Classification::insert_many(rows).exec(db).await?;
    Ok(())
}

/// Bundle of fakes for one test, each shared behind an `Arc` so both the
/// test and the code under test see the same recorded state.
pub struct TestFakes {
    pub messaging: Arc<FakeMessaging>,
    pub ledger: Arc<FakeLedger>,
    pub queue: Arc<FakeQueue>,
    pub analyzer: Arc<FakeAnalyzer>,
}

impl TestFakes {
    pub fn new() -> Self {
        Self {
            messaging: Arc::new(FakeMessaging::default()),
            ledger: Arc::new(FakeLedger::default()),
            queue: Arc::new(FakeQueue::default()),
            analyzer: Arc::new(FakeAnalyzer::default()),
        }
    }
}

impl Default for TestFakes {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct FakeMessaging {
    pushes: Mutex<Vec<(String, String)>>,
    replies: Mutex<Vec<(String, String)>>,
    fail_pushes: Mutex<bool>,
}

impl FakeMessaging {
    /// Recorded pushes as `(user id, serialized messages)` pairs.
    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn fail_pushes(&self) {
        *self.fail_pushes.lock().unwrap() = true;
    }
}

#[async_trait]
impl MessagingClient for FakeMessaging {
    async fn fetch_image(&self, _line_image_id: &str) -> Result<Vec<u8>> {
        Ok(vec![0u8; 4])
    }

    async fn fetch_profile(&self, _line_user_id: &str) -> Result<Profile> {
        Ok(Profile {
            display_name: "Test User".to_string(),
        })
    }

    async fn push_message(&self, line_user_id: &str, messages: Vec<Message>) -> Result<()> {
        if *self.fail_pushes.lock().unwrap() {
            return Err(Error::external("messaging", "push rejected"));
        }
        let rendered = serde_json::to_string(&messages)?;
        self.pushes
            .lock()
            .unwrap()
            .push((line_user_id.to_string(), rendered));
        Ok(())
    }

    async fn reply_message(&self, reply_token: &str, messages: Vec<Message>) -> Result<()> {
        let rendered = serde_json::to_string(&messages)?;
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), rendered));
        Ok(())
    }

    async fn show_loading(&self, _line_user_id: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeLedger {
    rows: Mutex<Vec<Vec<String>>>,
}

impl FakeLedger {
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerSink for FakeLedger {
    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
        self.rows.lock().unwrap().extend(rows);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeQueue {
    enqueued: Mutex<Vec<String>>,
}

impl FakeQueue {
    pub fn enqueued(&self) -> Vec<String> {
        self.enqueued.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for FakeQueue {
    async fn enqueue(&self, draft_id: &str) -> Result<()> {
        self.enqueued.lock().unwrap().push(draft_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAnalyzer {
    results: Mutex<Vec<ReceiptResult>>,
    fail: Mutex<bool>,
}

impl FakeAnalyzer {
    pub fn set_results(&self, results: Vec<ReceiptResult>) {
        *self.results.lock().unwrap() = results;
    }

    pub fn fail_next(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl ReceiptAnalyzer for FakeAnalyzer {
    async fn analyze(&self, _image: &[u8]) -> Result<Vec<ReceiptResult>> {
        if std::mem::take(&mut *self.fail.lock().unwrap()) {
            return Err(Error::external("ocr", "analysis unavailable"));
        }
        Ok(self.results.lock().unwrap().clone())
    }
}
