//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod batch_image;
pub mod classification;
pub mod draft_expenditure;
pub mod image_batch;
pub mod job;
pub mod session;
pub mod user;

// Re-export specific types to avoid conflicts
pub use batch_image::{Column as BatchImageColumn, Entity as BatchImage, Model as BatchImageModel};
pub use classification::{
    Column as ClassificationColumn, Entity as Classification, Model as ClassificationModel,
};
pub use draft_expenditure::{
    Column as DraftColumn, DraftStatus, Entity as DraftExpenditure, ExpenditureData,
    Model as DraftModel, PaymentMethod, ReceiptItem,
};
pub use image_batch::{Column as ImageBatchColumn, Entity as ImageBatch, Model as ImageBatchModel};
pub use job::{Column as JobColumn, Entity as Job, Model as JobModel};
pub use session::{Column as SessionColumn, Entity as Session, Model as SessionModel, SessionType};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};

/// Unix timestamp at which a record written now should expire.
pub fn ttl_timestamp(ttl_secs: i64) -> i64 {
    chrono::Utc::now().timestamp() + ttl_secs
}
