//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables
//! are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Also seeds the classification
//! reference table from configuration on first run.

use crate::config::classifications::ClassificationConfig;
use crate::entities::{
    BatchImage, Classification, DraftExpenditure, ImageBatch, Job, Session, User, classification,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, Schema, Set,
};
use tracing::info;

/// Establishes a connection to the database.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions. Existing tables are left
/// untouched, so this is safe to run on every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let statements = [
        schema.create_table_from_entity(DraftExpenditure),
        schema.create_table_from_entity(ImageBatch),
        schema.create_table_from_entity(BatchImage),
        schema.create_table_from_entity(Session),
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Classification),
        schema.create_table_from_entity(Job),
    ];
    for mut statement in statements {
        db.execute(builder.build(statement.if_not_exists())).await?;
    }

    Ok(())
}

/// Seeds the classification table from configuration if it is empty.
pub async fn seed_classifications(
    db: &DatabaseConnection,
    entries: &[ClassificationConfig],
) -> Result<()> {
    if Classification::find().count(db).await? > 0 {
        return Ok(());
    }

    let models: Vec<classification::ActiveModel> = entries
        .iter()
        .map(|entry| classification::ActiveModel {
            minor: Set(entry.minor.clone()),
            major: Set(entry.major.clone()),
            color: Set(entry.color.clone()),
        })
        .collect();
    let count = models.len();
    if count > 0 {
        Classification::insert_many(models).exec(db).await?;
    }
    info!("Seeded {count} classification entries.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ClassificationModel;
    use sea_orm::EntityTrait;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Tables exist if querying them succeeds
        let _ = DraftExpenditure::find().all(&db).await?;
        let _ = ImageBatch::find().all(&db).await?;
        let _ = BatchImage::find().all(&db).await?;
        let _ = Session::find().all(&db).await?;
        let _ = User::find().all(&db).await?;
        let _: Vec<ClassificationModel> = Classification::find().all(&db).await?;
        let _ = Job::find().all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_classifications_once() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let entries = vec![
            ClassificationConfig {
                minor: "groceries".to_string(),
                major: "living".to_string(),
                color: "#1DB446".to_string(),
            },
            ClassificationConfig {
                minor: "snacks".to_string(),
                major: "leisure".to_string(),
                color: "#FF6B35".to_string(),
            },
        ];
        seed_classifications(&db, &entries).await?;
        assert_eq!(Classification::find().count(&db).await?, 2);

        // A second run must not duplicate entries
        seed_classifications(&db, &entries).await?;
        assert_eq!(Classification::find().count(&db).await?, 2);

        Ok(())
    }
}
