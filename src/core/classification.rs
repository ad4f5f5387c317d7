//! Expense classification lookups.

use crate::entities::{Classification, ClassificationModel};
use crate::errors::{Error, Result};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Major category for a minor classification.
pub async fn get_major(db: &DatabaseConnection, minor: &str) -> Result<String> {
    Classification::find_by_id(minor)
        .one(db)
        .await?
        .map(|c| c.major)
        .ok_or_else(|| Error::ClassificationNotFound {
            minor: minor.to_string(),
        })
}

/// All classifications grouped by major category, in insertion order of
/// first appearance. Drives the category picker layout.
pub async fn grouped_by_major(
    db: &DatabaseConnection,
) -> Result<Vec<(String, Vec<ClassificationModel>)>> {
    let mut groups: Vec<(String, Vec<ClassificationModel>)> = Vec::new();
    for classification in Classification::find().all(db).await? {
        match groups.iter_mut().find(|(major, _)| *major == classification.major) {
            Some((_, members)) => members.push(classification),
            None => groups.push((classification.major.clone(), vec![classification])),
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_get_major() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_classifications(&db).await?;

        assert_eq!(get_major(&db, "groceries").await?, "living");
        assert!(matches!(
            get_major(&db, "no-such-category").await,
            Err(Error::ClassificationNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_major_unseeded_table() -> Result<()> {
        // Lookup before any seed ran
        let db = setup_test_db().await?;

        let result = get_major(&db, "groceries").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ClassificationNotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_grouped_by_major() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_classifications(&db).await?;

        let groups = grouped_by_major(&db).await?;
        assert_eq!(groups.len(), 2);
        let (major, members) = &groups[0];
        assert_eq!(major, "living");
        assert!(members.iter().any(|c| c.minor == "groceries"));
        Ok(())
    }
}
