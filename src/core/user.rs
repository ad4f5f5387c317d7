//! Household member business logic.
//!
//! A user appears when they follow the bot and becomes "registered" once
//! they have chosen a household name. Only registered users show up in the
//! payer picker.

use crate::entities::{User, UserColumn, UserModel, user};
use crate::errors::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Records a (re-)follow. The platform display name is refreshed; the chosen
/// household name, if any, is preserved.
pub async fn upsert_on_follow(
    db: &DatabaseConnection,
    line_user_id: &str,
    line_name: &str,
) -> Result<()> {
    match User::find_by_id(line_user_id).one(db).await? {
        Some(_) => {
            user::ActiveModel {
                line_user_id: Set(line_user_id.to_string()),
                line_name: Set(line_name.to_string()),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
        None => {
            user::ActiveModel {
                line_user_id: Set(line_user_id.to_string()),
                line_name: Set(line_name.to_string()),
                name: Set(String::new()),
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

/// Sets the user's chosen household name, completing registration. Upserts:
/// a user without a directory row (follow event lost) still registers.
pub async fn set_chosen_name(db: &DatabaseConnection, line_user_id: &str, name: &str) -> Result<()> {
    match User::find_by_id(line_user_id).one(db).await? {
        Some(_) => {
            user::ActiveModel {
                line_user_id: Set(line_user_id.to_string()),
                name: Set(name.to_string()),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
        None => {
            user::ActiveModel {
                line_user_id: Set(line_user_id.to_string()),
                line_name: Set(String::new()),
                name: Set(name.to_string()),
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

pub async fn get_user(db: &DatabaseConnection, line_user_id: &str) -> Result<Option<UserModel>> {
    Ok(User::find_by_id(line_user_id).one(db).await?)
}

/// All users who completed registration, for the payer picker.
pub async fn list_registered_users(db: &DatabaseConnection) -> Result<Vec<UserModel>> {
    Ok(User::find()
        .filter(UserColumn::Name.ne(""))
        .all(db)
        .await?)
}

/// Name to record as payer for a user: chosen household name when set,
/// platform display name otherwise, empty for unknown users.
pub async fn payer_name(db: &DatabaseConnection, line_user_id: &str) -> Result<String> {
    Ok(match get_user(db, line_user_id).await? {
        Some(user) if !user.name.is_empty() => user.name,
        Some(user) => user.line_name,
        None => String::new(),
    })
}
