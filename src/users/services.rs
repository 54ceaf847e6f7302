use super::models::{self as users, User, UserCreate, UserUpdate};
use super::user_groups;
use crate::common::errors::{BusinessError, BusinessResult, DbErrorExt};
use crate::{not_found, validation_error};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::collections::HashMap;

pub fn hash_password(password: &str) -> BusinessResult<String> {
    if password.is_empty() {
        return Err(validation_error!("password", "must not be empty"));
    }
    hash(password, DEFAULT_COST).map_err(|e| BusinessError::InternalError {
        message: format!("Failed to hash password: {e}"),
    })
}

fn invalid_credentials() -> BusinessError {
    BusinessError::Unauthorized {
        message: "No active account found with the given credentials".to_string(),
    }
}

/// Checks a username/password pair and stamps `last_login` on success.
/// Inactive accounts are refused with the same message as a bad password.
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> BusinessResult<users::Model> {
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(|e| e.to_business_error("user"))?
        .ok_or_else(invalid_credentials)?;

    let matches = verify(password, &user.password_hash).unwrap_or(false);
    if !matches || !user.is_active {
        tracing::info!(username, "Rejected login");
        return Err(invalid_credentials());
    }

    let mut active: users::ActiveModel = user.into();
    active.last_login = Set(Some(Utc::now()));
    let user = active
        .update(db)
        .await
        .map_err(|e| e.to_business_error("user"))?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(user)
}

pub async fn find_user(db: &DatabaseConnection, id: i32) -> BusinessResult<users::Model> {
    users::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("user"))?
        .ok_or_else(|| not_found!("user", id))
}

pub async fn with_groups(
    db: &DatabaseConnection,
    models: Vec<users::Model>,
) -> BusinessResult<Vec<User>> {
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let mut memberships: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in user_groups::Entity::find()
        .filter(user_groups::Column::UserId.is_in(ids))
        .all(db)
        .await
        .map_err(|e| e.to_business_error("group"))?
    {
        memberships.entry(row.user_id).or_default().push(row.group_id);
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let mut groups = memberships.remove(&model.id).unwrap_or_default();
            groups.sort_unstable();
            User::build(model, groups)
        })
        .collect())
}

pub async fn load_user(db: &DatabaseConnection, id: i32) -> BusinessResult<User> {
    let model = find_user(db, id).await?;
    with_groups(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| not_found!("user", id))
}

async fn set_groups<C: ConnectionTrait>(db: &C, user_id: i32, groups: &[i32]) -> BusinessResult<()> {
    user_groups::Entity::delete_many()
        .filter(user_groups::Column::UserId.eq(user_id))
        .exec(db)
        .await
        .map_err(|e| e.to_business_error("group"))?;

    let mut unique = groups.to_vec();
    unique.sort_unstable();
    unique.dedup();

    for group_id in unique {
        user_groups::ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group_id),
        }
        .insert(db)
        .await
        .map_err(|e| e.to_business_error("group"))?;
    }
    Ok(())
}

pub async fn create_user(db: &DatabaseConnection, payload: UserCreate) -> BusinessResult<i32> {
    if payload.username.trim().is_empty() {
        return Err(validation_error!("username", "must not be empty"));
    }
    let password_hash = hash_password(&payload.password)?;

    let txn = db.begin().await.map_err(|e| e.to_business_error("user"))?;
    let user = users::ActiveModel {
        username: Set(payload.username.trim().to_string()),
        password_hash: Set(password_hash),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        email: Set(payload.email),
        is_active: Set(true),
        is_staff: Set(payload.is_staff),
        is_superuser: Set(false),
        date_joined: Set(Utc::now()),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| e.to_business_error("user"))?;

    set_groups(&txn, user.id, &payload.groups).await?;
    txn.commit().await.map_err(|e| e.to_business_error("user"))?;

    tracing::info!(user_id = user.id, username = %user.username, "Created user");
    Ok(user.id)
}

pub async fn update_user(db: &DatabaseConnection, id: i32, payload: UserUpdate) -> BusinessResult<()> {
    let existing = find_user(db, id).await?;
    let password_hash = payload.password.as_deref().map(hash_password).transpose()?;

    let txn = db.begin().await.map_err(|e| e.to_business_error("user"))?;
    let mut active: users::ActiveModel = existing.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(is_staff) = payload.is_staff {
        active.is_staff = Set(is_staff);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(password_hash) = password_hash {
        active.password_hash = Set(password_hash);
    }
    active
        .update(&txn)
        .await
        .map_err(|e| e.to_business_error("user"))?;

    if let Some(groups) = payload.groups {
        set_groups(&txn, id, &groups).await?;
    }
    txn.commit().await.map_err(|e| e.to_business_error("user"))?;
    Ok(())
}

/// Flips `is_active`. Staff cannot lock themselves out.
pub async fn toggle_active(db: &DatabaseConnection, id: i32, acting_user: i32) -> BusinessResult<()> {
    if id == acting_user {
        return Err(validation_error!("id", "you cannot deactivate your own account"));
    }
    let user = find_user(db, id).await?;
    let enabled = !user.is_active;

    let mut active: users::ActiveModel = user.into();
    active.is_active = Set(enabled);
    active
        .update(db)
        .await
        .map_err(|e| e.to_business_error("user"))?;

    tracing::info!(user_id = id, enabled, "Toggled user");
    Ok(())
}

pub async fn delete_user(db: &DatabaseConnection, id: i32, acting_user: i32) -> BusinessResult<()> {
    if id == acting_user {
        return Err(validation_error!("id", "you cannot delete your own account"));
    }
    let user = find_user(db, id).await?;

    let txn = db.begin().await.map_err(|e| e.to_business_error("user"))?;
    user_groups::Entity::delete_many()
        .filter(user_groups::Column::UserId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| e.to_business_error("group"))?;
    user.delete(&txn)
        .await
        .map_err(|e| e.to_business_error("user"))?;
    txn.commit().await.map_err(|e| e.to_business_error("user"))?;

    tracing::info!(user_id = id, "Deleted user");
    Ok(())
}

/// Creates an active staff superuser, as used by the command line.
pub async fn create_superuser(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> BusinessResult<users::Model> {
    let id = create_user(
        db,
        UserCreate {
            username: username.to_string(),
            password: password.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: email.unwrap_or_default().to_string(),
            is_staff: true,
            groups: Vec::new(),
        },
    )
    .await?;

    let mut active: users::ActiveModel = find_user(db, id).await?.into();
    active.is_superuser = Set(true);
    active
        .update(db)
        .await
        .map_err(|e| e.to_business_error("user"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_helpers::{create_test_user, setup_test_db};

    #[tokio::test]
    async fn test_authenticate_stamps_last_login() {
        let db = setup_test_db().await;
        create_test_user(&db, "agent", "motdepasse", false).await;

        let user = authenticate(&db, "agent", "motdepasse").await.unwrap();
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_password_and_inactive_users() {
        let db = setup_test_db().await;
        let user = create_test_user(&db, "agent", "motdepasse", false).await;

        assert!(matches!(
            authenticate(&db, "agent", "mauvais").await,
            Err(BusinessError::Unauthorized { .. })
        ));
        assert!(authenticate(&db, "inconnu", "motdepasse").await.is_err());

        toggle_active(&db, user.id, 0).await.unwrap();
        assert!(matches!(
            authenticate(&db, "agent", "motdepasse").await,
            Err(BusinessError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_superuser_is_staff() {
        let db = setup_test_db().await;
        let admin = create_superuser(&db, "admin", "secret", Some("admin@example.cd"))
            .await
            .unwrap();

        assert!(admin.is_staff && admin.is_superuser && admin.is_active);
        assert_eq!(admin.email, "admin@example.cd");
        assert!(authenticate(&db, "admin", "secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_staff_cannot_remove_own_account() {
        let db = setup_test_db().await;
        let user = create_test_user(&db, "chef", "motdepasse", true).await;

        assert!(toggle_active(&db, user.id, user.id).await.is_err());
        assert!(delete_user(&db, user.id, user.id).await.is_err());
        assert!(find_user(&db, user.id).await.unwrap().is_active);
    }

    #[test]
    fn test_empty_password_is_rejected() {
        assert!(hash_password("").is_err());
    }
}
