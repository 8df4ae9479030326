//! User accounts: creation, field access, roles, profile updates,
//! custom fields, and password changes.

pub mod error;
pub mod fields;
pub mod password;
pub mod profile;
pub mod roles;
pub mod types;

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::groups;
use crate::state::Forum;
use crate::store::Store;
use crate::util::slugify;

pub use error::{MinRepSetting, UserError, UserResult};
pub use fields::{CustomFieldDefinition, FieldType};
pub use types::{NewUser, ProfileData, Role};

pub(crate) fn user_key(uid: Uuid) -> String {
    format!("user:{uid}")
}

/// Create a user. Validates the username with the same rules as a
/// profile rename and registers the slug/username lookup indexes.
#[tracing::instrument(skip(forum, new_user), fields(username = %new_user.username))]
pub async fn create(forum: &Forum, new_user: NewUser) -> UserResult<Uuid> {
    let username = new_user.username.trim().to_string();
    profile::is_username_available(forum, &username, None).await?;

    let uid = Uuid::new_v4();
    let userslug = slugify(&username);
    let now = Utc::now().timestamp_millis();

    let mut user = HashMap::new();
    user.insert("uid".into(), uid.to_string());
    user.insert("username".into(), username.clone());
    user.insert("userslug".into(), userslug.clone());
    user.insert("joindate".into(), now.to_string());
    user.insert("reputation".into(), "0".into());
    user.insert("postcount".into(), "0".into());
    user.insert("lastposttime".into(), "0".into());
    if let Some(email) = &new_user.email {
        user.insert("email".into(), email.trim().to_string());
    }
    if let Some(password) = &new_user.password {
        user.insert("password".into(), password::hash_password(password)?);
    }
    forum.store.set_object(&user_key(uid), &user).await?;

    forum
        .store
        .set_object_field("username:uid", &username, &uid.to_string())
        .await?;
    forum
        .store
        .set_object_field("userslug:uid", &userslug, &uid.to_string())
        .await?;
    forum
        .store
        .sorted_set_add(
            "username:sorted",
            0,
            &format!("{}:{uid}", username.to_lowercase()),
        )
        .await?;
    forum
        .store
        .sorted_set_add("users:joindate", now, &uid.to_string())
        .await?;

    tracing::debug!(%uid, "user created");
    Ok(uid)
}

/// Read one field off a user record.
pub async fn get_user_field(forum: &Forum, uid: Uuid, field: &str) -> UserResult<Option<String>> {
    Ok(forum.store.get_object_field(&user_key(uid), field).await?)
}

/// Read several fields off a user record.
pub async fn get_user_fields(
    forum: &Forum,
    uid: Uuid,
    fields: &[&str],
) -> UserResult<HashMap<String, String>> {
    Ok(forum.store.get_object_fields(&user_key(uid), fields).await?)
}

/// Write one field on a user record.
pub async fn set_user_field(forum: &Forum, uid: Uuid, field: &str, value: &str) -> UserResult<()> {
    Ok(forum
        .store
        .set_object_field(&user_key(uid), field, value)
        .await?)
}

/// Write several fields on a user record in one call.
pub async fn set_user_fields(
    forum: &Forum,
    uid: Uuid,
    values: &HashMap<String, String>,
) -> UserResult<()> {
    Ok(forum.store.set_object(&user_key(uid), values).await?)
}

/// A user's reputation, defaulting to zero when unset.
pub async fn get_reputation(forum: &Forum, uid: Uuid) -> UserResult<i64> {
    Ok(get_user_field(forum, uid, "reputation")
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

/// Whether a user record exists for `uid`.
pub async fn exists(forum: &Forum, uid: Uuid) -> UserResult<bool> {
    Ok(forum.store.exists(&user_key(uid)).await?)
}

/// Whether a slug is already owned by some user.
pub async fn exists_by_slug(forum: &Forum, userslug: &str) -> UserResult<bool> {
    Ok(forum
        .store
        .get_object_field("userslug:uid", userslug)
        .await?
        .is_some())
}

/// Password change request.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    /// User whose password is being changed.
    pub uid: Uuid,
    /// New plaintext password.
    pub new_password: String,
    /// Current plaintext password; required for self-changes.
    pub current_password: Option<String>,
}

/// Change a user's password.
///
/// Admins may change anyone's password without the current one; everyone
/// else may only change their own, supplying the current password.
#[tracing::instrument(skip(forum, data), fields(target = %data.uid))]
pub async fn change_password(forum: &Forum, caller_uid: Uuid, data: PasswordChange) -> UserResult<()> {
    if data.new_password.chars().count() < forum.config.minimum_password_length {
        return Err(UserError::PasswordTooShort {
            minimum: forum.config.minimum_password_length,
        });
    }
    if !exists(forum, data.uid).await? {
        return Err(UserError::InvalidUid);
    }

    let is_admin = groups::is_administrator(forum, caller_uid).await?;
    let has_password = get_user_field(forum, data.uid, "password").await?.is_some();

    if forum.config.password_disable_edit && !is_admin {
        return Err(UserError::NoPrivileges);
    }

    let is_self = caller_uid == data.uid;
    if !is_admin && !is_self {
        return Err(UserError::ChangePasswordPrivileges);
    }

    forum
        .hooks
        .fire_filter(
            "filter:password.check",
            json!({ "password": data.new_password, "uid": data.uid }),
        )
        .await?;

    if is_self && has_password {
        let current = data.current_password.as_deref().unwrap_or("");
        let stored = get_user_field(forum, data.uid, "password")
            .await?
            .unwrap_or_default();
        if !password::verify_password(current, &stored)? {
            return Err(UserError::WrongCurrentPassword);
        }
        if current == data.new_password {
            return Err(UserError::SamePassword);
        }
    }

    let hashed = password::hash_password(&data.new_password)?;
    set_user_field(forum, data.uid, "password", &hashed).await?;
    forum
        .store
        .delete(&format!("uid:{}:sessions", data.uid))
        .await?;

    forum
        .hooks
        .fire_action(
            "action:password.change",
            json!({ "uid": caller_uid, "target_uid": data.uid }),
        )
        .await;
    Ok(())
}
