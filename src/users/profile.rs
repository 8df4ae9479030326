//! Profile update coordinator.
//!
//! Runs every validator before any field is written, then fans out the
//! per-field update routines. Username, email, and fullname maintain
//! secondary lookup indexes (`{field}:uid` value maps and case-normalized
//! `{field}:sorted` sets with `value:uid` members); the remove-then-add
//! sequence over those indexes is deliberately non-atomic.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl};

use super::error::{MinRepSetting, UserError, UserResult};
use super::types::ProfileData;
use super::{fields, get_reputation, get_user_field, get_user_fields, set_user_field,
    set_user_fields};
use crate::groups;
use crate::state::Forum;
use crate::store::Store;
use crate::util::{is_username_valid, slugify};

/// Built-in updatable profile fields, in update order.
const BUILT_IN_FIELDS: [&str; 7] = [
    "username",
    "email",
    "fullname",
    "group_title",
    "birthday",
    "signature",
    "aboutme",
];

/// Update a user's profile.
///
/// The updatable field set is the built-ins plus configured custom fields
/// plus `extra_fields`, adjusted by the `filter:user.update_profile`
/// hook. All validation completes before the first write; the first
/// failed validator aborts the whole update.
#[tracing::instrument(skip(forum, data, extra_fields))]
pub async fn update_profile(
    forum: &Forum,
    caller_uid: Uuid,
    data: ProfileData,
    extra_fields: &[String],
) -> UserResult<HashMap<String, String>> {
    let mut field_set: Vec<String> = BUILT_IN_FIELDS.iter().map(|f| f.to_string()).collect();
    field_set.extend(fields::custom_field_keys(forum).await?);
    for extra in extra_fields {
        if !field_set.contains(extra) {
            field_set.push(extra.clone());
        }
    }

    let update_uid = data.uid.ok_or(UserError::InvalidUpdateUid)?;

    let payload = forum
        .hooks
        .fire_filter(
            "filter:user.update_profile",
            json!({ "uid": caller_uid, "data": data, "fields": field_set }),
        )
        .await?;
    let mut data: ProfileData = from_payload(&payload, "data")?;
    let field_set: Vec<String> = from_payload(&payload, "fields")?;

    validate_data(forum, caller_uid, &mut data).await?;

    let field_refs: Vec<&str> = field_set.iter().map(String::as_str).collect();
    let old_data = get_user_fields(forum, update_uid, &field_refs).await?;

    let mut batched = HashMap::new();
    for field in &field_set {
        if let Some(value) = data.get(field) {
            if !matches!(field.as_str(), "username" | "email" | "fullname") {
                batched.insert(field.clone(), value.trim().to_string());
            }
        }
    }

    let submitted = |field: &str| -> Option<&str> {
        if field_set.iter().any(|f| f == field) {
            data.get(field).map(str::trim)
        } else {
            None
        }
    };

    // Independent per-field routines run concurrently; the batched write
    // covers everything without its own index.
    futures::try_join!(
        async {
            match submitted("email") {
                Some(email) => update_email(forum, update_uid, email).await,
                None => Ok(()),
            }
        },
        async {
            match submitted("username") {
                Some(username) => update_username(forum, update_uid, username).await,
                None => Ok(()),
            }
        },
        async {
            match submitted("fullname") {
                Some(fullname) => update_fullname(forum, update_uid, fullname).await,
                None => Ok(()),
            }
        },
    )?;

    if !batched.is_empty() {
        set_user_fields(forum, update_uid, &batched).await?;
    }

    forum
        .hooks
        .fire_action(
            "action:user.update_profile",
            json!({
                "uid": caller_uid,
                "data": data,
                "fields": field_set,
                "old_data": old_data,
            }),
        )
        .await;

    get_user_fields(forum, update_uid, &["username", "userslug", "email", "fullname"]).await
}

fn from_payload<T: serde::de::DeserializeOwned>(payload: &Value, key: &str) -> UserResult<T> {
    serde_json::from_value(payload[key].clone()).map_err(|e| UserError::Hook(e.into()))
}

async fn validate_data(forum: &Forum, caller_uid: Uuid, data: &mut ProfileData) -> UserResult<()> {
    let update_uid = data.uid.ok_or(UserError::InvalidUpdateUid)?;

    is_email_valid(data)?;
    if let Some(username) = data.get("username") {
        if !username.is_empty() {
            is_username_available(forum, username, Some(update_uid)).await?;
        }
    }
    is_aboutme_valid(forum, caller_uid, data).await?;
    is_signature_valid(forum, caller_uid, data).await?;
    is_fullname_valid(data)?;
    is_birthday_valid(data)?;
    is_group_title_valid(data, forum.config.allow_multiple_badges)?;

    let definitions = fields::load_custom_fields(forum).await?;
    let reputation = get_reputation(forum, update_uid).await?;
    fields::validate_fields(
        &definitions,
        data,
        reputation,
        forum.config.reputation_disabled,
    )
}

fn is_email_valid(data: &ProfileData) -> UserResult<()> {
    match data.get("email").map(str::trim) {
        None | Some("") => Ok(()),
        Some(email) if email.validate_email() => Ok(()),
        Some(_) => Err(UserError::InvalidEmail),
    }
}

/// Check that a username is legal and unclaimed.
///
/// When `uid` is given (a rename), an unchanged username or slug
/// short-circuits success.
pub async fn is_username_available(
    forum: &Forum,
    username: &str,
    uid: Option<Uuid>,
) -> UserResult<()> {
    let username = username.trim();

    let mut current = HashMap::new();
    if let Some(uid) = uid {
        current = get_user_fields(forum, uid, &["username", "userslug"]).await?;
        if current.get("username").map(String::as_str) == Some(username) {
            return Ok(());
        }
    }

    if username.chars().count() < forum.config.minimum_username_length {
        return Err(UserError::UsernameTooShort {
            minimum: forum.config.minimum_username_length,
        });
    }
    if username.chars().count() > forum.config.maximum_username_length {
        return Err(UserError::UsernameTooLong {
            maximum: forum.config.maximum_username_length,
        });
    }

    let userslug = slugify(username);
    if !is_username_valid(username) || userslug.is_empty() {
        return Err(UserError::InvalidUsername);
    }

    if uid.is_some() && current.get("userslug").map(String::as_str) == Some(userslug.as_str()) {
        return Ok(());
    }
    if super::exists_by_slug(forum, &userslug).await? {
        return Err(UserError::UsernameTaken);
    }

    let result = forum
        .hooks
        .fire_filter(
            "filter:username.check",
            json!({ "username": username, "error": Value::Null }),
        )
        .await?;
    if let Some(code) = result["error"].as_str() {
        return Err(UserError::UsernameVetoed(code.to_string()));
    }
    Ok(())
}

/// Check a username for legality and availability without a target user.
pub async fn check_username(forum: &Forum, username: &str) -> UserResult<()> {
    is_username_available(forum, username, None).await
}

async fn is_aboutme_valid(forum: &Forum, caller_uid: Uuid, data: &ProfileData) -> UserResult<()> {
    let Some(aboutme) = data.get("aboutme").filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    if aboutme.chars().count() > forum.config.maximum_about_me_length {
        return Err(UserError::AboutMeTooLong {
            maximum: forum.config.maximum_about_me_length,
        });
    }
    let update_uid = data.uid.ok_or(UserError::InvalidUpdateUid)?;
    check_min_reputation(forum, caller_uid, update_uid, MinRepSetting::AboutMe).await
}

async fn is_signature_valid(forum: &Forum, caller_uid: Uuid, data: &ProfileData) -> UserResult<()> {
    let Some(signature) = data.get("signature").filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    let normalized = signature.replace("\r\n", "\n");
    if normalized.chars().count() > forum.config.maximum_signature_length {
        return Err(UserError::SignatureTooLong {
            maximum: forum.config.maximum_signature_length,
        });
    }
    let update_uid = data.uid.ok_or(UserError::InvalidUpdateUid)?;
    check_min_reputation(forum, caller_uid, update_uid, MinRepSetting::Signature).await
}

fn is_fullname_valid(data: &ProfileData) -> UserResult<()> {
    let Some(fullname) = data.get("fullname").filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    if fullname.validate_url() || fullname.chars().count() > 255 {
        return Err(UserError::InvalidFullname);
    }
    Ok(())
}

fn is_birthday_valid(data: &ProfileData) -> UserResult<()> {
    let Some(birthday) = data.get("birthday").filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    if formats
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(birthday, fmt).is_ok())
    {
        Ok(())
    } else {
        Err(UserError::InvalidBirthday)
    }
}

fn is_group_title_valid(data: &mut ProfileData, allow_multiple_badges: bool) -> UserResult<()> {
    let Some(group_title) = data.get("group_title").filter(|v| !v.is_empty()) else {
        return Ok(());
    };

    let check_title = |title: &str| -> UserResult<()> {
        if title == "registered-users" || groups::is_privilege_group(title) {
            return Err(UserError::InvalidGroupTitle);
        }
        Ok(())
    };

    let titles: Vec<String> = match serde_json::from_str::<Value>(group_title) {
        Ok(Value::Array(items)) => {
            let mut titles = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(title) => titles.push(title),
                    _ => return Err(UserError::InvalidGroupTitle),
                }
            }
            titles
        }
        Ok(_) => return Err(UserError::InvalidGroupTitle),
        Err(_) => vec![group_title.to_string()],
    };

    for title in &titles {
        check_title(title)?;
    }

    if !allow_multiple_badges && titles.len() > 1 {
        let collapsed =
            serde_json::to_string(&titles[0]).map_err(|e| UserError::Hook(e.into()))?;
        data.fields.insert("group_title".into(), collapsed);
    }
    Ok(())
}

/// Enforce a minimum-reputation setting for a self-edit. Edits performed
/// on someone else's behalf (admin flows) skip the check, as does a
/// disabled reputation system.
pub async fn check_min_reputation(
    forum: &Forum,
    caller_uid: Uuid,
    uid: Uuid,
    setting: MinRepSetting,
) -> UserResult<()> {
    let is_self = caller_uid == uid;
    if !is_self || forum.config.reputation_disabled {
        return Ok(());
    }
    let required = match setting {
        MinRepSetting::AboutMe => forum.config.min_rep_aboutme,
        MinRepSetting::Signature => forum.config.min_rep_signature,
    };
    let reputation = get_reputation(forum, uid).await?;
    if reputation < required {
        return Err(UserError::NotEnoughReputation { setting, required });
    }
    Ok(())
}

/// Move a `value -> uid` lookup entry from `old_value` to `value`,
/// updating the user field alongside. No-ops when unchanged.
async fn update_uid_mapping(
    forum: &Forum,
    field: &str,
    uid: Uuid,
    value: &str,
    old_value: Option<&str>,
) -> UserResult<()> {
    if old_value == Some(value) {
        return Ok(());
    }
    let map_key = format!("{field}:uid");
    if let Some(old) = old_value.filter(|v| !v.is_empty()) {
        forum.store.delete_object_field(&map_key, old).await?;
    }
    set_user_field(forum, uid, field, value).await?;
    if !value.is_empty() {
        forum
            .store
            .set_object_field(&map_key, value, &uid.to_string())
            .await?;
    }
    Ok(())
}

async fn update_email(forum: &Forum, uid: Uuid, new_email: &str) -> UserResult<()> {
    let old_email = get_user_field(forum, uid, "email").await?.unwrap_or_default();
    if old_email == new_email {
        return Ok(());
    }

    update_uid_mapping(forum, "email", uid, new_email, Some(&old_email)).await?;

    if !old_email.is_empty() {
        forum
            .store
            .sorted_set_remove("email:sorted", &format!("{}:{uid}", old_email.to_lowercase()))
            .await?;
    }
    if !new_email.is_empty() {
        forum
            .store
            .sorted_set_add("email:sorted", 0, &format!("{}:{uid}", new_email.to_lowercase()))
            .await?;
    }
    Ok(())
}

async fn update_username(forum: &Forum, uid: Uuid, new_username: &str) -> UserResult<()> {
    if new_username.is_empty() {
        return Ok(());
    }
    let current = get_user_fields(forum, uid, &["username", "userslug"]).await?;
    let old_username = current.get("username").cloned().unwrap_or_default();
    if old_username == new_username {
        return Ok(());
    }

    let new_userslug = slugify(new_username);
    let old_userslug = current.get("userslug").cloned().unwrap_or_default();
    let now = Utc::now().timestamp_millis();

    futures::try_join!(
        update_uid_mapping(forum, "username", uid, new_username, Some(&old_username)),
        update_uid_mapping(forum, "userslug", uid, &new_userslug, Some(&old_userslug)),
        async {
            Ok(forum
                .store
                .sorted_set_add(
                    &format!("user:{uid}:usernames"),
                    now,
                    &format!("{new_username}:{now}"),
                )
                .await?)
        },
    )?;

    forum
        .store
        .sorted_set_remove(
            "username:sorted",
            &format!("{}:{uid}", old_username.to_lowercase()),
        )
        .await?;
    forum
        .store
        .sorted_set_add(
            "username:sorted",
            0,
            &format!("{}:{uid}", new_username.to_lowercase()),
        )
        .await?;
    Ok(())
}

async fn update_fullname(forum: &Forum, uid: Uuid, new_fullname: &str) -> UserResult<()> {
    let old_fullname = get_user_field(forum, uid, "fullname").await?.unwrap_or_default();
    update_uid_mapping(forum, "fullname", uid, new_fullname, Some(&old_fullname)).await?;

    if old_fullname != new_fullname {
        if !old_fullname.is_empty() {
            forum
                .store
                .sorted_set_remove(
                    "fullname:sorted",
                    &format!("{}:{uid}", old_fullname.to_lowercase()),
                )
                .await?;
        }
        if !new_fullname.is_empty() {
            forum
                .store
                .sorted_set_add(
                    "fullname:sorted",
                    0,
                    &format!("{}:{uid}", new_fullname.to_lowercase()),
                )
                .await?;
        }
    }
    Ok(())
}
