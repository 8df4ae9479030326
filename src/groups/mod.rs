//! Group membership.
//!
//! Groups are flat membership sets. Administrator status is membership of
//! the `administrators` group, deliberately orthogonal to the course role
//! on the user record.

use chrono::Utc;
use uuid::Uuid;

use crate::state::Forum;
use crate::store::{Store, StoreResult};

/// Name of the group whose members are administrators.
pub const ADMINISTRATORS: &str = "administrators";

fn members_key(group: &str) -> String {
    format!("group:{group}:members")
}

/// Add a user to a group. Idempotent.
#[tracing::instrument(skip(forum))]
pub async fn join(forum: &Forum, group: &str, uid: Uuid) -> StoreResult<()> {
    forum
        .store
        .sorted_set_add(
            &members_key(group),
            Utc::now().timestamp_millis(),
            &uid.to_string(),
        )
        .await
}

/// Remove a user from a group.
#[tracing::instrument(skip(forum))]
pub async fn leave(forum: &Forum, group: &str, uid: Uuid) -> StoreResult<()> {
    forum
        .store
        .sorted_set_remove(&members_key(group), &uid.to_string())
        .await
}

/// Whether a user belongs to a group.
pub async fn is_member(forum: &Forum, group: &str, uid: Uuid) -> StoreResult<bool> {
    forum
        .store
        .is_sorted_set_member(&members_key(group), &uid.to_string())
        .await
}

/// Whether a user is an administrator.
pub async fn is_administrator(forum: &Forum, uid: Uuid) -> StoreResult<bool> {
    is_member(forum, ADMINISTRATORS, uid).await
}

/// Whether a group name is an internal privilege group. Privilege groups
/// carry category grants and must never be worn as a badge.
pub fn is_privilege_group(name: &str) -> bool {
    name.starts_with("cid:")
}
