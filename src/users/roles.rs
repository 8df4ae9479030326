//! Role assignment.
//!
//! A one-to-one mapping from user to course role, stored as a field on
//! the user record. No cross-validation happens here; composing the role
//! with group membership (administrators, category moderators) is the
//! privilege resolver's job.

use uuid::Uuid;

use super::error::UserResult;
use super::types::Role;
use super::{get_user_field, set_user_field};
use crate::state::Forum;

/// Assign a role to a user, replacing any previous role. Idempotent.
#[tracing::instrument(skip(forum))]
pub async fn assign_role(forum: &Forum, uid: Uuid, role: Role) -> UserResult<()> {
    set_user_field(forum, uid, "role", role.as_str()).await?;
    tracing::debug!(%uid, role = %role, "role assigned");
    Ok(())
}

/// Read a user's role, if one has been assigned.
pub async fn get_role(forum: &Forum, uid: Uuid) -> UserResult<Option<Role>> {
    Ok(get_user_field(forum, uid, "role")
        .await?
        .and_then(|v| v.parse().ok()))
}
