//! Identity resolution and privilege evaluation.

use uuid::Uuid;

use super::types::{CategoryPrivileges, DefaultPolicy, Identity, PrivilegeAction};
use crate::categories;
use crate::groups;
use crate::posts;
use crate::state::Forum;
use crate::store::{Store, StoreResult};
use crate::users::roles;

/// Resolve the capability record for a user in a category.
///
/// `uid = None` is the guest identity.
pub async fn resolve_identity(
    forum: &Forum,
    uid: Option<Uuid>,
    cid: Option<Uuid>,
) -> StoreResult<Identity> {
    let Some(uid) = uid else {
        return Ok(Identity::GUEST);
    };

    let role = roles::get_role(forum, uid).await.map_err(role_store_err)?;
    let is_admin = groups::is_administrator(forum, uid).await?;
    let is_moderator = match cid {
        Some(cid) => {
            forum
                .store
                .is_sorted_set_member(&categories::moderators_key(cid), &uid.to_string())
                .await?
        }
        None => false,
    };

    Ok(Identity {
        role,
        is_admin,
        is_moderator,
    })
}

fn role_store_err(err: crate::users::UserError) -> crate::store::StoreError {
    match err {
        crate::users::UserError::Store(e) => e,
        other => crate::store::StoreError::Backend(other.to_string()),
    }
}

/// Store a category's privilege configuration.
pub async fn set_category_privileges(
    forum: &Forum,
    cid: Uuid,
    privileges: &CategoryPrivileges,
) -> StoreResult<()> {
    let json = serde_json::to_string(privileges)
        .map_err(|e| crate::store::StoreError::Backend(e.to_string()))?;
    forum
        .store
        .set_object_field(&categories::category_key(cid), "privileges", &json)
        .await
}

/// Load a category's privilege configuration; unset categories are
/// general (allow by default).
pub async fn get_category_privileges(forum: &Forum, cid: Uuid) -> StoreResult<CategoryPrivileges> {
    let raw = forum
        .store
        .get_object_field(&categories::category_key(cid), "privileges")
        .await?;
    Ok(raw
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default())
}

/// Decide whether a user may perform an action in a category.
///
/// Administrators always pass. A configured grant is a role
/// set-membership test; an unconfigured action falls back to the
/// category's declared default policy.
#[tracing::instrument(skip(forum))]
pub async fn can(
    forum: &Forum,
    action: PrivilegeAction,
    cid: Uuid,
    uid: Option<Uuid>,
) -> StoreResult<bool> {
    let identity = resolve_identity(forum, uid, Some(cid)).await?;
    if identity.is_admin {
        return Ok(true);
    }

    let privileges = get_category_privileges(forum, cid).await?;
    Ok(match privileges.grant_for(action) {
        Some(granted_roles) => identity
            .role
            .is_some_and(|role| granted_roles.contains(&role)),
        None => privileges.default_policy == DefaultPolicy::Allow,
    })
}

/// Filter a candidate post-id list down to what a viewer may see.
///
/// Read-path authorization is silent: ids the viewer may not see are
/// removed, never reported. For each post the general category privilege
/// is checked first, then the post's restriction tag against the
/// viewer's role.
#[tracing::instrument(skip(forum, pids))]
pub async fn filter_pids(
    forum: &Forum,
    action: PrivilegeAction,
    pids: &[Uuid],
    uid: Option<Uuid>,
) -> StoreResult<Vec<Uuid>> {
    let mut visible = Vec::with_capacity(pids.len());
    for &pid in pids {
        let Some(post) = posts::get_post_data(forum, pid).await? else {
            continue;
        };
        if !can(forum, action, post.cid, uid).await? {
            continue;
        }
        let identity = resolve_identity(forum, uid, Some(post.cid)).await?;
        if identity.can_view(post.target_role) {
            visible.push(pid);
        }
    }
    Ok(visible)
}
