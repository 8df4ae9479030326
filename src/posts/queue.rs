//! Post-queue gate and posting throttle.
//!
//! The queue holds new posts for moderator review. Trust signals bypass
//! it: an assigned course role, administrator or moderator status, or
//! enough reputation. The gate is monotone: a role-bearing user is
//! never queued in a configuration where a guest would not be.

use chrono::Utc;
use uuid::Uuid;

use super::error::{PostError, PostResult};
use crate::categories;
use crate::privileges;
use crate::state::Forum;
use crate::store::StoreResult;
use crate::users;

/// Context of the post being gated.
#[derive(Debug, Clone, Copy)]
pub struct PostContext {
    /// Category the post lands in.
    pub cid: Uuid,
}

/// Decide whether a new post must be held for moderation.
#[tracing::instrument(skip(forum))]
pub async fn should_queue(
    forum: &Forum,
    uid: Option<Uuid>,
    context: PostContext,
) -> StoreResult<bool> {
    let queue_active = forum.config.post_queue
        || categories::post_queue_enabled(forum, context.cid).await?;
    if !queue_active {
        return Ok(false);
    }

    let Some(uid) = uid else {
        // Guests never carry a bypass signal.
        return Ok(true);
    };

    let identity = privileges::resolve_identity(forum, Some(uid), Some(context.cid)).await?;
    // Role assignment is itself a trust signal; check it before reputation
    // so the monotonicity property holds for zero-reputation role holders.
    if identity.role.is_some() || identity.can_moderate() {
        return Ok(false);
    }

    let reputation = users::get_reputation(forum, uid)
        .await
        .map_err(|e| crate::store::StoreError::Backend(e.to_string()))?;
    Ok(reputation < forum.config.post_queue_reputation_threshold)
}

/// Enforce the delay between consecutive posts. Role holders, admins,
/// and moderators are exempt.
#[tracing::instrument(skip(forum))]
pub async fn is_ready_to_post(forum: &Forum, uid: Uuid, cid: Uuid) -> PostResult<()> {
    if forum.config.post_delay_seconds <= 0 {
        return Ok(());
    }

    let identity = privileges::resolve_identity(forum, Some(uid), Some(cid)).await?;
    if identity.role.is_some() || identity.can_moderate() {
        return Ok(());
    }

    let last = users::get_user_field(forum, uid, "lastposttime")
        .await
        .map_err(|e| crate::store::StoreError::Backend(e.to_string()))?
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    if last == 0 {
        return Ok(());
    }

    let elapsed_ms = Utc::now().timestamp_millis() - last;
    if elapsed_ms < forum.config.post_delay_seconds * 1000 {
        return Err(PostError::TooManyPosts {
            seconds: forum.config.post_delay_seconds,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::groups;
    use crate::users::{create, roles, NewUser, Role};

    async fn user(forum: &Forum, name: &str) -> Uuid {
        create(
            forum,
            NewUser {
                username: name.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn queue_config() -> Config {
        Config {
            post_queue: true,
            post_queue_reputation_threshold: 10,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_queue_disabled_everywhere() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "General", "").await.unwrap();
        let context = PostContext { cid: category.cid };

        assert!(!should_queue(&forum, None, context).await.unwrap());
        let uid = user(&forum, "quietUser").await;
        assert!(!should_queue(&forum, Some(uid), context).await.unwrap());
    }

    #[tokio::test]
    async fn test_guest_is_queued_when_active() {
        let forum = Forum::in_memory(queue_config());
        let category = categories::create(&forum, "General", "").await.unwrap();
        assert!(should_queue(&forum, None, PostContext { cid: category.cid }).await.unwrap());
    }

    #[tokio::test]
    async fn test_roles_bypass_queue() {
        let forum = Forum::in_memory(queue_config());
        let category = categories::create(&forum, "General", "").await.unwrap();
        let context = PostContext { cid: category.cid };

        for (name, role) in [
            ("queueStudent", Role::Student),
            ("queueTa", Role::Ta),
            ("queueProfessor", Role::Professor),
        ] {
            let uid = user(&forum, name).await;
            roles::assign_role(&forum, uid, role).await.unwrap();
            assert!(!should_queue(&forum, Some(uid), context).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_low_reputation_user_is_queued() {
        let forum = Forum::in_memory(queue_config());
        let category = categories::create(&forum, "General", "").await.unwrap();
        let uid = user(&forum, "lowRep").await;

        assert!(should_queue(&forum, Some(uid), PostContext { cid: category.cid }).await.unwrap());

        crate::users::set_user_field(&forum, uid, "reputation", "10").await.unwrap();
        assert!(!should_queue(&forum, Some(uid), PostContext { cid: category.cid }).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_and_moderator_bypass() {
        let forum = Forum::in_memory(queue_config());
        let category = categories::create(&forum, "General", "").await.unwrap();
        let context = PostContext { cid: category.cid };

        let admin = user(&forum, "queueAdmin").await;
        groups::join(&forum, groups::ADMINISTRATORS, admin).await.unwrap();
        assert!(!should_queue(&forum, Some(admin), context).await.unwrap());

        let moderator = user(&forum, "queueMod").await;
        categories::add_moderator(&forum, category.cid, moderator).await.unwrap();
        assert!(!should_queue(&forum, Some(moderator), context).await.unwrap());
    }

    #[tokio::test]
    async fn test_category_queue_without_global() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "Gated", "").await.unwrap();
        categories::set_category_field(&forum, category.cid, "post_queue", "1").await.unwrap();

        assert!(should_queue(&forum, None, PostContext { cid: category.cid }).await.unwrap());
    }

    #[tokio::test]
    async fn test_monotonicity_role_never_queued_more_than_guest() {
        let forum = Forum::in_memory(queue_config());
        let category = categories::create(&forum, "General", "").await.unwrap();
        let context = PostContext { cid: category.cid };

        let student = user(&forum, "monoStudent").await;
        roles::assign_role(&forum, student, Role::Student).await.unwrap();

        let guest_queued = should_queue(&forum, None, context).await.unwrap();
        let student_queued = should_queue(&forum, Some(student), context).await.unwrap();
        assert!(!student_queued || guest_queued);
    }

    #[tokio::test]
    async fn test_post_delay_throttles_plain_users_only() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "General", "").await.unwrap();
        let cid = category.cid;

        let plain = user(&forum, "delayPlain").await;
        let now = Utc::now().timestamp_millis();
        crate::users::set_user_field(&forum, plain, "lastposttime", &now.to_string())
            .await
            .unwrap();
        let err = is_ready_to_post(&forum, plain, cid).await.unwrap_err();
        assert_eq!(err.code(), "too-many-posts");

        let ta = user(&forum, "delayTa").await;
        roles::assign_role(&forum, ta, Role::Ta).await.unwrap();
        crate::users::set_user_field(&forum, ta, "lastposttime", &now.to_string())
            .await
            .unwrap();
        is_ready_to_post(&forum, ta, cid).await.unwrap();
    }
}
