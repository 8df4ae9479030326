//! Topics: creation, replies, viewer-filtered reads, and resolution.
//!
//! Restriction tags flow through here. A submitted tag survives only
//! when the caller may restrict content; otherwise it is dropped
//! without error and the post goes out untagged.

pub mod error;
pub mod types;

use chrono::Utc;
use uuid::Uuid;

use crate::categories;
use crate::posts::{self, Post, PostError};
use crate::privileges::{self, PrivilegeAction};
use crate::state::Forum;
use crate::store::{Store, StoreResult};
use crate::users::Role;
use crate::util;

pub use error::{TopicError, TopicResult};
pub use types::{NewReply, NewTopic, Topic};

pub(crate) fn topic_key(tid: Uuid) -> String {
    format!("topic:{tid}")
}

/// Resolve the tag that will actually be stored: the submitted tag if
/// the caller may restrict content, otherwise nothing.
async fn effective_target_role(
    forum: &Forum,
    uid: Option<Uuid>,
    cid: Uuid,
    requested: Option<Role>,
) -> StoreResult<Option<Role>> {
    if requested.is_none() {
        return Ok(None);
    }
    let identity = privileges::resolve_identity(forum, uid, Some(cid)).await?;
    if identity.can_restrict_content() {
        Ok(requested)
    } else {
        tracing::debug!(?uid, "restriction tag dropped for non-instructor");
        Ok(None)
    }
}

/// Create a topic with its opening post.
#[tracing::instrument(skip(forum, new_topic), fields(cid = %new_topic.cid))]
pub async fn post(forum: &Forum, new_topic: NewTopic) -> TopicResult<Topic> {
    if new_topic.title.trim().is_empty() || new_topic.content.trim().is_empty() {
        return Err(TopicError::InvalidData);
    }
    if !privileges::can(
        forum,
        PrivilegeAction::TopicsCreate,
        new_topic.cid,
        new_topic.uid,
    )
    .await?
    {
        return Err(TopicError::NoPrivileges);
    }
    let uid = new_topic.uid.ok_or(PostError::InvalidUid)?;
    posts::is_ready_to_post(forum, uid, new_topic.cid).await?;

    let target_role =
        effective_target_role(forum, new_topic.uid, new_topic.cid, new_topic.target_role).await?;

    let tid = Uuid::new_v4();
    let main_post = posts::create(
        forum,
        tid,
        new_topic.cid,
        uid,
        &new_topic.content,
        target_role,
    )
    .await?;

    let now = main_post.timestamp;
    let topic = Topic {
        tid,
        cid: new_topic.cid,
        uid: new_topic.uid,
        title: new_topic.title.trim().to_string(),
        slug: format!("{tid}/{}", util::slugify(&new_topic.title)),
        main_pid: main_post.pid,
        timestamp: now,
        lastposttime: now,
        postcount: 1,
        target_role,
        resolved: false,
    };
    forum.store.set_object(&topic_key(tid), &topic.to_hash()).await?;

    let member = tid.to_string();
    forum
        .store
        .sorted_set_add(&categories::tids_key(topic.cid), now, &member)
        .await?;
    forum
        .store
        .sorted_set_add(&categories::tids_create_key(topic.cid), now, &member)
        .await?;
    if target_role.is_some() {
        forum
            .store
            .sorted_set_add(&categories::tids_instructor_key(topic.cid), now, &member)
            .await?;
    }

    forum
        .hooks
        .fire_action(
            "action:topic.post",
            serde_json::json!({ "tid": tid, "cid": topic.cid, "uid": uid }),
        )
        .await;

    tracing::info!(%tid, tagged = target_role.is_some(), "topic created");
    Ok(topic)
}

/// Reply to an existing topic.
#[tracing::instrument(skip(forum, reply), fields(tid = %reply.tid))]
pub async fn reply(forum: &Forum, reply: NewReply) -> TopicResult<Post> {
    if reply.content.trim().is_empty() {
        return Err(TopicError::InvalidData);
    }
    let topic = get_topic_data(forum, reply.tid)
        .await?
        .ok_or(TopicError::NoTopic)?;
    if !privileges::can(forum, PrivilegeAction::TopicsReply, topic.cid, reply.uid).await? {
        return Err(TopicError::NoPrivileges);
    }
    let uid = reply.uid.ok_or(PostError::InvalidUid)?;
    posts::is_ready_to_post(forum, uid, topic.cid).await?;

    let target_role =
        effective_target_role(forum, reply.uid, topic.cid, reply.target_role).await?;
    let post = posts::create(forum, topic.tid, topic.cid, uid, &reply.content, target_role).await?;

    forum
        .store
        .set_object_field(
            &topic_key(topic.tid),
            "lastposttime",
            &post.timestamp.to_string(),
        )
        .await?;
    forum
        .store
        .set_object_field(
            &topic_key(topic.tid),
            "postcount",
            &(topic.postcount + 1).to_string(),
        )
        .await?;
    forum
        .store
        .sorted_set_add(
            &categories::tids_key(topic.cid),
            post.timestamp,
            &topic.tid.to_string(),
        )
        .await?;

    Ok(post)
}

pub async fn get_topic_data(forum: &Forum, tid: Uuid) -> StoreResult<Option<Topic>> {
    let hash = forum.store.get_object(&topic_key(tid)).await?;
    Ok(hash.as_ref().and_then(Topic::from_hash))
}

/// Load several topics; missing ids are skipped.
pub async fn get_topics_data(forum: &Forum, tids: &[Uuid]) -> StoreResult<Vec<Topic>> {
    let keys: Vec<String> = tids.iter().map(|tid| topic_key(*tid)).collect();
    let hashes = forum.store.get_objects(&keys).await?;
    Ok(hashes.iter().flatten().filter_map(Topic::from_hash).collect())
}

/// Posts of a topic in thread order, filtered to what `uid` may see.
#[tracing::instrument(skip(forum))]
pub async fn get_topic_posts(
    forum: &Forum,
    tid: Uuid,
    start: i64,
    stop: i64,
    uid: Option<Uuid>,
) -> StoreResult<Vec<Post>> {
    let members = forum
        .store
        .sorted_set_range(&posts::topic_posts_key(tid), start, stop)
        .await?;
    let pids: Vec<Uuid> = members.iter().filter_map(|m| m.parse().ok()).collect();
    let visible = privileges::filter_pids(forum, PrivilegeAction::TopicsRead, &pids, uid).await?;
    posts::get_posts_data(forum, &visible).await
}

/// Latest reply each topic shows in category listings. A topic whose
/// newest posts are all restricted away from the viewer falls back to
/// the newest post the viewer may see, or yields `None`.
#[tracing::instrument(skip(forum))]
pub async fn get_teasers_by_tids(
    forum: &Forum,
    tids: &[Uuid],
    uid: Option<Uuid>,
) -> StoreResult<Vec<Option<Post>>> {
    let mut teasers = Vec::with_capacity(tids.len());
    for &tid in tids {
        let members = forum
            .store
            .sorted_set_rev_range(&posts::topic_posts_key(tid), 0, -1)
            .await?;
        let pids: Vec<Uuid> = members.iter().filter_map(|m| m.parse().ok()).collect();
        let visible =
            privileges::filter_pids(forum, PrivilegeAction::TopicsRead, &pids, uid).await?;
        match visible.first() {
            Some(&pid) => teasers.push(posts::get_post_data(forum, pid).await?),
            None => teasers.push(None),
        }
    }
    Ok(teasers)
}

/// Mark topics resolved. Restricted to administrators and category
/// moderators.
#[tracing::instrument(skip(forum))]
pub async fn resolve(
    forum: &Forum,
    uid: Option<Uuid>,
    cid: Uuid,
    tids: &[Uuid],
) -> TopicResult<()> {
    set_resolved(forum, uid, cid, tids, true).await
}

/// Clear the resolved mark from topics.
#[tracing::instrument(skip(forum))]
pub async fn unresolve(
    forum: &Forum,
    uid: Option<Uuid>,
    cid: Uuid,
    tids: &[Uuid],
) -> TopicResult<()> {
    set_resolved(forum, uid, cid, tids, false).await
}

async fn set_resolved(
    forum: &Forum,
    uid: Option<Uuid>,
    cid: Uuid,
    tids: &[Uuid],
    resolved: bool,
) -> TopicResult<()> {
    let identity = privileges::resolve_identity(forum, uid, Some(cid)).await?;
    if !identity.can_moderate() {
        return Err(TopicError::NoPrivileges);
    }
    let now = Utc::now().timestamp_millis();
    for &tid in tids {
        if !forum.store.exists(&topic_key(tid)).await? {
            return Err(TopicError::NoTopic);
        }
        if resolved {
            forum
                .store
                .sorted_set_add(&categories::tids_resolved_key(cid), now, &tid.to_string())
                .await?;
        } else {
            forum
                .store
                .sorted_set_remove(&categories::tids_resolved_key(cid), &tid.to_string())
                .await?;
        }
        forum
            .store
            .set_object_field(
                &topic_key(tid),
                "resolved",
                if resolved { "1" } else { "0" },
            )
            .await?;
    }
    forum
        .hooks
        .fire_action(
            "action:topic.resolve",
            serde_json::json!({ "cid": cid, "resolved": resolved }),
        )
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::groups;
    use crate::users::{create as create_user, roles, NewUser};

    async fn user(forum: &Forum, name: &str, role: Option<Role>) -> Uuid {
        let uid = create_user(
            forum,
            NewUser {
                username: name.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        if let Some(role) = role {
            roles::assign_role(forum, uid, role).await.unwrap();
        }
        uid
    }

    #[tokio::test]
    async fn test_post_stores_tag_for_instructor() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "Tagging", "").await.unwrap();
        let professor = user(&forum, "tagProfessor", Some(Role::Professor)).await;

        let topic = post(
            &forum,
            NewTopic::new(category.cid, Some(professor), "Staff notes", "for staff")
                .target_role(Role::Ta),
        )
        .await
        .unwrap();

        let stored = get_topic_data(&forum, topic.tid).await.unwrap().unwrap();
        assert_eq!(stored.target_role, Some(Role::Ta));
        assert!(forum
            .store
            .is_sorted_set_member(
                &categories::tids_instructor_key(category.cid),
                &topic.tid.to_string(),
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_post_strips_tag_for_student() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "Stripping", "").await.unwrap();
        let student = user(&forum, "stripStudent", Some(Role::Student)).await;

        let topic = post(
            &forum,
            NewTopic::new(category.cid, Some(student), "Attempt", "sneaky")
                .target_role(Role::Ta),
        )
        .await
        .unwrap();

        let stored = get_topic_data(&forum, topic.tid).await.unwrap().unwrap();
        assert_eq!(stored.target_role, None);
        assert!(!forum
            .store
            .is_sorted_set_member(
                &categories::tids_instructor_key(category.cid),
                &topic.tid.to_string(),
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_post_keeps_tag_for_admin() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "AdminTag", "").await.unwrap();
        let admin = user(&forum, "tagAdmin", None).await;
        groups::join(&forum, groups::ADMINISTRATORS, admin).await.unwrap();

        let topic = post(
            &forum,
            NewTopic::new(category.cid, Some(admin), "Admin note", "hi staff")
                .target_role(Role::Ta),
        )
        .await
        .unwrap();
        assert_eq!(topic.target_role, Some(Role::Ta));
    }

    #[tokio::test]
    async fn test_post_rejects_empty_title() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "Validation", "").await.unwrap();
        let professor = user(&forum, "valProfessor", Some(Role::Professor)).await;

        let err = post(
            &forum,
            NewTopic::new(category.cid, Some(professor), "  ", "content"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TopicError::InvalidData));
    }

    #[tokio::test]
    async fn test_reply_filtering_on_topic_page() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "Replies", "").await.unwrap();
        let professor = user(&forum, "repProfessor", Some(Role::Professor)).await;
        let student = user(&forum, "repStudent", Some(Role::Student)).await;

        let topic = post(
            &forum,
            NewTopic::new(category.cid, Some(professor), "Open thread", "main post"),
        )
        .await
        .unwrap();
        let normal = reply(&forum, NewReply::new(topic.tid, Some(professor), "for everyone"))
            .await
            .unwrap();
        let restricted = reply(
            &forum,
            NewReply::new(topic.tid, Some(professor), "for staff").target_role(Role::Ta),
        )
        .await
        .unwrap();

        let student_pids: Vec<Uuid> =
            get_topic_posts(&forum, topic.tid, 0, -1, Some(student))
                .await
                .unwrap()
                .iter()
                .map(|p| p.pid)
                .collect();
        assert!(student_pids.contains(&normal.pid));
        assert!(!student_pids.contains(&restricted.pid));

        let professor_pids: Vec<Uuid> =
            get_topic_posts(&forum, topic.tid, 0, -1, Some(professor))
                .await
                .unwrap()
                .iter()
                .map(|p| p.pid)
                .collect();
        assert!(professor_pids.contains(&restricted.pid));
    }

    #[tokio::test]
    async fn test_reply_updates_topic_counters() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "Counters", "").await.unwrap();
        let professor = user(&forum, "cntProfessor", Some(Role::Professor)).await;

        let topic = post(
            &forum,
            NewTopic::new(category.cid, Some(professor), "Counting", "one"),
        )
        .await
        .unwrap();
        reply(&forum, NewReply::new(topic.tid, Some(professor), "two"))
            .await
            .unwrap();

        let stored = get_topic_data(&forum, topic.tid).await.unwrap().unwrap();
        assert_eq!(stored.postcount, 2);
        assert!(stored.lastposttime >= stored.timestamp);
    }

    #[tokio::test]
    async fn test_teaser_falls_back_for_students() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "Teasers", "").await.unwrap();
        let professor = user(&forum, "teaProfessor", Some(Role::Professor)).await;
        let student = user(&forum, "teaStudent", Some(Role::Student)).await;

        let topic = post(
            &forum,
            NewTopic::new(category.cid, Some(professor), "Teaser topic", "main post"),
        )
        .await
        .unwrap();
        reply(
            &forum,
            NewReply::new(topic.tid, Some(professor), "secret teaser").target_role(Role::Ta),
        )
        .await
        .unwrap();

        let student_teasers = get_teasers_by_tids(&forum, &[topic.tid], Some(student))
            .await
            .unwrap();
        let teaser = student_teasers[0].as_ref().unwrap();
        assert_ne!(teaser.content, "secret teaser");

        let ta = user(&forum, "teaTa", Some(Role::Ta)).await;
        let ta_teasers = get_teasers_by_tids(&forum, &[topic.tid], Some(ta)).await.unwrap();
        assert_eq!(ta_teasers[0].as_ref().unwrap().content, "secret teaser");
    }

    #[tokio::test]
    async fn test_resolution_requires_moderator() {
        let forum = Forum::in_memory(Config::default());
        let category = categories::create(&forum, "Resolution", "").await.unwrap();
        let professor = user(&forum, "resProfessor", Some(Role::Professor)).await;
        let admin = user(&forum, "resAdmin", None).await;
        groups::join(&forum, groups::ADMINISTRATORS, admin).await.unwrap();

        let topic = post(
            &forum,
            NewTopic::new(category.cid, Some(professor), "Resolve me", "question"),
        )
        .await
        .unwrap();

        let err = resolve(&forum, Some(professor), category.cid, &[topic.tid])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "no-privileges");

        resolve(&forum, Some(admin), category.cid, &[topic.tid])
            .await
            .unwrap();
        assert!(forum
            .store
            .is_sorted_set_member(
                &categories::tids_resolved_key(category.cid),
                &topic.tid.to_string(),
            )
            .await
            .unwrap());
        assert!(get_topic_data(&forum, topic.tid).await.unwrap().unwrap().resolved);

        unresolve(&forum, Some(admin), category.cid, &[topic.tid])
            .await
            .unwrap();
        assert!(!forum
            .store
            .is_sorted_set_member(
                &categories::tids_resolved_key(category.cid),
                &topic.tid.to_string(),
            )
            .await
            .unwrap());
    }
}
