//! Categories and their topic indexes.
//!
//! Each category keeps several sorted sets over its topics: the full
//! index, a creation-time index, and two restricted views used as list
//! filters. The instructor index holds role-tagged topics and the
//! resolved index holds topics a moderator has marked answered.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::privileges;
use crate::state::Forum;
use crate::store::{Store, StoreResult};
use crate::topics;
use crate::util;

pub fn category_key(cid: Uuid) -> String {
    format!("category:{cid}")
}

pub fn moderators_key(cid: Uuid) -> String {
    format!("cid:{cid}:moderators")
}

/// Full topic index, scored by last reply time.
pub fn tids_key(cid: Uuid) -> String {
    format!("cid:{cid}:tids")
}

/// Topic index scored by creation time.
pub fn tids_create_key(cid: Uuid) -> String {
    format!("cid:{cid}:tids:create")
}

/// Topics carrying an instructor restriction tag.
pub fn tids_instructor_key(cid: Uuid) -> String {
    format!("cid:{cid}:tids:instructor")
}

/// Topics marked resolved by a moderator.
pub fn tids_resolved_key(cid: Uuid) -> String {
    format!("cid:{cid}:tids:resolved")
}

/// Posts carrying an instructor restriction tag.
pub fn pids_instructor_key(cid: Uuid) -> String {
    format!("cid:{cid}:pids:instructor")
}

/// A discussion category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub cid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Creation time, unix milliseconds.
    pub timestamp: i64,
}

impl Category {
    fn to_hash(&self) -> HashMap<String, String> {
        HashMap::from([
            ("cid".to_string(), self.cid.to_string()),
            ("name".to_string(), self.name.clone()),
            ("slug".to_string(), self.slug.clone()),
            ("description".to_string(), self.description.clone()),
            ("timestamp".to_string(), self.timestamp.to_string()),
        ])
    }

    fn from_hash(hash: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            cid: hash.get("cid")?.parse().ok()?,
            name: hash.get("name").cloned().unwrap_or_default(),
            slug: hash.get("slug").cloned().unwrap_or_default(),
            description: hash.get("description").cloned().unwrap_or_default(),
            timestamp: hash.get("timestamp")?.parse().ok()?,
        })
    }
}

/// Create a category and register it in the global index.
#[tracing::instrument(skip(forum))]
pub async fn create(forum: &Forum, name: &str, description: &str) -> StoreResult<Category> {
    let cid = Uuid::new_v4();
    let timestamp = Utc::now().timestamp_millis();
    let category = Category {
        cid,
        name: name.to_string(),
        slug: format!("{cid}/{}", util::slugify(name)),
        description: description.to_string(),
        timestamp,
    };
    forum
        .store
        .set_object(&category_key(cid), &category.to_hash())
        .await?;
    forum
        .store
        .sorted_set_add("categories:cid", timestamp, &cid.to_string())
        .await?;
    tracing::info!(%cid, name, "category created");
    Ok(category)
}

pub async fn get_category_data(forum: &Forum, cid: Uuid) -> StoreResult<Option<Category>> {
    let hash = forum.store.get_object(&category_key(cid)).await?;
    Ok(hash.as_ref().and_then(Category::from_hash))
}

pub async fn exists(forum: &Forum, cid: Uuid) -> StoreResult<bool> {
    forum.store.exists(&category_key(cid)).await
}

pub async fn get_category_field(
    forum: &Forum,
    cid: Uuid,
    field: &str,
) -> StoreResult<Option<String>> {
    forum.store.get_object_field(&category_key(cid), field).await
}

pub async fn set_category_field(
    forum: &Forum,
    cid: Uuid,
    field: &str,
    value: &str,
) -> StoreResult<()> {
    forum
        .store
        .set_object_field(&category_key(cid), field, value)
        .await
}

/// Whether this category queues new posts regardless of the global
/// setting.
pub async fn post_queue_enabled(forum: &Forum, cid: Uuid) -> StoreResult<bool> {
    let value = get_category_field(forum, cid, "post_queue").await?;
    Ok(util::is_flag_set(value.as_deref()))
}

pub async fn add_moderator(forum: &Forum, cid: Uuid, uid: Uuid) -> StoreResult<()> {
    forum
        .store
        .sorted_set_add(
            &moderators_key(cid),
            Utc::now().timestamp_millis(),
            &uid.to_string(),
        )
        .await
}

pub async fn remove_moderator(forum: &Forum, cid: Uuid, uid: Uuid) -> StoreResult<()> {
    forum
        .store
        .sorted_set_remove(&moderators_key(cid), &uid.to_string())
        .await
}

pub async fn is_moderator(forum: &Forum, cid: Uuid, uid: Uuid) -> StoreResult<bool> {
    forum
        .store
        .is_sorted_set_member(&moderators_key(cid), &uid.to_string())
        .await
}

/// Ordering of a category topic listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TopicSort {
    /// Most recent reply first.
    #[default]
    RecentlyReplied,
    /// Most recently created first.
    NewestToOldest,
    /// Oldest created first.
    OldestToNewest,
}

/// Parameters of a topic listing request.
#[derive(Debug, Clone, Copy)]
pub struct TopicQuery {
    pub cid: Uuid,
    pub uid: Option<Uuid>,
    /// Inclusive start rank.
    pub start: i64,
    /// Inclusive stop rank, negative counts from the end.
    pub stop: i64,
    pub sort: TopicSort,
    /// Restrict to the instructor index.
    pub instructor: bool,
    /// Restrict to the resolved index.
    pub resolved: bool,
}

impl TopicQuery {
    pub fn new(cid: Uuid, uid: Option<Uuid>) -> Self {
        Self {
            cid,
            uid,
            start: 0,
            stop: -1,
            sort: TopicSort::default(),
            instructor: false,
            resolved: false,
        }
    }
}

/// Topic ids for a listing, drawn from the index the query selects.
/// No visibility filtering is applied here; callers wanting a
/// viewer-safe list go through [`get_category_topics`].
#[tracing::instrument(skip(forum))]
pub async fn get_topic_ids(forum: &Forum, query: TopicQuery) -> StoreResult<Vec<Uuid>> {
    let key = if query.instructor {
        tids_instructor_key(query.cid)
    } else if query.resolved {
        tids_resolved_key(query.cid)
    } else {
        match query.sort {
            TopicSort::RecentlyReplied => tids_key(query.cid),
            TopicSort::NewestToOldest | TopicSort::OldestToNewest => tids_create_key(query.cid),
        }
    };
    let members = if query.sort == TopicSort::OldestToNewest {
        forum
            .store
            .sorted_set_range(&key, query.start, query.stop)
            .await?
    } else {
        forum
            .store
            .sorted_set_rev_range(&key, query.start, query.stop)
            .await?
    };
    Ok(members.iter().filter_map(|m| m.parse().ok()).collect())
}

/// A topic listing filtered to what the requesting user may see.
/// Restriction-tagged topics are removed silently for viewers below
/// the tag's threshold.
#[tracing::instrument(skip(forum))]
pub async fn get_category_topics(
    forum: &Forum,
    query: TopicQuery,
) -> StoreResult<Vec<topics::Topic>> {
    let tids = get_topic_ids(forum, query).await?;
    let identity = privileges::resolve_identity(forum, query.uid, Some(query.cid)).await?;
    let all = topics::get_topics_data(forum, &tids).await?;
    Ok(all
        .into_iter()
        .filter(|t| identity.can_view(t.target_role))
        .collect())
}
