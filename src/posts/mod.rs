//! Posts: storage, the moderation queue gate, and the posting throttle.

pub mod error;
pub mod queue;

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::categories;
use crate::state::Forum;
use crate::store::{Store, StoreResult};
use crate::users::{self, Role};

pub use error::{PostError, PostResult};
pub use queue::{is_ready_to_post, should_queue, PostContext};

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Wall-clock milliseconds, nudged forward one tick when two posts land
/// in the same millisecond. Time-ordered indexes stay strictly ordered.
pub(crate) fn next_timestamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_TIMESTAMP
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |prev| {
            Some(if now > prev { now } else { prev + 1 })
        })
        .unwrap_or(now);
    if now > prev {
        now
    } else {
        prev + 1
    }
}

pub(crate) fn post_key(pid: Uuid) -> String {
    format!("post:{pid}")
}

pub(crate) fn topic_posts_key(tid: Uuid) -> String {
    format!("tid:{tid}:posts")
}

/// A stored post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Post id.
    pub pid: Uuid,
    /// Owning topic.
    pub tid: Uuid,
    /// Owning category.
    pub cid: Uuid,
    /// Author.
    pub uid: Uuid,
    /// Post body.
    pub content: String,
    /// Creation time, unix milliseconds.
    pub timestamp: i64,
    /// Restriction tag; `None` means visible to everyone who can read
    /// the category.
    pub target_role: Option<Role>,
}

impl Post {
    fn to_hash(&self) -> HashMap<String, String> {
        let mut hash = HashMap::new();
        hash.insert("pid".into(), self.pid.to_string());
        hash.insert("tid".into(), self.tid.to_string());
        hash.insert("cid".into(), self.cid.to_string());
        hash.insert("uid".into(), self.uid.to_string());
        hash.insert("content".into(), self.content.clone());
        hash.insert("timestamp".into(), self.timestamp.to_string());
        if let Some(target) = self.target_role {
            hash.insert("target_role".into(), target.as_str().into());
        }
        hash
    }

    fn from_hash(hash: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            pid: hash.get("pid")?.parse().ok()?,
            tid: hash.get("tid")?.parse().ok()?,
            cid: hash.get("cid")?.parse().ok()?,
            uid: hash.get("uid")?.parse().ok()?,
            content: hash.get("content").cloned().unwrap_or_default(),
            timestamp: hash.get("timestamp").and_then(|v| v.parse().ok()).unwrap_or(0),
            target_role: hash.get("target_role").and_then(|v| v.parse().ok()),
        })
    }
}

/// Create a post record. The restriction tag must already be authorized
/// by the caller; when present the pid is also added to the category's
/// restricted-post index, keeping the tag/index invariant.
pub(crate) async fn create(
    forum: &Forum,
    tid: Uuid,
    cid: Uuid,
    uid: Uuid,
    content: &str,
    target_role: Option<Role>,
) -> StoreResult<Post> {
    let now = next_timestamp();
    let post = Post {
        pid: Uuid::new_v4(),
        tid,
        cid,
        uid,
        content: content.to_string(),
        timestamp: now,
        target_role,
    };

    forum.store.set_object(&post_key(post.pid), &post.to_hash()).await?;
    forum
        .store
        .sorted_set_add(&topic_posts_key(tid), now, &post.pid.to_string())
        .await?;
    if target_role.is_some() {
        forum
            .store
            .sorted_set_add(
                &categories::pids_instructor_key(cid),
                now,
                &post.pid.to_string(),
            )
            .await?;
    }

    forum
        .store
        .set_object_field(&users::user_key(uid), "lastposttime", &now.to_string())
        .await?;

    Ok(post)
}

/// Load a post by id.
pub async fn get_post_data(forum: &Forum, pid: Uuid) -> StoreResult<Option<Post>> {
    let hash = forum.store.get_object(&post_key(pid)).await?;
    Ok(hash.as_ref().and_then(Post::from_hash))
}

/// Load several posts; missing ids are skipped.
pub async fn get_posts_data(forum: &Forum, pids: &[Uuid]) -> StoreResult<Vec<Post>> {
    let keys: Vec<String> = pids.iter().map(|pid| post_key(*pid)).collect();
    let hashes = forum.store.get_objects(&keys).await?;
    Ok(hashes.iter().flatten().filter_map(Post::from_hash).collect())
}
