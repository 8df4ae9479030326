//! Topic domain types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::Role;

/// A discussion topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub tid: Uuid,
    pub cid: Uuid,
    /// Author, `None` for guest-submitted topics.
    pub uid: Option<Uuid>,
    pub title: String,
    pub slug: String,
    /// Pid of the opening post.
    pub main_pid: Uuid,
    /// Creation time, unix milliseconds.
    pub timestamp: i64,
    /// Last reply time, unix milliseconds.
    pub lastposttime: i64,
    pub postcount: i64,
    /// Minimum role required to see this topic, `None` when open.
    pub target_role: Option<Role>,
    pub resolved: bool,
}

impl Topic {
    pub(crate) fn to_hash(&self) -> HashMap<String, String> {
        let mut hash = HashMap::from([
            ("tid".to_string(), self.tid.to_string()),
            ("cid".to_string(), self.cid.to_string()),
            ("title".to_string(), self.title.clone()),
            ("slug".to_string(), self.slug.clone()),
            ("mainPid".to_string(), self.main_pid.to_string()),
            ("timestamp".to_string(), self.timestamp.to_string()),
            ("lastposttime".to_string(), self.lastposttime.to_string()),
            ("postcount".to_string(), self.postcount.to_string()),
            ("resolved".to_string(), i64::from(self.resolved).to_string()),
        ]);
        if let Some(uid) = self.uid {
            hash.insert("uid".to_string(), uid.to_string());
        }
        // Absent entirely for untagged topics so the field never leaks
        // an empty marker to clients.
        if let Some(role) = self.target_role {
            hash.insert("target_role".to_string(), role.as_str().to_string());
        }
        hash
    }

    pub(crate) fn from_hash(hash: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            tid: hash.get("tid")?.parse().ok()?,
            cid: hash.get("cid")?.parse().ok()?,
            uid: hash.get("uid").and_then(|v| v.parse().ok()),
            title: hash.get("title").cloned().unwrap_or_default(),
            slug: hash.get("slug").cloned().unwrap_or_default(),
            main_pid: hash.get("mainPid")?.parse().ok()?,
            timestamp: hash.get("timestamp")?.parse().ok()?,
            lastposttime: hash
                .get("lastposttime")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            postcount: hash
                .get("postcount")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            target_role: hash.get("target_role").and_then(|v| v.parse().ok()),
            resolved: hash.get("resolved").map(String::as_str) == Some("1"),
        })
    }
}

/// Submission for a new topic with its opening post.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub cid: Uuid,
    pub uid: Option<Uuid>,
    pub title: String,
    pub content: String,
    /// Requested restriction tag. Dropped silently unless the caller
    /// may restrict content.
    pub target_role: Option<Role>,
}

impl NewTopic {
    pub fn new(cid: Uuid, uid: Option<Uuid>, title: &str, content: &str) -> Self {
        Self {
            cid,
            uid,
            title: title.to_string(),
            content: content.to_string(),
            target_role: None,
        }
    }

    /// Request a restriction tag (builder style).
    #[must_use]
    pub fn target_role(mut self, role: Role) -> Self {
        self.target_role = Some(role);
        self
    }
}

/// Submission for a reply to an existing topic.
#[derive(Debug, Clone)]
pub struct NewReply {
    pub tid: Uuid,
    pub uid: Option<Uuid>,
    pub content: String,
    /// Requested restriction tag, subject to the same stripping rule
    /// as [`NewTopic::target_role`].
    pub target_role: Option<Role>,
}

impl NewReply {
    pub fn new(tid: Uuid, uid: Option<Uuid>, content: &str) -> Self {
        Self {
            tid,
            uid,
            content: content.to_string(),
            target_role: None,
        }
    }

    #[must_use]
    pub fn target_role(mut self, role: Role) -> Self {
        self.target_role = Some(role);
        self
    }
}
