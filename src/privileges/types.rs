//! Privilege model types.

use serde::{Deserialize, Serialize};

use crate::users::Role;

/// A named category-scoped permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivilegeAction {
    /// Create a topic in the category.
    #[serde(rename = "topics:create")]
    TopicsCreate,
    /// Reply to a topic in the category.
    #[serde(rename = "topics:reply")]
    TopicsReply,
    /// Read topics and posts in the category.
    #[serde(rename = "topics:read")]
    TopicsRead,
}

impl PrivilegeAction {
    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopicsCreate => "topics:create",
            Self::TopicsReply => "topics:reply",
            Self::TopicsRead => "topics:read",
        }
    }
}

impl std::str::FromStr for PrivilegeAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topics:create" => Ok(Self::TopicsCreate),
            "topics:reply" => Ok(Self::TopicsReply),
            "topics:read" => Ok(Self::TopicsRead),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PrivilegeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an action with no configured grant resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultPolicy {
    /// Unconfigured actions are allowed (general categories).
    Allow,
    /// Unconfigured actions are denied (announcement-style categories).
    Deny,
}

/// One configured grant: the roles allowed to perform an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    /// The granted action.
    pub action: PrivilegeAction,
    /// Roles allowed to perform it. Administrators pass regardless.
    pub roles: Vec<Role>,
}

/// Per-category privilege configuration, stored as JSON on the category
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPrivileges {
    /// Policy for actions without a grant.
    pub default_policy: DefaultPolicy,
    /// Configured grants.
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl Default for CategoryPrivileges {
    fn default() -> Self {
        Self::general()
    }
}

impl CategoryPrivileges {
    /// General-category configuration: everything allowed unless a grant
    /// narrows it.
    pub fn general() -> Self {
        Self {
            default_policy: DefaultPolicy::Allow,
            grants: Vec::new(),
        }
    }

    /// Announcement-category configuration: deny by default, topic
    /// creation and replies reserved for professors.
    pub fn announcements() -> Self {
        Self {
            default_policy: DefaultPolicy::Deny,
            grants: vec![
                Grant {
                    action: PrivilegeAction::TopicsCreate,
                    roles: vec![Role::Professor],
                },
                Grant {
                    action: PrivilegeAction::TopicsReply,
                    roles: vec![Role::Professor],
                },
                Grant {
                    action: PrivilegeAction::TopicsRead,
                    roles: vec![Role::Student, Role::Ta, Role::Professor],
                },
            ],
        }
    }

    /// Look up the roles granted an action, if configured.
    pub fn grant_for(&self, action: PrivilegeAction) -> Option<&[Role]> {
        self.grants
            .iter()
            .find(|grant| grant.action == action)
            .map(|grant| grant.roles.as_slice())
    }
}

/// Resolved capability record for one (user, category) pair.
///
/// Every gate in the crate consumes this single resolution instead of
/// re-checking admin or moderator status ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Assigned course role, if any. `None` for guests and unassigned
    /// registered users.
    pub role: Option<Role>,
    /// Member of the administrators group.
    pub is_admin: bool,
    /// Moderator of the category the identity was resolved against.
    pub is_moderator: bool,
}

impl Identity {
    /// The guest identity: no role, no privileges.
    pub const GUEST: Self = Self {
        role: None,
        is_admin: false,
        is_moderator: false,
    };

    /// Whether this identity may attach a restriction tag to content.
    pub fn can_restrict_content(&self) -> bool {
        self.is_admin || self.role.is_some_and(Role::is_instructor)
    }

    /// Whether this identity may see content tagged `target`.
    pub fn can_view(&self, target: Option<Role>) -> bool {
        match target {
            None => true,
            Some(target) => self.is_admin || self.role.is_some_and(|role| role.satisfies(target)),
        }
    }

    /// Whether this identity may moderate (resolve topics, review the
    /// post queue) in the resolved category.
    pub fn can_moderate(&self) -> bool {
        self.is_admin || self.is_moderator
    }
}
