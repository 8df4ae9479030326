//! User domain types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Course role assigned to a user.
///
/// Administrator is not a role: it is membership of the `administrators`
/// group and is resolved separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Enrolled student.
    Student,
    /// Teaching assistant.
    Ta,
    /// Course professor.
    Professor,
}

impl Role {
    /// Whether this role is at the instructor tier (TA or professor).
    /// Instructor-tier users may restrict content and see restricted
    /// content.
    pub const fn is_instructor(self) -> bool {
        matches!(self, Self::Ta | Self::Professor)
    }

    /// Whether a viewer with this role meets or exceeds a content
    /// restriction tag.
    ///
    /// There is a single instructor threshold: TA and professor are peers
    /// for visibility purposes, both satisfying a `ta` (or `professor`)
    /// tag. A `student` tag is satisfied by every assigned role.
    pub const fn satisfies(self, target: Self) -> bool {
        match target {
            Self::Student => true,
            Self::Ta | Self::Professor => self.is_instructor(),
        }
    }

    /// Stable string form, as stored on the user hash.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Ta => "ta",
            Self::Professor => "professor",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "ta" => Ok(Self::Ta),
            "professor" => Ok(Self::Professor),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for creating a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Desired username.
    pub username: String,
    /// Optional email address.
    pub email: Option<String>,
    /// Optional plaintext password, hashed before storage.
    pub password: Option<String>,
}

/// A profile update submission: the target user plus a bag of
/// field-key to string-value pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileData {
    /// The user whose profile is being updated.
    pub uid: Option<Uuid>,
    /// Submitted field values keyed by field name.
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}

impl ProfileData {
    /// Start a submission targeting `uid`.
    pub fn for_uid(uid: Uuid) -> Self {
        Self {
            uid: Some(uid),
            fields: HashMap::new(),
        }
    }

    /// Set a field value (builder style).
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }

    /// Read a submitted field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}
