//! Reusable test helpers for integration tests.
//!
//! Provides a fully wired in-memory [`Forum`] plus shortcuts for creating
//! users with roles, administrators, and categories.
#![allow(dead_code)]

use std::sync::Once;

use uuid::Uuid;

use lectern_core::categories::{self, Category};
use lectern_core::groups;
use lectern_core::users::{self, roles, NewUser, Role};
use lectern_core::{Config, Forum};

static INIT_TRACING: Once = Once::new();

/// Install a log subscriber once per test binary. Honors `RUST_LOG`,
/// defaulting to warnings only so test output stays readable.
fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A forum backed by the in-memory store with default configuration.
pub fn test_forum() -> Forum {
    init_tracing();
    Forum::in_memory(Config::default())
}

/// A forum with a custom configuration.
pub fn test_forum_with(config: Config) -> Forum {
    init_tracing();
    Forum::in_memory(config)
}

/// Create a user with just a username.
pub async fn create_user(forum: &Forum, username: &str) -> Uuid {
    users::create(
        forum,
        NewUser {
            username: username.to_string(),
            password: Some("123456".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("user creation failed")
}

/// Create a user and assign a course role.
pub async fn create_user_with_role(forum: &Forum, username: &str, role: Role) -> Uuid {
    let uid = create_user(forum, username).await;
    roles::assign_role(forum, uid, role)
        .await
        .expect("role assignment failed");
    uid
}

/// Create a user and add it to the administrators group.
pub async fn create_admin(forum: &Forum, username: &str) -> Uuid {
    let uid = create_user(forum, username).await;
    groups::join(forum, groups::ADMINISTRATORS, uid)
        .await
        .expect("administrators join failed");
    uid
}

/// Create a category.
pub async fn create_category(forum: &Forum, name: &str, description: &str) -> Category {
    categories::create(forum, name, description)
        .await
        .expect("category creation failed")
}
