//! Privilege evaluation.
//!
//! One resolution step turns `(uid, category)` into an [`Identity`]
//! capability record; every gate in the crate consumes that record
//! instead of re-deriving admin or moderator status.

pub mod resolver;
pub mod types;

pub use resolver::{
    can, filter_pids, get_category_privileges, resolve_identity, set_category_privileges,
};
pub use types::{CategoryPrivileges, DefaultPolicy, Grant, Identity, PrivilegeAction};
