//! Lectern Core
//!
//! Role and visibility engine for a course discussion forum: role
//! assignment, per-category privileges, target-role content restriction,
//! post-queue moderation gating, and custom profile field validation.
//!
//! The HTTP layer, rendering, and the concrete storage engine live in the
//! hosting application; this crate talks to storage through the [`store::Store`]
//! contract and exposes plain async service functions.

pub mod categories;
pub mod config;
pub mod groups;
pub mod hooks;
pub mod posts;
pub mod privileges;
pub mod state;
pub mod store;
pub mod topics;
pub mod users;
pub mod util;

pub use config::Config;
pub use state::Forum;
