//! Storage contract.
//!
//! The forum core treats persistence as an external ordered
//! key-value/sorted-set store: string-field hashes addressed by key, and
//! sorted sets of string members scored by unix milliseconds. Atomicity is
//! guaranteed only within a single call; read-then-write sequences over
//! secondary indexes are best-effort by contract.
//!
//! [`MemStore`] is the bundled in-memory implementation used by tests and
//! embedded deployments; a networked binding lives in the hosting
//! application.

mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying store failure (connection loss, serialization, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract object/sorted-set store.
///
/// `Send + Sync + async_trait` so services can hold an `Arc<dyn Store>`
/// and swap the in-memory implementation for a networked one without
/// touching call sites.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a single string field from the hash at `key`.
    async fn get_object_field(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    /// Fetch several fields from the hash at `key`. Missing fields are
    /// simply absent from the returned map.
    async fn get_object_fields(
        &self,
        key: &str,
        fields: &[&str],
    ) -> StoreResult<HashMap<String, String>>;

    /// Fetch the whole hash at `key`, or `None` when the key is unset.
    async fn get_object(&self, key: &str) -> StoreResult<Option<HashMap<String, String>>>;

    /// Fetch several whole hashes; unset keys yield `None` in place.
    async fn get_objects(&self, keys: &[String])
        -> StoreResult<Vec<Option<HashMap<String, String>>>>;

    /// Write a single string field on the hash at `key`.
    async fn set_object_field(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// Merge `values` into the hash at `key` in one call.
    async fn set_object(&self, key: &str, values: &HashMap<String, String>) -> StoreResult<()>;

    /// Remove one field from the hash at `key`.
    async fn delete_object_field(&self, key: &str, field: &str) -> StoreResult<()>;

    /// Remove an entire key (hash or sorted set).
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Whether a key exists at all.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Add `member` to the sorted set at `key` with `score`, replacing the
    /// member's previous score if already present.
    async fn sorted_set_add(&self, key: &str, score: i64, member: &str) -> StoreResult<()>;

    /// Remove `member` from the sorted set at `key`.
    async fn sorted_set_remove(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Whether `member` is in the sorted set at `key`.
    async fn is_sorted_set_member(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Members of the sorted set at `key`, ascending by score, from rank
    /// `start` to rank `stop` inclusive. Negative ranks count from the end
    /// (`-1` is the last member).
    async fn sorted_set_range(&self, key: &str, start: i64, stop: i64)
        -> StoreResult<Vec<String>>;

    /// Like [`Store::sorted_set_range`], but descending by score.
    async fn sorted_set_rev_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<String>>;

    /// Score of `member` in the sorted set at `key`.
    async fn sorted_set_score(&self, key: &str, member: &str) -> StoreResult<Option<i64>>;

    /// Cardinality of the sorted set at `key`.
    async fn sorted_set_card(&self, key: &str) -> StoreResult<u64>;
}

impl std::fmt::Debug for dyn Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Store")
    }
}

/// Resolve possibly-negative range ranks against a set length, returning
/// the inclusive `(start, stop)` index pair, or `None` for an empty range.
pub(crate) fn resolve_ranks(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    if len == 0 {
        return None;
    }
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ranks() {
        assert_eq!(resolve_ranks(5, 0, -1), Some((0, 4)));
        assert_eq!(resolve_ranks(5, 1, 2), Some((1, 2)));
        assert_eq!(resolve_ranks(5, 0, 100), Some((0, 4)));
        assert_eq!(resolve_ranks(5, -2, -1), Some((3, 4)));
        assert_eq!(resolve_ranks(0, 0, -1), None);
        assert_eq!(resolve_ranks(3, 5, 10), None);
        assert_eq!(resolve_ranks(3, 2, 1), None);
    }
}
