//! In-memory store implementation.
//!
//! Backed by lock-free concurrent maps. Sorted-set reads materialize the
//! ordering on demand; member ties break lexicographically, matching the
//! ordering contract of the production store.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{resolve_ranks, Store, StoreResult};

/// In-memory [`Store`] used by tests and embedded deployments.
#[derive(Debug, Default)]
pub struct MemStore {
    objects: DashMap<String, HashMap<String, String>>,
    sorted_sets: DashMap<String, HashMap<String, i64>>,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn ordered_members(&self, key: &str) -> Vec<(i64, String)> {
        let Some(set) = self.sorted_sets.get(key) else {
            return Vec::new();
        };
        let mut members: Vec<(i64, String)> = set
            .iter()
            .map(|(member, score)| (*score, member.clone()))
            .collect();
        members.sort();
        members
    }
}

#[async_trait]
impl Store for MemStore {
    async fn get_object_field(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        Ok(self
            .objects
            .get(key)
            .and_then(|obj| obj.get(field).cloned()))
    }

    async fn get_object_fields(
        &self,
        key: &str,
        fields: &[&str],
    ) -> StoreResult<HashMap<String, String>> {
        let mut result = HashMap::new();
        if let Some(obj) = self.objects.get(key) {
            for field in fields {
                if let Some(value) = obj.get(*field) {
                    result.insert((*field).to_string(), value.clone());
                }
            }
        }
        Ok(result)
    }

    async fn get_object(&self, key: &str) -> StoreResult<Option<HashMap<String, String>>> {
        Ok(self.objects.get(key).map(|obj| obj.value().clone()))
    }

    async fn get_objects(
        &self,
        keys: &[String],
    ) -> StoreResult<Vec<Option<HashMap<String, String>>>> {
        Ok(keys
            .iter()
            .map(|key| self.objects.get(key).map(|obj| obj.value().clone()))
            .collect())
    }

    async fn set_object_field(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.objects
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn set_object(&self, key: &str, values: &HashMap<String, String>) -> StoreResult<()> {
        let mut obj = self.objects.entry(key.to_string()).or_default();
        for (field, value) in values {
            obj.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete_object_field(&self, key: &str, field: &str) -> StoreResult<()> {
        if let Some(mut obj) = self.objects.get_mut(key) {
            obj.remove(field);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.objects.remove(key);
        self.sorted_sets.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.objects.contains_key(key) || self.sorted_sets.contains_key(key))
    }

    async fn sorted_set_add(&self, key: &str, score: i64, member: &str) -> StoreResult<()> {
        self.sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn sorted_set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        if let Some(mut set) = self.sorted_sets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn is_sorted_set_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        Ok(self
            .sorted_sets
            .get(key)
            .map(|set| set.contains_key(member))
            .unwrap_or(false))
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<String>> {
        let members = self.ordered_members(key);
        let Some((start, stop)) = resolve_ranks(members.len(), start, stop) else {
            return Ok(Vec::new());
        };
        Ok(members[start..=stop]
            .iter()
            .map(|(_, member)| member.clone())
            .collect())
    }

    async fn sorted_set_rev_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<String>> {
        let mut members = self.ordered_members(key);
        members.reverse();
        let Some((start, stop)) = resolve_ranks(members.len(), start, stop) else {
            return Ok(Vec::new());
        };
        Ok(members[start..=stop]
            .iter()
            .map(|(_, member)| member.clone())
            .collect())
    }

    async fn sorted_set_score(&self, key: &str, member: &str) -> StoreResult<Option<i64>> {
        Ok(self
            .sorted_sets
            .get(key)
            .and_then(|set| set.get(member).copied()))
    }

    async fn sorted_set_card(&self, key: &str) -> StoreResult<u64> {
        Ok(self
            .sorted_sets
            .get(key)
            .map(|set| set.len() as u64)
            .unwrap_or(0))
    }
}
