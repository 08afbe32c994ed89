//! Process-local cache engine backed by a concurrent map.
//!
//! Mirrors the semantics of the Redis engine closely enough that the two
//! are interchangeable behind the facade: push-front list insertion,
//! inclusive ranges with negative indices, signed removal counts and the
//! "scalar read of a list key is a miss" rule.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::engine::CacheEngine;
use crate::error::{CacheError, CacheResult};

#[derive(Debug, Clone)]
enum Slot {
    Scalar(String),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    expires_at: Option<Instant>,
}

impl Entry {
    fn scalar(value: String, ttl: Option<Duration>) -> Self {
        Self {
            slot: Slot::Scalar(value),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn empty_list() -> Self {
        Self {
            slot: Slot::List(VecDeque::new()),
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// In-process cache engine for single-instance deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    entries: DashMap<String, Entry>,
}

impl MemoryEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops an entry if its deadline has passed. Returns `true` when the
    /// key is still live afterwards.
    fn evict_if_expired(&self, key: &str) -> bool {
        let expired = self
            .entries
            .get(key)
            .map(|entry| entry.is_expired())
            .unwrap_or(false);
        if expired {
            self.entries.remove(key);
        }
        self.entries.contains_key(key)
    }
}

fn clamp_range(len: usize, start: isize, end: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let mut start = if start < 0 { len + start } else { start };
    let mut end = if end < 0 { len + end } else { end };
    if start < 0 {
        start = 0;
    }
    if end >= len {
        end = len - 1;
    }
    if start > end || start >= len {
        return None;
    }
    Some((start as usize, end as usize))
}

fn remove_occurrences(items: &mut VecDeque<String>, count: isize, value: &str) -> u64 {
    let limit = if count == 0 {
        u64::MAX
    } else {
        count.unsigned_abs() as u64
    };
    let mut removed = 0u64;
    if count >= 0 {
        let mut index = 0;
        while index < items.len() && removed < limit {
            if items[index] == value {
                items.remove(index);
                removed += 1;
            } else {
                index += 1;
            }
        }
    } else {
        let mut index = items.len();
        while index > 0 && removed < limit {
            index -= 1;
            if items[index] == value {
                items.remove(index);
                removed += 1;
            }
        }
    }
    removed
}

#[async_trait]
impl CacheEngine for MemoryEngine {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<bool> {
        self.entries
            .insert(key.to_string(), Entry::scalar(value, ttl));
        Ok(true)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        if !self.evict_if_expired(key) {
            return Ok(None);
        }
        Ok(self.entries.get(key).and_then(|entry| match &entry.slot {
            Slot::Scalar(value) => Some(value.clone()),
            // Scalar read of a list key is a miss, matching the swallowed
            // WRONGTYPE response of the Redis engine.
            Slot::List(_) => None,
        }))
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn update_ttl(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        if !self.evict_if_expired(key) {
            return Ok(false);
        }
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_push(&self, key: &str, value: String) -> CacheResult<()> {
        self.evict_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(Entry::empty_list);
        match &mut entry.slot {
            Slot::List(items) => {
                items.push_front(value);
                Ok(())
            }
            Slot::Scalar(_) => Err(CacheError::backend(format!(
                "WRONGTYPE: key `{key}` holds a scalar value"
            ))),
        }
    }

    async fn list_position(&self, key: &str, value: &str) -> CacheResult<Option<u64>> {
        if !self.evict_if_expired(key) {
            return Ok(None);
        }
        Ok(self.entries.get(key).and_then(|entry| match &entry.slot {
            Slot::List(items) => items
                .iter()
                .position(|item| item == value)
                .map(|index| index as u64),
            Slot::Scalar(_) => None,
        }))
    }

    async fn list_range(&self, key: &str, start: isize, end: isize) -> CacheResult<Vec<String>> {
        if !self.evict_if_expired(key) {
            return Ok(Vec::new());
        }
        Ok(self
            .entries
            .get(key)
            .and_then(|entry| match &entry.slot {
                Slot::List(items) => clamp_range(items.len(), start, end)
                    .map(|(from, to)| items.iter().skip(from).take(to - from + 1).cloned().collect()),
                Slot::Scalar(_) => None,
            })
            .unwrap_or_default())
    }

    async fn list_remove(&self, key: &str, count: isize, value: &str) -> CacheResult<u64> {
        if !self.evict_if_expired(key) {
            return Ok(0);
        }
        let mut removed = 0;
        if let Some(mut entry) = self.entries.get_mut(key) {
            if let Slot::List(items) = &mut entry.slot {
                removed = remove_occurrences(items, count, value);
            }
        }
        // Redis drops a list key once its last element is removed.
        // Emptiness is re-checked under the shard lock so a push landing
        // between the removal above and this drop is never lost.
        self.entries.remove_if(key, |_, entry| {
            matches!(&entry.slot, Slot::List(items) if items.is_empty())
        });
        Ok(removed)
    }

    async fn reset(&self) -> CacheResult<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let engine = MemoryEngine::new();

        assert!(engine.set("k", "v".to_string(), None).await.unwrap());
        assert_eq!(engine.get("k").await.unwrap(), Some("v".to_string()));
        assert!(engine.delete("k").await.unwrap());
        assert_eq!(engine.get("k").await.unwrap(), None);
        assert!(!engine.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let engine = MemoryEngine::new();

        engine
            .set("k", "v".to_string(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(engine.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(engine.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_ttl_is_the_only_ttl_mutator() {
        let engine = MemoryEngine::new();

        engine.set("k", "v".to_string(), None).await.unwrap();
        assert!(engine.update_ttl("k", Duration::from_millis(20)).await.unwrap());
        assert!(!engine.update_ttl("missing", Duration::from_secs(5)).await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(engine.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_push_is_push_front() {
        let engine = MemoryEngine::new();

        engine.list_push("l", "a".to_string()).await.unwrap();
        engine.list_push("l", "b".to_string()).await.unwrap();
        engine.list_push("l", "c".to_string()).await.unwrap();

        assert_eq!(
            engine.list_range("l", 0, -1).await.unwrap(),
            vec!["c".to_string(), "b".to_string(), "a".to_string()]
        );
        assert_eq!(engine.list_position("l", "a").await.unwrap(), Some(2));
        assert_eq!(engine.list_position("l", "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_range_negative_indices() {
        let engine = MemoryEngine::new();
        for item in ["a", "b", "c", "d"] {
            engine.list_push("l", item.to_string()).await.unwrap();
        }

        // List is d, c, b, a.
        assert_eq!(
            engine.list_range("l", 1, 2).await.unwrap(),
            vec!["c".to_string(), "b".to_string()]
        );
        assert_eq!(
            engine.list_range("l", -2, -1).await.unwrap(),
            vec!["b".to_string(), "a".to_string()]
        );
        assert!(engine.list_range("l", 3, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_remove_count_semantics() {
        let engine = MemoryEngine::new();
        for item in ["x", "y", "x", "y", "x"] {
            engine.list_push("l", item.to_string()).await.unwrap();
        }

        // List is x, y, x, y, x.
        assert_eq!(engine.list_remove("l", 1, "x").await.unwrap(), 1);
        assert_eq!(
            engine.list_range("l", 0, -1).await.unwrap(),
            vec!["y".to_string(), "x".to_string(), "y".to_string(), "x".to_string()]
        );
        assert_eq!(engine.list_remove("l", 0, "x").await.unwrap(), 2);
        assert_eq!(engine.list_remove("l", 0, "absent").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_list_key_is_dropped() {
        let engine = MemoryEngine::new();
        engine.list_push("l", "only".to_string()).await.unwrap();

        assert_eq!(engine.list_remove("l", 0, "only").await.unwrap(), 1);
        assert!(!engine.delete("l").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_push_survives_emptying_remove() {
        use std::sync::Arc;

        let engine = Arc::new(MemoryEngine::new());
        for round in 0..100 {
            engine.list_push("l", "stale".to_string()).await.unwrap();
            let fresh = format!("fresh-{round}");

            let remover = {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.list_remove("l", 0, "stale").await })
            };
            let pusher = {
                let engine = Arc::clone(&engine);
                let fresh = fresh.clone();
                tokio::spawn(async move { engine.list_push("l", fresh).await })
            };
            remover.await.unwrap().unwrap();
            pusher.await.unwrap().unwrap();

            // The key is only dropped when the list is truly empty, so the
            // racing push must never be lost.
            assert!(
                engine.list_position("l", &fresh).await.unwrap().is_some(),
                "push lost in round {round}"
            );
            engine.list_remove("l", 0, &fresh).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_scalar_get_of_list_key_is_a_miss() {
        let engine = MemoryEngine::new();
        engine.list_push("l", "a".to_string()).await.unwrap();

        assert_eq!(engine.get("l").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_push_onto_scalar_key_fails() {
        let engine = MemoryEngine::new();
        engine.set("k", "v".to_string(), None).await.unwrap();

        let err = engine.list_push("k", "a".to_string()).await.unwrap_err();
        assert!(matches!(err, CacheError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_reset_clears_namespace() {
        let engine = MemoryEngine::new();
        engine.set("k", "v".to_string(), None).await.unwrap();
        engine.list_push("l", "a".to_string()).await.unwrap();

        engine.reset().await.unwrap();
        assert_eq!(engine.get("k").await.unwrap(), None);
        assert!(engine.list_range("l", 0, -1).await.unwrap().is_empty());
    }
}
