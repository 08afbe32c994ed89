//! Cache engine capability contract and concrete backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

pub mod memory;
pub mod redis;

pub use memory::MemoryEngine;
pub use redis::RedisEngine;

/// Capability contract for cache backends.
///
/// Engines expose the primitive key/value and ordered-list operations the
/// [`Cache`](crate::Cache) facade dispatches to. Keys are already rendered
/// to canonical strings and values are already serialized when they reach
/// an engine.
///
/// Single-key operations are expected to be atomic at the backend; no
/// atomicity is assumed across multi-key sequences.
#[async_trait]
pub trait CacheEngine: Send + Sync {
    /// Stores a value, optionally applying a TTL.
    ///
    /// The TTL is applied as a follow-up call after a successful store
    /// (two-step, not atomic): a crash between the two calls leaves the
    /// key without a deadline, which callers accept as a degraded state.
    ///
    /// Returns `true` if the store succeeded.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<bool>;

    /// Fetches a value. Absence is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Deletes a key. Returns `true` if a live key was removed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Replaces the TTL of an existing key.
    ///
    /// This is the only mutator allowed to change a key's time-to-live
    /// after creation. Returns `false` when the key does not exist.
    async fn update_ttl(&self, key: &str, ttl: Duration) -> CacheResult<bool>;

    /// Pushes a value onto the head of the list at `key`.
    async fn list_push(&self, key: &str, value: String) -> CacheResult<()>;

    /// Returns the index of the first occurrence of `value` in the list,
    /// or `None` when absent.
    async fn list_position(&self, key: &str, value: &str) -> CacheResult<Option<u64>>;

    /// Returns the list elements between `start` and `end` (inclusive,
    /// negative indices count from the tail).
    async fn list_range(&self, key: &str, start: isize, end: isize) -> CacheResult<Vec<String>>;

    /// Removes occurrences of `value` from the list.
    ///
    /// `count > 0` removes up to `count` occurrences from the head,
    /// `count < 0` from the tail, `count == 0` removes all. Returns the
    /// number of removed elements.
    async fn list_remove(&self, key: &str, count: isize, value: &str) -> CacheResult<u64>;

    /// Clears the entire namespace. Destructive; intended for tests and ops.
    async fn reset(&self) -> CacheResult<()>;
}
