//! The typed cache facade.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::engine::CacheEngine;
use crate::error::CacheResult;
use crate::key::CacheKey;
use crate::serializer::{CacheSerializer, JsonSerializer};

const DEFAULT_KEY_SEPARATOR: &str = "_";

/// Typed facade over a [`CacheEngine`] and a [`CacheSerializer`].
///
/// Keys are canonicalized through [`CacheKey`] (composite keys joined with
/// the configured separator), values round-trip through the serializer.
/// Accepting the two capability traits at construction is the entire
/// contract check; there is no runtime capability probing.
#[derive(Clone)]
pub struct Cache {
    engine: Arc<dyn CacheEngine>,
    serializer: Arc<dyn CacheSerializer>,
    separator: String,
}

impl Cache {
    /// Creates a facade over `engine` with the default JSON serializer and
    /// `_` composite-key separator.
    #[must_use]
    pub fn new(engine: Arc<dyn CacheEngine>) -> Self {
        Self {
            engine,
            serializer: Arc::new(JsonSerializer),
            separator: DEFAULT_KEY_SEPARATOR.to_string(),
        }
    }

    /// Replaces the serializer.
    #[must_use]
    pub fn with_serializer(mut self, serializer: Arc<dyn CacheSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Replaces the composite-key separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    fn render(&self, key: impl Into<CacheKey>) -> String {
        key.into().render(&self.separator)
    }

    fn encode<T: Serialize>(&self, value: &T) -> CacheResult<String> {
        let value = serde_json::to_value(value)?;
        self.serializer.serialize_value(&value)
    }

    /// A raw entry that does not decode to `T` is a terminal miss, per the
    /// error-tolerant serializer contract.
    fn decode<T: DeserializeOwned>(&self, raw: &str) -> Option<T> {
        let value = self.serializer.deserialize_value(raw).ok()?;
        serde_json::from_value(value).ok()
    }

    /// Stores a serialized value, optionally applying a TTL (two-step at
    /// the engine, see [`CacheEngine::set`]).
    pub async fn set<T: Serialize + Sync>(
        &self,
        key: impl Into<CacheKey>,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<bool> {
        let key = self.render(key);
        let raw = self.encode(value)?;
        self.engine.set(&key, raw, ttl).await
    }

    /// Fetches a value. Absence and undecodable entries are `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: impl Into<CacheKey>,
    ) -> CacheResult<Option<T>> {
        let key = self.render(key);
        match self.engine.get(&key).await? {
            Some(raw) => Ok(self.decode(&raw)),
            None => Ok(None),
        }
    }

    /// Deletes a key. Returns `true` if a live key was removed.
    pub async fn delete(&self, key: impl Into<CacheKey>) -> CacheResult<bool> {
        let key = self.render(key);
        self.engine.delete(&key).await
    }

    /// Replaces the TTL of an existing key.
    pub async fn update_ttl(&self, key: impl Into<CacheKey>, ttl: Duration) -> CacheResult<bool> {
        let key = self.render(key);
        self.engine.update_ttl(&key, ttl).await
    }

    /// Pushes a value onto the head of the list at `key`.
    pub async fn list_push<T: Serialize + Sync>(
        &self,
        key: impl Into<CacheKey>,
        value: &T,
    ) -> CacheResult<()> {
        let key = self.render(key);
        let raw = self.encode(value)?;
        self.engine.list_push(&key, raw).await
    }

    /// Returns the index of the first occurrence of `value`, or `None`.
    pub async fn list_position<T: Serialize + Sync>(
        &self,
        key: impl Into<CacheKey>,
        value: &T,
    ) -> CacheResult<Option<u64>> {
        let key = self.render(key);
        let raw = self.encode(value)?;
        self.engine.list_position(&key, &raw).await
    }

    /// Returns the decoded list elements between `start` and `end`
    /// (inclusive, negative indices count from the tail). Entries that do
    /// not decode to `T` are skipped.
    pub async fn list_range<T: DeserializeOwned>(
        &self,
        key: impl Into<CacheKey>,
        start: isize,
        end: isize,
    ) -> CacheResult<Vec<T>> {
        let key = self.render(key);
        let raw = self.engine.list_range(&key, start, end).await?;
        Ok(raw.iter().filter_map(|item| self.decode(item)).collect())
    }

    /// Removes occurrences of `value` from the list (Redis `LREM` count
    /// semantics). Returns the number of removed elements.
    pub async fn list_remove<T: Serialize + Sync>(
        &self,
        key: impl Into<CacheKey>,
        count: isize,
        value: &T,
    ) -> CacheResult<u64> {
        let key = self.render(key);
        let raw = self.encode(value)?;
        self.engine.list_remove(&key, count, &raw).await
    }

    /// Clears the entire namespace. Destructive; intended for tests and ops.
    pub async fn reset_all(&self) -> CacheResult<()> {
        self.engine.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::serializer::MsgPackSerializer;
    use serde_json::{Value, json};

    fn cache() -> Cache {
        Cache::new(Arc::new(MemoryEngine::new()))
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let cache = cache();

        cache.set("answer", &42u32, None).await.unwrap();
        assert_eq!(cache.get::<u32>("answer").await.unwrap(), Some(42));
        assert_eq!(cache.get::<u32>("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_composite_key() {
        let cache = cache();

        cache
            .set(vec!["user", "42", "profile"], &json!({"name": "ada"}), None)
            .await
            .unwrap();
        let value: Option<Value> = cache.get("user_42_profile").await.unwrap();
        assert_eq!(value, Some(json!({"name": "ada"})));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = cache();

        cache.set("k", &"not a number", None).await.unwrap();
        assert_eq!(cache.get::<u64>("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_operations_round_trip_through_serializer() {
        let cache = cache();

        cache.list_push("tokens", &"first").await.unwrap();
        cache.list_push("tokens", &"second").await.unwrap();

        assert_eq!(cache.list_position("tokens", &"first").await.unwrap(), Some(1));
        assert_eq!(
            cache.list_range::<String>("tokens", 0, -1).await.unwrap(),
            vec!["second".to_string(), "first".to_string()]
        );
        assert_eq!(cache.list_remove("tokens", 0, &"first").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_msgpack_serializer_behind_facade() {
        let cache = cache().with_serializer(Arc::new(MsgPackSerializer));
        let value = json!({"graph": [1, 2, {"deep": true}]});

        cache.set("k", &value, None).await.unwrap();
        assert_eq!(cache.get::<Value>("k").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_reset_all() {
        let cache = cache();
        cache.set("k", &1u8, None).await.unwrap();

        cache.reset_all().await.unwrap();
        assert_eq!(cache.get::<u8>("k").await.unwrap(), None);
    }
}
