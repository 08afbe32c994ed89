//! # tessera-cache
//!
//! Backend-agnostic key/value and ordered-list cache with TTL support.
//!
//! This crate provides:
//! - A capability contract for cache backends ([`CacheEngine`])
//! - Pluggable value serialization ([`CacheSerializer`])
//! - A typed facade over both ([`Cache`])
//! - Two concrete engines: a networked Redis backend ([`RedisEngine`])
//!   and a process-local one for single-instance deployments and tests
//!   ([`MemoryEngine`])
//!
//! ## Overview
//!
//! The facade canonicalizes arbitrary keys into strings, runs values
//! through the configured serializer and dispatches primitive operations
//! to the active engine. Engines are interchangeable: anything satisfying
//! [`CacheEngine`] can back the facade, which is how the session store in
//! `tessera-auth` stays backend-agnostic.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tessera_cache::{Cache, MemoryEngine};
//!
//! let cache = Cache::new(Arc::new(MemoryEngine::new()));
//! cache.set("greeting", &"hello", None).await?;
//! let value: Option<String> = cache.get("greeting").await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod facade;
pub mod key;
pub mod serializer;

pub use config::RedisConfig;
pub use engine::{CacheEngine, MemoryEngine, RedisEngine};
pub use error::{CacheError, CacheResult};
pub use facade::Cache;
pub use key::CacheKey;
pub use serializer::{CacheSerializer, JsonSerializer, MsgPackSerializer};
