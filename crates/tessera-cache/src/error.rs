//! Cache error types.

/// Type alias for cache operation results.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur during cache operations.
///
/// Backend-specific response quirks that map cleanly to a miss (for example
/// Redis answering `WRONGTYPE` to a scalar read of a list key) are swallowed
/// by the engines and never surface through this type.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend rejected or failed an operation.
    #[error("cache backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },

    /// A connection could not be obtained from the pool.
    #[error("cache connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// A value could not be serialized for storage.
    #[error("cache serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },
}

impl CacheError {
    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::backend(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::connection(err.to_string())
    }
}

impl From<deadpool_redis::CreatePoolError> for CacheError {
    fn from(err: deadpool_redis::CreatePoolError) -> Self {
        Self::connection(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
