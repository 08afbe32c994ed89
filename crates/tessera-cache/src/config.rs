//! Cache backend configuration.

use serde::{Deserialize, Serialize};

/// Redis connection configuration.
///
/// Connection parameters are supplied externally (environment, config file)
/// by the composition root; nothing here is hardcoded beyond defaults.
///
/// # Example (TOML)
///
/// ```toml
/// [cache]
/// enabled = true
/// host = "redis"
/// port = 6379
/// db = 3
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Enable/disable the cache-backed session store entirely.
    pub enabled: bool,

    /// Redis host name.
    pub host: String,

    /// Redis port.
    pub port: u16,

    /// Optional ACL username.
    pub username: Option<String>,

    /// Optional password.
    pub password: Option<String>,

    /// Logical database index.
    pub db: i64,

    /// Maximum number of pooled connections.
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "redis".to_string(),
            port: 6379,
            username: None,
            password: None,
            db: 0,
            pool_size: 16,
        }
    }
}

impl RedisConfig {
    /// Builds the connection URL for this configuration.
    #[must_use]
    pub fn url(&self) -> String {
        let auth = match (&self.username, &self.password) {
            (Some(user), Some(pass)) => format!("{user}:{pass}@"),
            (Some(user), None) => format!("{user}@"),
            (None, Some(pass)) => format!(":{pass}@"),
            (None, None) => String::new(),
        };
        format!("redis://{auth}{}:{}/{}", self.host, self.port, self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_without_credentials() {
        let config = RedisConfig {
            host: "localhost".to_string(),
            port: 6380,
            db: 3,
            ..RedisConfig::default()
        };
        assert_eq!(config.url(), "redis://localhost:6380/3");
    }

    #[test]
    fn test_url_with_password_only() {
        let config = RedisConfig {
            password: Some("hunter2".to_string()),
            ..RedisConfig::default()
        };
        assert_eq!(config.url(), "redis://:hunter2@redis:6379/0");
    }

    #[test]
    fn test_defaults_deserialize_from_empty_document() {
        let config: RedisConfig = serde_json::from_str("{}").unwrap();
        assert!(config.enabled);
        assert_eq!(config.port, 6379);
        assert_eq!(config.pool_size, 16);
    }
}
