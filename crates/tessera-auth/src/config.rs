//! Token service configuration.

use std::fmt;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token lifetime: 10 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(600);

/// Default refresh token lifetime: 14 days.
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(1_209_600);

/// Supported signing algorithms for issued tokens.
///
/// The algorithm is negotiated at configuration time; key confidentiality
/// is an operational concern outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the token lifecycle service.
///
/// Immutable after construction; the service reads it without
/// synchronization.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// secret = "change-me"
/// algorithm = "HS256"
/// access_token_ttl = "10m"
/// refresh_token_ttl = "14d"
/// subject_path = "id"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Signing secret shared by encode and decode.
    pub secret: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_ttl: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_ttl: Duration,

    /// Dotted path to the user identifier inside the user-data payload,
    /// e.g. `data.user.id` for `{"data": {"user": {"id": 7}}}`.
    pub subject_path: String,

    /// Track sessions in the cache. When disabled, only signature, expiry
    /// and type checks apply and revocation before natural expiry is
    /// impossible.
    pub session_tracking: bool,

    /// Attach diagnostic detail to catch-all validation failures. Never
    /// enable in production responses.
    pub debug: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            // A random secret keeps an unconfigured service from accepting
            // tokens signed elsewhere.
            secret: Uuid::new_v4().to_string(),
            algorithm: SigningAlgorithm::HS256,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            subject_path: "id".to_string(),
            session_tracking: true,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TokenConfig::default();
        assert_eq!(config.algorithm, SigningAlgorithm::HS256);
        assert_eq!(config.access_token_ttl, Duration::from_secs(600));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(1_209_600));
        assert_eq!(config.subject_path, "id");
        assert!(config.session_tracking);
        assert!(!config.debug);
    }

    #[test]
    fn test_deserialize_with_humantime_durations() {
        let config: TokenConfig = serde_json::from_str(
            r#"{
                "secret": "s3cret",
                "algorithm": "HS384",
                "access_token_ttl": "5m",
                "refresh_token_ttl": "7d",
                "subject_path": "data.user.id"
            }"#,
        )
        .unwrap();

        assert_eq!(config.algorithm, SigningAlgorithm::HS384);
        assert_eq!(config.access_token_ttl, Duration::from_secs(300));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.subject_path, "data.user.id");
    }
}
