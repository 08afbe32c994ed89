//! Authentication error taxonomy.
//!
//! Every failure crossing the public boundary of this crate is one of
//! these kinds; no bare/untyped error escapes. Each kind carries a stable
//! numeric status, a short title and a human-readable detail, and all are
//! terminal at this layer — retries, if any, belong to the caller.

use serde::Serialize;

use tessera_cache::CacheError;

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur during token issuance, verification and
/// revocation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token was supplied where one is required.
    #[error("a token is required to fulfill the request")]
    TokenRequired,

    /// The token is malformed or its signature does not verify.
    #[error("malformed or badly signed token")]
    TokenMalformed,

    /// The token's expiry claim has lapsed.
    #[error("token expired")]
    TokenExpired,

    /// A token of the other class was presented (e.g. a refresh token
    /// where an access token is required).
    #[error("wrong token type")]
    TokenTypeMismatch,

    /// The session-store list check failed: the token was already revoked,
    /// rotated or logged out.
    #[error("session terminated")]
    SessionTerminated,

    /// The configured subject path does not resolve inside the user data.
    /// A structural configuration problem, not a bad request.
    #[error("subject path `{path}` not found in user data")]
    SubjectPath {
        /// The dotted path that failed to resolve.
        path: String,
    },

    /// Catch-all for unexpected decode failures. Diagnostic detail is only
    /// attached when the service runs in debug mode.
    #[error("unknown token validation failure")]
    ValidationFailure {
        /// Diagnostic detail, present only in debug mode.
        detail: Option<String>,
    },

    /// The cache backend failed; surfaced as a generic server error.
    #[error("cache backend failure: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `SubjectPath` error.
    #[must_use]
    pub fn subject_path(path: impl Into<String>) -> Self {
        Self::SubjectPath { path: path.into() }
    }

    /// Creates a new `ValidationFailure` error.
    #[must_use]
    pub fn validation_failure(detail: Option<String>) -> Self {
        Self::ValidationFailure { detail }
    }

    /// Returns the stable numeric status for this error kind.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::TokenRequired
            | Self::TokenMalformed
            | Self::TokenExpired
            | Self::TokenTypeMismatch
            | Self::SessionTerminated
            | Self::ValidationFailure { .. } => 403,
            Self::SubjectPath { .. } => 409,
            Self::Backend { .. } => 500,
        }
    }

    /// Returns the short title for this error kind.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::TokenRequired
            | Self::TokenMalformed
            | Self::TokenExpired
            | Self::TokenTypeMismatch
            | Self::SessionTerminated
            | Self::ValidationFailure { .. } => "Access token error",
            Self::SubjectPath { .. } | Self::Backend { .. } => "Server error",
        }
    }

    /// Returns the human-readable detail for this error kind.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::TokenRequired => "The token is required to fulfill the request.".to_string(),
            Self::TokenMalformed => "Wrong token.".to_string(),
            Self::TokenExpired => {
                "The token has expired. Please refresh the pair or log in again.".to_string()
            }
            Self::TokenTypeMismatch => "Another type of token is expected.".to_string(),
            Self::SessionTerminated => "Your session has been forcibly terminated.".to_string(),
            Self::SubjectPath { .. } => {
                "Issues with token generation. Incorrect user identifier.".to_string()
            }
            Self::ValidationFailure { detail } => match detail {
                Some(detail) => format!("Unknown token validation error: {detail}"),
                None => "Unknown token validation error.".to_string(),
            },
            Self::Backend { .. } => "Unknown server error.".to_string(),
        }
    }

    /// Builds the serializable response body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            status: self.status(),
            title: self.title().to_string(),
            detail: self.detail(),
        }
    }
}

impl From<CacheError> for AuthError {
    fn from(err: CacheError) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}

/// Wire shape of an authentication error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable numeric status.
    pub status: u16,
    /// Short title grouping related kinds.
    pub title: String,
    /// Human-readable detail.
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::TokenRequired.status(), 403);
        assert_eq!(AuthError::TokenExpired.status(), 403);
        assert_eq!(AuthError::SessionTerminated.status(), 403);
        assert_eq!(AuthError::subject_path("data.user.id").status(), 409);
        assert_eq!(
            AuthError::Backend {
                message: "timeout".to_string()
            }
            .status(),
            500
        );
    }

    #[test]
    fn test_validation_failure_detail_is_suppressed_without_debug() {
        let err = AuthError::validation_failure(None);
        assert_eq!(err.detail(), "Unknown token validation error.");

        let err = AuthError::validation_failure(Some("kid mismatch".to_string()));
        assert!(err.detail().contains("kid mismatch"));
    }

    #[test]
    fn test_body_serialization() {
        let body = AuthError::SessionTerminated.body();
        let json = serde_json::to_string(&body).unwrap();

        assert!(json.contains(r#""status":403"#));
        assert!(json.contains(r#""title":"Access token error""#));
        assert!(json.contains("forcibly terminated"));
    }

    #[test]
    fn test_backend_errors_never_leak_cause_in_detail() {
        let err = AuthError::Backend {
            message: "redis://secret-host:6379 unreachable".to_string(),
        };
        assert_eq!(err.detail(), "Unknown server error.");
    }
}
