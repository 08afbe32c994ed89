//! Token claims and subject resolution.
//!
//! A token is a signed, self-describing string; nothing here is persisted
//! as an object. The `user_data` claim is an opaque snapshot of whatever
//! the identity provider supplied at issuance time — it is deliberately
//! never refreshed from the source of truth.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// The two token classes of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Short-TTL credential proving recent authentication, used
    /// per-request.
    #[serde(rename = "access_token")]
    Access,
    /// Long-TTL credential used only to mint a new pair.
    #[serde(rename = "refresh_token")]
    Refresh,
}

impl TokenType {
    /// Returns the claim-value spelling of this token type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }

}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Claims embedded in a signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Token class.
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Expiration time (unix timestamp, seconds).
    pub exp: i64,

    /// Stringified user identifier, resolved through the configured
    /// subject path at issuance.
    pub sub: String,

    /// Opaque snapshot of caller-supplied claims, frozen at issuance.
    pub user_data: Value,

    /// Random issuance nonce; keeps same-second issuances from colliding
    /// on an identical signature.
    #[serde(rename = "uuid")]
    pub nonce: Uuid,
}

impl TokenClaims {
    /// Creates claims expiring at `expires_at` with a fresh nonce.
    #[must_use]
    pub fn new(
        token_type: TokenType,
        subject: String,
        user_data: Value,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            token_type,
            exp: expires_at.unix_timestamp(),
            sub: subject,
            user_data,
            nonce: Uuid::new_v4(),
        }
    }
}

/// Walks a dotted path into `user_data` and returns the value at its end.
///
/// # Errors
///
/// Returns [`AuthError::SubjectPath`] if any segment is absent or the
/// terminal value is null.
pub fn resolve_subject<'a>(user_data: &'a Value, path: &str) -> AuthResult<&'a Value> {
    let mut current = user_data;
    for segment in path.split('.') {
        current = current
            .get(segment)
            .ok_or_else(|| AuthError::subject_path(path))?;
    }
    if current.is_null() {
        return Err(AuthError::subject_path(path));
    }
    Ok(current)
}

/// Renders a subject value as the string used in claims and session keys.
///
/// Strings render without quotes; any other value uses its JSON spelling.
#[must_use]
pub fn subject_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested_subject() {
        let data = json!({"data": {"user": {"id": 42}}});
        let subject = resolve_subject(&data, "data.user.id").unwrap();
        assert_eq!(subject, &json!(42));
        assert_eq!(subject_string(subject), "42");
    }

    #[test]
    fn test_resolve_missing_segment_fails() {
        let data = json!({"data": {"account": {"id": 42}}});
        let err = resolve_subject(&data, "data.user.id").unwrap_err();
        assert!(matches!(err, AuthError::SubjectPath { .. }));
    }

    #[test]
    fn test_null_subject_is_structural_error() {
        let data = json!({"id": null});
        assert!(resolve_subject(&data, "id").is_err());
    }

    #[test]
    fn test_string_subject_renders_without_quotes() {
        let data = json!({"id": "ada@example.com"});
        let subject = resolve_subject(&data, "id").unwrap();
        assert_eq!(subject_string(subject), "ada@example.com");
    }

    #[test]
    fn test_claims_wire_format() {
        let claims = TokenClaims::new(
            TokenType::Access,
            "42".to_string(),
            json!({"id": 42}),
            OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        );
        let json = serde_json::to_string(&claims).unwrap();

        assert!(json.contains(r#""type":"access_token""#));
        assert!(json.contains(r#""exp":1700000000"#));
        assert!(json.contains(r#""sub":"42""#));
        assert!(json.contains(r#""uuid":""#));
    }
}
