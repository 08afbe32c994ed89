//! Canonical cache key construction.
//!
//! Every facade operation is keyed by a value converted to a canonical
//! string: scalars are stringified as-is, sequences become composite keys
//! joined with the facade's configured separator.

use uuid::Uuid;

/// A cache key before rendering to its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
    /// A single stringified value.
    Atom(String),
    /// A sequence of segments joined with the facade separator.
    Composite(Vec<String>),
}

impl CacheKey {
    /// Renders the key to its canonical string form.
    #[must_use]
    pub fn render(&self, separator: &str) -> String {
        match self {
            Self::Atom(value) => value.clone(),
            Self::Composite(segments) => segments.join(separator),
        }
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self::Atom(value)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self::Atom(value.to_string())
    }
}

impl From<&String> for CacheKey {
    fn from(value: &String) -> Self {
        Self::Atom(value.clone())
    }
}

impl From<u64> for CacheKey {
    fn from(value: u64) -> Self {
        Self::Atom(value.to_string())
    }
}

impl From<i64> for CacheKey {
    fn from(value: i64) -> Self {
        Self::Atom(value.to_string())
    }
}

impl From<Uuid> for CacheKey {
    fn from(value: Uuid) -> Self {
        Self::Atom(value.to_string())
    }
}

impl<S: Into<String>> From<Vec<S>> for CacheKey {
    fn from(segments: Vec<S>) -> Self {
        Self::Composite(segments.into_iter().map(Into::into).collect())
    }
}

impl From<&[&str]> for CacheKey {
    fn from(segments: &[&str]) -> Self {
        Self::Composite(segments.iter().map(ToString::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_renders_verbatim() {
        let key = CacheKey::from("session:abc");
        assert_eq!(key.render("_"), "session:abc");
    }

    #[test]
    fn test_numeric_key_is_stringified() {
        assert_eq!(CacheKey::from(42u64).render("_"), "42");
        assert_eq!(CacheKey::from(-7i64).render("_"), "-7");
    }

    #[test]
    fn test_composite_joins_with_separator() {
        let key = CacheKey::from(vec!["user", "42", "access_tokens"]);
        assert_eq!(key.render("_"), "user_42_access_tokens");
        assert_eq!(key.render(":"), "user:42:access_tokens");
    }
}
