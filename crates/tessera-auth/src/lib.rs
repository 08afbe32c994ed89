//! Token lifecycle management for paired access/refresh credentials.
//!
//! The crate issues signed token pairs, verifies them on every request
//! and tracks live sessions in a shared cache so that rotation, targeted
//! logout and "log out everywhere else" work across server instances.
//!
//! # Architecture
//!
//! - [`TokenService`] — codec and lifecycle orchestration (issue, verify,
//!   rotate, revoke)
//! - [`SessionStore`] — cache-backed bookkeeping of which pairs are live,
//!   with per-user locking around multi-key sequences
//! - [`TokenClaims`] / [`TokenType`] — the signed wire format
//! - [`AuthError`] — the full failure taxonomy with stable statuses
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use tessera_auth::{SessionStore, TokenConfig, TokenService, TokenType};
//! use tessera_cache::{Cache, MemoryEngine};
//!
//! # async fn demo() -> Result<(), tessera_auth::AuthError> {
//! let sessions = SessionStore::new(Cache::new(Arc::new(MemoryEngine::new())));
//! let service = TokenService::new(TokenConfig::default(), Some(sessions));
//!
//! let pair = service.issue_pair(&json!({"id": 7}), None, None).await?;
//! let claims = service.verify(&pair.access_token, TokenType::Access).await?;
//! assert_eq!(claims.sub, "7");
//! # Ok(())
//! # }
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod service;
pub mod session;

pub use claims::{TokenClaims, TokenType, resolve_subject, subject_string};
pub use config::{
    DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL, SigningAlgorithm, TokenConfig,
};
pub use error::{AuthError, AuthResult, ErrorBody};
pub use service::{ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER, TokenPair, TokenService};
pub use session::SessionStore;
