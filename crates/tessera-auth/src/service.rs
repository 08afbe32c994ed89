//! Token codec and lifecycle manager.
//!
//! [`TokenService`] encodes and decodes signed claims and orchestrates
//! issuance, verification, rotation and revocation, delegating all "is
//! this token still known" bookkeeping to the [`SessionStore`] when
//! session tracking is enabled.
//!
//! The service is an explicitly constructed, dependency-injected instance:
//! build it once at the composition root and pass it by reference to
//! request handlers. Configuration is immutable after construction, so
//! concurrent use needs no synchronization beyond what the session store
//! provides internally.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;

use crate::claims::{TokenClaims, TokenType, resolve_subject, subject_string};
use crate::config::TokenConfig;
use crate::error::{AuthError, AuthResult};
use crate::session::SessionStore;

/// Header carrying the access token, as extracted by the request layer.
pub const ACCESS_TOKEN_HEADER: &str = "ACCESS-TOKEN";

/// Header carrying the refresh token.
pub const REFRESH_TOKEN_HEADER: &str = "REFRESH-TOKEN";

/// A freshly minted access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Short-TTL per-request credential.
    pub access_token: String,
    /// Long-TTL credential for minting the next pair.
    pub refresh_token: String,
}

/// Issues, verifies, rotates and revokes paired bearer tokens.
pub struct TokenService {
    config: TokenConfig,
    algorithm: jsonwebtoken::Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    sessions: Option<SessionStore>,
}

impl TokenService {
    /// Creates a service from configuration and an optional session store.
    ///
    /// Tracking is active only when both the config flag is set and a
    /// store is supplied; otherwise the service degrades to pure
    /// signature/expiry/type verification with no revocation before
    /// natural expiry.
    #[must_use]
    pub fn new(config: TokenConfig, sessions: Option<SessionStore>) -> Self {
        let algorithm = config.algorithm.to_jwt_algorithm();
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let sessions = if config.session_tracking {
            sessions
        } else {
            None
        };
        Self {
            config,
            algorithm,
            encoding_key,
            decoding_key,
            sessions,
        }
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Returns `true` when cache-backed session tracking is active.
    #[must_use]
    pub fn session_tracking(&self) -> bool {
        self.sessions.is_some()
    }

    /// Resolves the configured subject path inside a user-data payload.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SubjectPath`] on any missing segment.
    pub fn subject_of(&self, user_data: &Value) -> AuthResult<Value> {
        resolve_subject(user_data, &self.config.subject_path).cloned()
    }

    /// Resolves the subject from a token's embedded claims.
    ///
    /// The token is decoded without re-verifying the signature — structure
    /// only, for use after a primary `verify` already happened upstream.
    pub fn subject_of_token(&self, token: &str) -> AuthResult<String> {
        let claims = self.decode_unchecked(token)?;
        let subject = resolve_subject(&claims.user_data, &self.config.subject_path)?;
        Ok(subject_string(subject))
    }

    fn subject_of_data(&self, user_data: &Value) -> AuthResult<String> {
        let subject = resolve_subject(user_data, &self.config.subject_path)?;
        Ok(subject_string(subject))
    }

    fn encode_token(
        &self,
        user_data: &Value,
        token_type: TokenType,
        ttl: Duration,
    ) -> AuthResult<String> {
        let subject = self.subject_of_data(user_data)?;
        let expires_at = OffsetDateTime::now_utc() + ttl;
        let claims = TokenClaims::new(token_type, subject, user_data.clone(), expires_at);
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|err| self.wrap_unexpected(err.to_string()))
    }

    /// Issues a fresh access/refresh pair carrying `user_data` as an
    /// immutable snapshot.
    ///
    /// When tracking is enabled the pair is recorded in the session store
    /// with the refresh lifetime as pointer TTL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SubjectPath`] when the configured identifier
    /// path does not resolve — a misconfiguration, not a bad request.
    pub async fn issue_pair(
        &self,
        user_data: &Value,
        ttl_access: Option<Duration>,
        ttl_refresh: Option<Duration>,
    ) -> AuthResult<TokenPair> {
        let access = self.encode_token(
            user_data,
            TokenType::Access,
            ttl_access.unwrap_or(self.config.access_token_ttl),
        )?;
        let refresh = self.encode_token(
            user_data,
            TokenType::Refresh,
            ttl_refresh.unwrap_or(self.config.refresh_token_ttl),
        )?;

        if let Some(sessions) = &self.sessions {
            let subject = self.subject_of_data(user_data)?;
            sessions
                .save(
                    &subject,
                    &access,
                    &refresh,
                    Some(self.config.refresh_token_ttl),
                )
                .await?;
            tracing::debug!(user = %subject, "issued token pair");
        }

        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
        })
    }

    /// Verifies a token end to end: signature and expiry, then token
    /// class, then (when tracking is enabled) session-store liveness.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TokenMalformed`] — undecodable or bad signature
    /// - [`AuthError::TokenExpired`] — expiry lapsed
    /// - [`AuthError::TokenTypeMismatch`] — other class presented
    /// - [`AuthError::SessionTerminated`] — revoked, rotated or logged out
    pub async fn verify(&self, token: &str, expected: TokenType) -> AuthResult<TokenClaims> {
        let claims = self.decode_checked(token)?;
        if claims.token_type != expected {
            return Err(AuthError::TokenTypeMismatch);
        }
        if let Some(sessions) = &self.sessions {
            let subject = self.subject_of_data(&claims.user_data)?;
            sessions.verify(&subject, token, expected).await?;
        }
        Ok(claims)
    }

    /// Verifies an optionally supplied token, mapping absence to
    /// [`AuthError::TokenRequired`]. Entry point for the request layer.
    pub async fn authenticate(
        &self,
        token: Option<&str>,
        expected: TokenType,
    ) -> AuthResult<TokenClaims> {
        let token = token.ok_or(AuthError::TokenRequired)?;
        self.verify(token, expected).await
    }

    /// Fully verifies `old_token`, then mints a replacement pair and —
    /// when tracking is enabled — swaps it in atomically with respect to
    /// other rotations of the same user.
    ///
    /// At most one rotation per token instance succeeds: a concurrent
    /// replay observes the old token already gone and fails with
    /// [`AuthError::SessionTerminated`].
    pub async fn rotate_pair(
        &self,
        user_data: &Value,
        old_token: &str,
        old_type: TokenType,
    ) -> AuthResult<TokenPair> {
        self.verify(old_token, old_type).await?;

        let access = self.encode_token(user_data, TokenType::Access, self.config.access_token_ttl)?;
        let refresh =
            self.encode_token(user_data, TokenType::Refresh, self.config.refresh_token_ttl)?;

        if let Some(sessions) = &self.sessions {
            let subject = self.subject_of_data(user_data)?;
            sessions
                .rotate(
                    &subject,
                    old_token,
                    &access,
                    &refresh,
                    Some(self.config.refresh_token_ttl),
                    old_type,
                )
                .await?;
            tracing::debug!(user = %subject, "rotated token pair");
        }

        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
        })
    }

    /// Invalidates every session of the token's subject except the one
    /// identified by `access_token`. No-op when tracking is disabled.
    pub async fn revoke_other_sessions(&self, access_token: &str) -> AuthResult<()> {
        if let Some(sessions) = &self.sessions {
            let subject = self.subject_of_token(access_token)?;
            sessions.revoke_others(&subject, access_token).await?;
            tracing::debug!(user = %subject, "revoked other sessions");
        }
        Ok(())
    }

    /// Logs out the session identified by `access_token`. No-op when
    /// tracking is disabled.
    pub async fn revoke_session(&self, access_token: &str) -> AuthResult<()> {
        if let Some(sessions) = &self.sessions {
            let subject = self.subject_of_token(access_token)?;
            sessions.revoke_pair(&subject, access_token).await?;
            tracing::debug!(user = %subject, "session revoked");
        }
        Ok(())
    }

    fn decode_checked(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| self.map_decode_error(&err))
    }

    // Structure-only decode backing `subject_of_token`; trusts nothing
    // about validity.
    fn decode_unchecked(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::TokenMalformed)
    }

    fn map_decode_error(&self, err: &jsonwebtoken::errors::Error) -> AuthError {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AuthError::TokenMalformed,
            _ => self.wrap_unexpected(err.to_string()),
        }
    }

    // Detail only leaves the process in debug mode.
    fn wrap_unexpected(&self, detail: String) -> AuthError {
        tracing::warn!(detail = %detail, "unexpected token validation failure");
        AuthError::validation_failure(self.config.debug.then_some(detail))
    }
}
