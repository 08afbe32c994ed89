//! Cache-backed session store.
//!
//! A session is not a stored record; it is the relationship maintained by
//! two ordered lists per user (active access tokens, active refresh
//! tokens, newest first) plus a bidirectional pointer pair mapping each
//! access token to its refresh token and back. Presence in the type list
//! is the authority for "not yet revoked" — a correctly signed token that
//! is absent from its list is rejected.
//!
//! ## Concurrency
//!
//! The backing cache guarantees atomic single-key operations only; the
//! multi-key sequences here (`rotate`, `revoke_others`, `revoke_pair`) run
//! under a per-user async lock so that the "locate old token in list"
//! check is the single source of truth. A racing second rotation of the
//! same token observes it already absent and fails closed with
//! [`AuthError::SessionTerminated`], guaranteeing at most one successful
//! rotation per token instance.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use tessera_cache::Cache;

use crate::claims::TokenType;
use crate::error::{AuthError, AuthResult};

/// Tracks, per user, the set of currently valid access/refresh token
/// pairs.
pub struct SessionStore {
    cache: Cache,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionStore {
    /// Creates a store over the given cache facade.
    #[must_use]
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            locks: DashMap::new(),
        }
    }

    fn access_list_key(user: &str) -> String {
        format!("user_{user}_access_tokens")
    }

    fn refresh_list_key(user: &str) -> String {
        format!("user_{user}_refresh_tokens")
    }

    fn list_key(user: &str, token_type: TokenType) -> String {
        match token_type {
            TokenType::Access => Self::access_list_key(user),
            TokenType::Refresh => Self::refresh_list_key(user),
        }
    }

    async fn lock_user(&self, user: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(user.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Records a freshly issued pair: pushes both tokens onto their
    /// per-user lists and stores the two cross-pointers, applying `ttl`
    /// to the pointer entries only.
    ///
    /// The lists themselves carry no TTL — they grow until pruned by
    /// removal operations and double as an audit trail of recent logins.
    pub async fn save(
        &self,
        user: &str,
        access: &str,
        refresh: &str,
        ttl: Option<Duration>,
    ) -> AuthResult<()> {
        self.push_pair(user, access, refresh, ttl).await
    }

    // Shared by `save` and the locked sequences below; must not take the
    // user lock itself.
    async fn push_pair(
        &self,
        user: &str,
        access: &str,
        refresh: &str,
        ttl: Option<Duration>,
    ) -> AuthResult<()> {
        self.cache
            .list_push(Self::access_list_key(user).as_str(), &access)
            .await?;
        self.cache
            .list_push(Self::refresh_list_key(user).as_str(), &refresh)
            .await?;
        self.cache.set(access, &refresh, None).await?;
        self.cache.set(refresh, &access, None).await?;
        if let Some(ttl) = ttl {
            self.cache.update_ttl(access, ttl).await?;
            self.cache.update_ttl(refresh, ttl).await?;
        }
        tracing::debug!(user = %user, "session pair saved");
        Ok(())
    }

    /// Replaces `old_token`'s pair with a new one.
    ///
    /// Fails with [`AuthError::SessionTerminated`] when `old_token` is not
    /// in its type list — the pair was already rotated or revoked, and a
    /// replayed rotation must not succeed twice. After success exactly the
    /// new pair is live; the old pair is fully unreachable.
    pub async fn rotate(
        &self,
        user: &str,
        old_token: &str,
        new_access: &str,
        new_refresh: &str,
        ttl: Option<Duration>,
        old_type: TokenType,
    ) -> AuthResult<()> {
        let _guard = self.lock_user(user).await;

        let own_list = Self::list_key(user, old_type);
        if self
            .cache
            .list_position(own_list.as_str(), &old_token)
            .await?
            .is_none()
        {
            return Err(AuthError::SessionTerminated);
        }
        let counterpart: Option<String> = self.cache.get(old_token).await?;

        self.cache.list_remove(own_list.as_str(), 1, &old_token).await?;
        self.cache.delete(old_token).await?;
        if let Some(counterpart) = counterpart {
            let other_list = match old_type {
                TokenType::Access => Self::refresh_list_key(user),
                TokenType::Refresh => Self::access_list_key(user),
            };
            self.cache
                .list_remove(other_list.as_str(), 1, &counterpart.as_str())
                .await?;
            self.cache.delete(counterpart.as_str()).await?;
        }

        self.push_pair(user, new_access, new_refresh, ttl).await?;
        tracing::debug!(user = %user, "session pair rotated");
        Ok(())
    }

    /// Invalidates every session for `user` except the one identified by
    /// `keep_access`.
    ///
    /// Fails with [`AuthError::SessionTerminated`] when `keep_access` is
    /// not in the access list (the caller is already logged out).
    pub async fn revoke_others(&self, user: &str, keep_access: &str) -> AuthResult<()> {
        let _guard = self.lock_user(user).await;

        let access_list = Self::access_list_key(user);
        if self
            .cache
            .list_position(access_list.as_str(), &keep_access)
            .await?
            .is_none()
        {
            return Err(AuthError::SessionTerminated);
        }
        let keep_refresh: String = self
            .cache
            .get(keep_access)
            .await?
            .ok_or(AuthError::SessionTerminated)?;

        self.drain_list(access_list.as_str()).await?;
        self.drain_list(Self::refresh_list_key(user).as_str()).await?;

        self.push_pair(user, keep_access, &keep_refresh, None).await?;
        tracing::debug!(user = %user, "revoked all other sessions");
        Ok(())
    }

    // Deletes every token key referenced by the list, then the list
    // itself.
    async fn drain_list(&self, key: &str) -> AuthResult<()> {
        for token in self.cache.list_range::<String>(key, 0, -1).await? {
            self.cache.delete(token.as_str()).await?;
        }
        self.cache.delete(key).await?;
        Ok(())
    }

    /// Checks that `token` is still live for `user`.
    ///
    /// Both checks are required: the token must exist as a raw key (live
    /// pointer) AND be present in the list of its claimed type. A token
    /// whose list entry was removed independently of its pointer is
    /// treated as logged out.
    pub async fn verify(&self, user: &str, token: &str, token_type: TokenType) -> AuthResult<()> {
        if self.cache.get::<String>(token).await?.is_none() {
            return Err(AuthError::SessionTerminated);
        }
        if self
            .cache
            .list_position(Self::list_key(user, token_type).as_str(), &token)
            .await?
            .is_none()
        {
            return Err(AuthError::SessionTerminated);
        }
        Ok(())
    }

    /// Removes the pair identified by `access` (explicit logout).
    ///
    /// Best-effort: removal is attempted for whatever parts of the pair
    /// still exist.
    pub async fn revoke_pair(&self, user: &str, access: &str) -> AuthResult<()> {
        let _guard = self.lock_user(user).await;

        let refresh: Option<String> = self.cache.get(access).await?;
        if let Some(refresh) = refresh {
            self.cache.delete(refresh.as_str()).await?;
            self.cache
                .list_remove(Self::refresh_list_key(user).as_str(), 0, &refresh.as_str())
                .await?;
        }
        self.cache.delete(access).await?;
        self.cache
            .list_remove(Self::access_list_key(user).as_str(), 0, &access)
            .await?;
        tracing::debug!(user = %user, "session pair revoked");
        Ok(())
    }
}
