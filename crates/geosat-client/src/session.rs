//! Session Management
//!
//! One session per app instance, holding the access/refresh token pair and
//! the first-run flags. The backend stays the source of truth for token
//! validity; the session only remembers what it was given.

use std::sync::Arc;

use geosat_core::{AuthTokens, Result};

use crate::store::{keys, MemoryPreferences, PreferenceStore};

/// A client session backed by a preference store
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn PreferenceStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Session that forgets everything on exit
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPreferences::new()))
    }

    /// Store both tokens after login/signup
    pub async fn login(&self, tokens: &AuthTokens) -> Result<()> {
        self.store.set(keys::ACCESS_TOKEN, &tokens.access).await?;
        self.store.set(keys::REFRESH_TOKEN, &tokens.refresh).await?;
        Ok(())
    }

    /// Destroy the session
    pub async fn logout(&self) -> Result<()> {
        self.store.remove(keys::ACCESS_TOKEN).await?;
        self.store.remove(keys::REFRESH_TOKEN).await?;
        Ok(())
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        self.non_empty(keys::ACCESS_TOKEN).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.non_empty(keys::REFRESH_TOKEN).await
    }

    pub async fn set_access_token(&self, token: &str) -> Result<()> {
        self.store.set(keys::ACCESS_TOKEN, token).await
    }

    pub async fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.store.set(keys::REFRESH_TOKEN, token).await
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token().await?.is_some())
    }

    /// True until [`Session::mark_launched`] is called once
    pub async fn is_first_launch(&self) -> Result<bool> {
        Ok(self.store.get(keys::FIRST_LAUNCH).await?.as_deref() != Some("false"))
    }

    pub async fn mark_launched(&self) -> Result<()> {
        self.store.set(keys::FIRST_LAUNCH, "false").await
    }

    pub async fn policy_accepted(&self) -> Result<bool> {
        Ok(self.store.get(keys::POLICY_ACCEPTED).await?.as_deref() == Some("true"))
    }

    pub async fn accept_policy(&self) -> Result<()> {
        self.store.set(keys::POLICY_ACCEPTED, "true").await
    }

    async fn non_empty(&self, key: &str) -> Result<Option<String>> {
        Ok(self.store.get(key).await?.filter(|v| !v.is_empty()))
    }
}
