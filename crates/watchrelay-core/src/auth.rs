use crate::debug_log::DebugLog;
use crate::error::SyncError;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use watchrelay_config::{Config, TokenStore, TRAKT_SERVICE};
use watchrelay_models::TokenRecord;
use watchrelay_sources::trakt::auth::authorize_with_device_code;
use watchrelay_sources::{AuthorizationPrompt, PollSettings, TraktClient};

/// Keeps a usable Trakt access token: cached, refreshed, or newly authorized.
pub struct Authenticator {
    trakt: TraktClient,
    store: Arc<dyn TokenStore>,
    prompt: Arc<dyn AuthorizationPrompt>,
    poll: PollSettings,
    debug_log: DebugLog,
}

impl Authenticator {
    pub fn new(
        trakt: TraktClient,
        store: Arc<dyn TokenStore>,
        prompt: Arc<dyn AuthorizationPrompt>,
        poll: PollSettings,
    ) -> Self {
        Self {
            trakt,
            store,
            prompt,
            poll,
            debug_log: DebugLog::disabled(),
        }
    }

    /// Client, redirect URI and poll cadence taken from the `[trakt]` and `[auth]` sections.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn TokenStore>,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Self {
        let trakt = TraktClient::new(config.trakt.client_id.clone(), config.trakt.client_secret.clone())
            .with_base_url(config.trakt.api_url.clone())
            .with_redirect_uri(config.trakt.redirect_uri.clone());
        let poll = PollSettings::new(config.auth.poll_interval(), config.auth.max_poll());
        Self::new(trakt, store, prompt, poll)
    }

    pub fn trakt(&self) -> &TraktClient {
        &self.trakt
    }

    pub fn with_debug_log(mut self, debug_log: DebugLog) -> Self {
        self.debug_log = debug_log;
        self
    }

    /// Return an access token that has not expired.
    ///
    /// A cached token whose expiry is still ahead is returned without any network
    /// call. An expired one is refreshed; if the refresh is refused the device
    /// authorization flow runs instead.
    pub async fn ensure_valid_token(&self) -> Result<String, SyncError> {
        let now = Utc::now();

        match self.load_cached() {
            Some(record) if record.is_fresh_at(now) => {
                debug!(
                    "Using saved Trakt access token (expires at {})",
                    record.expires_at.map(|t| t.to_rfc3339()).unwrap_or_default()
                );
                return Ok(record.access_token);
            }
            Some(record) => {
                info!("Trakt token expired or missing expiration, refreshing");
                match self.refresh(&record).await {
                    Ok(refreshed) => return Ok(refreshed.access_token),
                    Err(SyncError::TokenExpiredNoRefresh(reason)) => {
                        warn!("Trakt token refresh failed, starting device authorization: {}", reason);
                    }
                    Err(e) => return Err(e),
                }
            }
            None => {
                info!("No Trakt token found, starting device authorization");
            }
        }

        self.authorize().await
    }

    /// Skip the cache and run the device authorization flow.
    pub async fn force_authorize(&self) -> Result<String, SyncError> {
        self.authorize().await
    }

    fn load_cached(&self) -> Option<TokenRecord> {
        match self.store.load(TRAKT_SERVICE) {
            Ok(record) => record,
            Err(e) => {
                warn!("Ignoring unreadable Trakt token: {:#}", e);
                None
            }
        }
    }

    async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, SyncError> {
        if !record.has_refresh_token() {
            return Err(SyncError::TokenExpiredNoRefresh("no refresh token stored".to_string()));
        }

        let response = self.trakt.refresh_token(&record.refresh_token).await.map_err(|e| {
            self.debug_log.append(format!("Failed to refresh Trakt token: {}", e));
            SyncError::TokenExpiredNoRefresh(e.to_string())
        })?;

        let refreshed = response.into_record(Utc::now());
        self.persist(&refreshed)?;
        info!("Trakt token refreshed successfully");
        Ok(refreshed)
    }

    async fn authorize(&self) -> Result<String, SyncError> {
        let record = authorize_with_device_code(&self.trakt, self.prompt.as_ref(), &self.poll)
            .await
            .map_err(|e| {
                self.debug_log.append(format!("Trakt device authorization failed: {}", e));
                SyncError::from_auth(e)
            })?;

        self.persist(&record)?;
        info!("Authenticated to Trakt");
        Ok(record.access_token)
    }

    fn persist(&self, record: &TokenRecord) -> Result<(), SyncError> {
        self.store
            .save(TRAKT_SERVICE, record)
            .map_err(SyncError::token_store)
    }
}
