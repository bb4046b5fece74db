use crate::error::SourceError;
use crate::trakt::api::{self, HistorySubmission, TraktUser};
use crate::trakt::auth::{self, DeviceCode, DevicePoll, TokenResponse, DEFAULT_REDIRECT_URI};
use reqwest::Client;
use std::sync::Arc;
use watchrelay_models::WatchedBatch;

pub const DEFAULT_API_URL: &str = "https://api.trakt.tv";

#[derive(Clone)]
pub struct TraktClient {
    client: Arc<Client>,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl TraktClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: Arc::new(auth::create_trakt_client()),
            base_url: DEFAULT_API_URL.to_string(),
            client_id,
            client_secret,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub async fn request_device_code(&self) -> Result<DeviceCode, SourceError> {
        auth::request_device_code(&self.client, &self.base_url, &self.client_id).await
    }

    pub async fn poll_device_token(&self, device_code: &str) -> Result<DevicePoll, SourceError> {
        auth::poll_device_token(
            &self.client,
            &self.base_url,
            device_code,
            &self.client_id,
            &self.client_secret,
        )
        .await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, SourceError> {
        auth::refresh_access_token(
            &self.client,
            &self.base_url,
            &self.client_id,
            &self.client_secret,
            &self.redirect_uri,
            refresh_token,
        )
        .await
    }

    pub async fn episode_id(
        &self,
        access_token: &str,
        show_slug: &str,
        season: u32,
        episode: u32,
    ) -> Result<u64, SourceError> {
        api::get_episode(&self.client, &self.base_url, access_token, &self.client_id, show_slug, season, episode)
            .await?
            .ids
            .trakt
            .ok_or_else(|| SourceError::UnexpectedResponse(format!("{} S{}E{} has no trakt id", show_slug, season, episode)))
    }

    pub async fn add_to_history(
        &self,
        access_token: &str,
        batch: &WatchedBatch,
    ) -> Result<HistorySubmission, SourceError> {
        api::add_watch_history(&self.client, &self.base_url, access_token, &self.client_id, batch).await
    }

    pub async fn current_user(&self, access_token: &str) -> Result<TraktUser, SourceError> {
        api::get_current_user(&self.client, &self.base_url, access_token, &self.client_id).await
    }
}
