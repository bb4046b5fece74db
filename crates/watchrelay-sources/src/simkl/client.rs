use crate::error::SourceError;
use crate::prompt::{AuthorizationPrompt, PollSettings};
use crate::simkl::api::{self, SimklHistory};
use crate::simkl::auth;
use reqwest::Client;
use std::sync::Arc;
use watchrelay_models::{Cutoff, TokenRecord};

pub const DEFAULT_API_URL: &str = "https://api.simkl.com";

#[derive(Clone)]
pub struct SimklClient {
    client: Arc<Client>,
    base_url: String,
    client_id: String,
}

impl SimklClient {
    pub fn new(client_id: String) -> Self {
        Self {
            client: Arc::new(auth::create_simkl_client()),
            base_url: DEFAULT_API_URL.to_string(),
            client_id,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Everything watched since `cutoff`, with per-episode timestamps.
    pub async fn fetch_history(&self, access_token: &str, cutoff: &Cutoff) -> Result<SimklHistory, SourceError> {
        api::get_all_items(&self.client, &self.base_url, access_token, &self.client_id, cutoff).await
    }

    pub async fn authorize_with_pin(
        &self,
        prompt: &dyn AuthorizationPrompt,
        poll: &PollSettings,
    ) -> Result<TokenRecord, SourceError> {
        auth::authorize_with_pin(&self.client, &self.base_url, &self.client_id, prompt, poll).await
    }
}
