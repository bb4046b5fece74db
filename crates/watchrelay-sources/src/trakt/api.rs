use crate::error::SourceError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use watchrelay_models::WatchedBatch;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktEpisodeIds {
    pub trakt: Option<u64>,
    pub tvdb: Option<u64>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub season: Option<u32>,
    pub number: Option<u32>,
    pub title: Option<String>,
    pub ids: TraktEpisodeIds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktUser {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryCounts {
    #[serde(default)]
    pub movies: u64,
    #[serde(default)]
    pub episodes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotFound {
    #[serde(default)]
    pub movies: Vec<serde_json::Value>,
    #[serde(default)]
    pub episodes: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryResponse {
    #[serde(default)]
    pub added: HistoryCounts,
    #[serde(default)]
    pub not_found: NotFound,
}

/// Result of a history-append call.
#[derive(Debug, Clone, PartialEq)]
pub enum HistorySubmission {
    /// Nothing to send, no request was made
    Skipped,
    Recorded(HistoryResponse),
}

fn with_trakt_headers(request: RequestBuilder, access_token: &str, client_id: &str) -> RequestBuilder {
    request
        .header("Authorization", format!("Bearer {}", access_token))
        .header("trakt-api-version", "2")
        .header("trakt-api-key", client_id)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
}

/// Look up a single episode by show slug and season/episode number
pub async fn get_episode(
    client: &Client,
    base_url: &str,
    access_token: &str,
    client_id: &str,
    show_slug: &str,
    season: u32,
    episode: u32,
) -> Result<EpisodeSummary, SourceError> {
    let url = format!(
        "{}/shows/{}/seasons/{}/episodes/{}",
        base_url,
        urlencoding::encode(show_slug),
        season,
        episode
    );

    let response = with_trakt_headers(client.get(&url), access_token, client_id)
        .send()
        .await?;

    if response.status() != StatusCode::OK {
        return Err(SourceError::from_response("Episode lookup", response).await);
    }

    let summary: EpisodeSummary = response.json().await?;
    if summary.ids.trakt.is_none() {
        return Err(SourceError::UnexpectedResponse(format!(
            "episode {} S{}E{} has no trakt id",
            show_slug, season, episode
        )));
    }
    Ok(summary)
}

/// Append watch events to the user's history. An empty batch is not sent.
pub async fn add_watch_history(
    client: &Client,
    base_url: &str,
    access_token: &str,
    client_id: &str,
    batch: &WatchedBatch,
) -> Result<HistorySubmission, SourceError> {
    if batch.is_empty() {
        debug!("No movies or episodes to sync, skipping Trakt history update");
        return Ok(HistorySubmission::Skipped);
    }

    let response = with_trakt_headers(client.post(format!("{}/sync/history", base_url)), access_token, client_id)
        .json(batch)
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::CREATED {
        return Err(SourceError::from_response("History sync", response).await);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<HistoryResponse>(&body).unwrap_or_else(|e| {
        warn!("Trakt accepted the history update but the response was not understood: {}", e);
        HistoryResponse::default()
    });

    if !parsed.not_found.movies.is_empty() || !parsed.not_found.episodes.is_empty() {
        warn!(
            "Trakt could not match {} movie(s) and {} episode(s)",
            parsed.not_found.movies.len(),
            parsed.not_found.episodes.len()
        );
    }

    Ok(HistorySubmission::Recorded(parsed))
}

/// Fetch the profile the access token belongs to
pub async fn get_current_user(
    client: &Client,
    base_url: &str,
    access_token: &str,
    client_id: &str,
) -> Result<TraktUser, SourceError> {
    let response = with_trakt_headers(client.get(format!("{}/users/me", base_url)), access_token, client_id)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(SourceError::from_response("User lookup", response).await);
    }

    Ok(response.json().await?)
}
