use crate::error::SourceError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use watchrelay_models::{Cutoff, MediaIds};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimklMovie {
    #[serde(default)]
    pub title: Option<String>,
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: MediaIds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimklMovieEntry {
    pub last_watched_at: Option<String>,
    pub movie: SimklMovie,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimklShow {
    #[serde(default)]
    pub title: Option<String>,
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: MediaIds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimklEpisode {
    pub number: Option<u32>,
    pub watched_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimklSeason {
    pub number: Option<u32>,
    #[serde(default)]
    pub episodes: Vec<SimklEpisode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimklShowEntry {
    pub show: SimklShow,
    #[serde(default)]
    pub seasons: Vec<SimklSeason>,
}

/// Body of `/sync/all-items/`. Either list may be missing when nothing changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimklAllItems {
    #[serde(default)]
    pub movies: Vec<SimklMovieEntry>,
    #[serde(default)]
    pub shows: Vec<SimklShowEntry>,
}

/// A `/sync/all-items/` response body exactly as received.
#[derive(Debug, Clone)]
pub struct SimklHistory {
    pub body: String,
}

impl SimklHistory {
    /// Parse the body. An empty or `null` body means nothing changed. Entries that
    /// do not have the expected shape are skipped one by one.
    pub fn items(&self) -> Result<SimklAllItems, SourceError> {
        let trimmed = self.body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(SimklAllItems::default());
        }

        let raw: Value = serde_json::from_str(trimmed)?;
        let items = SimklAllItems {
            movies: entries(&raw, "movies"),
            shows: entries(&raw, "shows"),
        };

        tracing::debug!(
            "Simkl returned {} movie(s) and {} show(s)",
            items.movies.len(),
            items.shows.len()
        );
        Ok(items)
    }
}

fn entries<T: DeserializeOwned>(raw: &Value, key: &str) -> Vec<T> {
    let Some(list) = raw.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    list.iter()
        .enumerate()
        .filter_map(|(index, entry)| match T::deserialize(entry) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed Simkl {} entry #{}: {}", key, index, e);
                None
            }
        })
        .collect()
}

/// Fetch all items with watch activity since `cutoff`
pub async fn get_all_items(
    client: &Client,
    base_url: &str,
    access_token: &str,
    client_id: &str,
    cutoff: &Cutoff,
) -> Result<SimklHistory, SourceError> {
    let url = format!("{}/sync/all-items/", base_url);

    let response = client
        .get(&url)
        .query(&[
            ("extended", "full".to_string()),
            ("episode_watched_at", "yes".to_string()),
            ("date_from", cutoff.to_query_value()),
        ])
        .header("Authorization", format!("Bearer {}", access_token))
        .header("simkl-api-key", client_id)
        .header("Content-Type", "application/json")
        .send()
        .await?;

    if response.status() != StatusCode::OK {
        return Err(SourceError::from_response("Simkl history fetch", response).await);
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        tracing::debug!("Simkl returned no items since {}", cutoff);
    }
    Ok(SimklHistory { body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simkl::auth::create_simkl_client;
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn cutoff() -> Cutoff {
        Cutoff::at(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_get_all_items_sends_window_and_auth() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/sync/all-items/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("extended".into(), "full".into()),
                Matcher::UrlEncoded("episode_watched_at".into(), "yes".into()),
                Matcher::UrlEncoded("date_from".into(), "2025-02-01T00:00:00.000000Z".into()),
            ]))
            .match_header("authorization", "Bearer simkl-token")
            .match_header("simkl-api-key", "simkl-id")
            .with_status(200)
            .with_body(json!({
                "movies": [{
                    "last_watched_at": "2025-02-01T10:00:00Z",
                    "status": "completed",
                    "movie": { "title": "Dune: Part Two", "year": 2024, "ids": { "simkl": 2162591, "imdb": "tt15239678", "tmdb": "693134" } }
                }],
                "shows": [{
                    "show": { "title": "Severance", "year": 2022, "ids": { "simkl": 1012345, "traktslug": "severance" } },
                    "seasons": [{ "number": 2, "episodes": [{ "number": 3, "watched_at": "2025-02-01T09:00:00Z" }] }]
                }]
            }).to_string())
            .create_async()
            .await;

        let client = create_simkl_client();
        let history = get_all_items(&client, &server.url(), "simkl-token", "simkl-id", &cutoff())
            .await
            .unwrap();

        let items = history.items().unwrap();
        assert_eq!(items.movies.len(), 1);
        assert_eq!(items.movies[0].movie.title.as_deref(), Some("Dune: Part Two"));
        assert_eq!(items.shows[0].show.ids.trakt_slug().as_deref(), Some("severance"));
        assert_eq!(items.shows[0].seasons[0].episodes[0].number, Some(3));
        // Unknown fields survive in the body
        assert!(history.body.contains("\"status\":\"completed\""));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_all_items_empty_body() {
        let mut server = Server::new_async().await;
        let _history = server
            .mock("GET", "/sync/all-items/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let client = create_simkl_client();
        let history = get_all_items(&client, &server.url(), "t", "id", &cutoff()).await.unwrap();
        let items = history.items().unwrap();
        assert!(items.movies.is_empty());
        assert!(items.shows.is_empty());

        let null_body = SimklHistory { body: "null".to_string() };
        assert!(null_body.items().unwrap().movies.is_empty());
    }

    #[test]
    fn test_malformed_entries_are_skipped_individually() {
        let history = SimklHistory {
            body: json!({
                "movies": [
                    { "last_watched_at": "2025-02-01T10:00:00Z", "movie": { "title": null, "ids": { "imdb": "tt0111161" } } },
                    { "last_watched_at": "2025-02-01T11:00:00Z", "movie": "not an object" }
                ],
                "shows": [
                    { "show": { "title": "Too Many Seasons", "ids": {} }, "seasons": [{ "number": 5_000_000_000u64, "episodes": [] }] },
                    { "show": { "title": "Fine", "ids": { "traktslug": "fine" } }, "seasons": [] }
                ]
            })
            .to_string(),
        };

        let items = history.items().unwrap();
        assert_eq!(items.movies.len(), 1);
        assert!(items.movies[0].movie.title.is_none());
        assert_eq!(items.shows.len(), 1);
        assert_eq!(items.shows[0].show.title.as_deref(), Some("Fine"));
    }

    #[test]
    fn test_unparseable_body_is_an_error() {
        let history = SimklHistory { body: "<html>oops</html>".to_string() };
        assert!(history.items().is_err());
    }

    #[tokio::test]
    async fn test_get_all_items_non_200_is_failure() {
        let mut server = Server::new_async().await;
        let _history = server
            .mock("GET", "/sync/all-items/")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("{\"error\":\"user_token_failed\"}")
            .create_async()
            .await;

        let client = create_simkl_client();
        let err = get_all_items(&client, &server.url(), "t", "id", &cutoff()).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("user_token_failed"));
    }
}
