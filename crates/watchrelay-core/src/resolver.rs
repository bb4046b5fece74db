use crate::debug_log::DebugLog;
use crate::error::SyncError;
use tracing::debug;
use watchrelay_models::MediaIds;
use watchrelay_sources::{SourceError, TraktClient};

/// Maps a show's source identifiers plus season/episode numbers to a Trakt episode id.
///
/// Every call goes to the network; nothing is cached between lookups.
pub struct EpisodeResolver<'a> {
    trakt: &'a TraktClient,
    access_token: &'a str,
    debug_log: &'a DebugLog,
}

impl<'a> EpisodeResolver<'a> {
    pub fn new(trakt: &'a TraktClient, access_token: &'a str, debug_log: &'a DebugLog) -> Self {
        Self {
            trakt,
            access_token,
            debug_log,
        }
    }

    /// `None` when the show has no Trakt slug or the lookup fails. Failures are
    /// recorded in the debug log and never abort the run.
    pub async fn resolve_episode_id(&self, show_ids: &MediaIds, season: u32, episode: u32) -> Option<u64> {
        let Some(slug) = show_ids.trakt_slug() else {
            self.debug_log
                .append(format!("Skipping S{}E{}: show has no Trakt slug", season, episode));
            return None;
        };

        match self.trakt.episode_id(self.access_token, &slug, season, episode).await {
            Ok(id) => {
                debug!("Resolved {} S{}E{} to Trakt episode {}", slug, season, episode, id);
                Some(id)
            }
            Err(e) => {
                let failure = SyncError::ResolutionFailure {
                    slug,
                    season,
                    episode,
                    reason: failure_reason(&e),
                };
                self.debug_log.append(failure.to_string());
                None
            }
        }
    }
}

fn failure_reason(error: &SourceError) -> String {
    match error.status() {
        Some(status) => status.to_string(),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tempfile::TempDir;

    fn ids(slug: Option<&str>) -> MediaIds {
        let mut ids = MediaIds::new();
        ids.insert("simkl", 42);
        if let Some(slug) = slug {
            ids.insert("traktslug", slug);
        }
        ids
    }

    #[tokio::test]
    async fn test_resolves_trakt_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/shows/severance/seasons/1/episodes/3")
            .match_header("authorization", "Bearer trakt-token")
            .with_status(200)
            .with_body(json!({ "season": 1, "number": 3, "ids": { "trakt": 3456789 } }).to_string())
            .create_async()
            .await;

        let trakt = TraktClient::new("id".into(), "secret".into()).with_base_url(server.url());
        let log = DebugLog::disabled();
        let resolver = EpisodeResolver::new(&trakt, "trakt-token", &log);

        assert_eq!(resolver.resolve_episode_id(&ids(Some("severance")), 1, 3).await, Some(3456789));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_slug_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let trakt = TraktClient::new("id".into(), "secret".into()).with_base_url(server.url());
        let log = DebugLog::disabled();
        let resolver = EpisodeResolver::new(&trakt, "trakt-token", &log);

        assert_eq!(resolver.resolve_episode_id(&ids(None), 1, 1).await, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_writes_one_debug_line() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/shows/the-bear/seasons/9/episodes/1")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("debug_log.txt");
        let log = DebugLog::new(log_path.clone());
        let trakt = TraktClient::new("id".into(), "secret".into()).with_base_url(server.url());
        let resolver = EpisodeResolver::new(&trakt, "trakt-token", &log);

        assert_eq!(resolver.resolve_episode_id(&ids(Some("the-bear")), 9, 1).await, None);

        let content = std::fs::read_to_string(log_path).unwrap();
        let failures: Vec<&str> = content
            .lines()
            .filter(|line| line.contains("Failed to fetch Trakt episode ID for the-bear S9E1: 404"))
            .collect();
        assert_eq!(failures.len(), 1);
        mock.assert_async().await;
    }
}
