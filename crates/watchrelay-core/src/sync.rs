use crate::audit;
use crate::auth::Authenticator;
use crate::debug_log::DebugLog;
use crate::error::SyncError;
use crate::filter::{episodes_in_window, movies_in_window};
use crate::resolver::EpisodeResolver;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use watchrelay_config::{Config, OutputPaths, TokenStore, SIMKL_SERVICE};
use watchrelay_models::{Cutoff, WatchedBatch, WatchedEpisode};
use watchrelay_sources::trakt::HistorySubmission;
use watchrelay_sources::{AuthorizationPrompt, SimklClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub lookback: Duration,
    /// Fetch, filter and resolve, but do not append to the Trakt history
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lookback: Duration::hours(config.sync.lookback_hours),
            dry_run: false,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            lookback: Duration::hours(watchrelay_models::DEFAULT_LOOKBACK_HOURS),
            dry_run: false,
        }
    }
}

/// What happened to the filtered batch at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Nothing in the window, no request made
    Skipped,
    DryRun,
    Submitted { added_movies: u64, added_episodes: u64 },
    /// Trakt refused the batch; reported, not retried
    Failed { reason: String },
}

impl SubmitOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SubmitOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub cutoff: Cutoff,
    pub movies: usize,
    pub episodes: usize,
    /// In-window episodes left out because no Trakt id could be found
    pub dropped_episodes: usize,
    pub outcome: SubmitOutcome,
}

/// One pass of Simkl → Trakt history sync.
pub struct SyncJob {
    simkl: SimklClient,
    authenticator: Authenticator,
    store: Arc<dyn TokenStore>,
    paths: OutputPaths,
    debug_log: DebugLog,
    options: SyncOptions,
}

impl SyncJob {
    pub fn new(
        config: &Config,
        paths: OutputPaths,
        store: Arc<dyn TokenStore>,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Self {
        let debug_log = DebugLog::new(paths.debug_log_file.clone());
        let simkl = SimklClient::new(config.simkl.client_id.clone()).with_base_url(config.simkl.api_url.clone());
        let authenticator =
            Authenticator::from_config(config, store.clone(), prompt).with_debug_log(debug_log.clone());

        Self {
            simkl,
            authenticator,
            store,
            paths,
            debug_log,
            options: SyncOptions::from_config(config),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let cutoff = Cutoff::lookback(Utc::now(), self.options.lookback);
        self.run_with_cutoff(cutoff).await
    }

    #[instrument(skip_all, fields(cutoff = %cutoff, dry_run = self.options.dry_run))]
    pub async fn run_with_cutoff(&self, cutoff: Cutoff) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        info!(operation = "sync_start", "Starting Simkl → Trakt sync");

        let simkl_token = self.load_simkl_token()?;
        let trakt_token = self.authenticator.ensure_valid_token().await?;

        self.debug_log
            .append(format!("Filtering for items watched after: {}", cutoff));

        let history = self
            .simkl
            .fetch_history(&simkl_token, &cutoff)
            .await
            .map_err(|e| {
                let failure = SyncError::FetchFailure(e.to_string());
                self.debug_log.append(failure.to_string());
                failure
            })?;

        audit::write_text(&self.paths.raw_history_file, &history.body)?;

        let items = history.items().map_err(|e| {
            let failure = SyncError::FetchFailure(e.to_string());
            self.debug_log.append(failure.to_string());
            failure
        })?;

        let movies = movies_in_window(&items.movies, &cutoff);
        let candidates = episodes_in_window(&items.shows, &cutoff);
        info!(
            "{} movie(s) and {} episode(s) watched since {}",
            movies.len(),
            candidates.len(),
            cutoff
        );

        let resolver = EpisodeResolver::new(self.authenticator.trakt(), &trakt_token, &self.debug_log);
        let mut episodes = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if let Some(trakt_id) = resolver
                .resolve_episode_id(&candidate.show_ids, candidate.season, candidate.episode)
                .await
            {
                episodes.push(WatchedEpisode::new(candidate.watched_at, trakt_id));
            }
        }
        let dropped_episodes = candidates.len() - episodes.len();
        if dropped_episodes > 0 {
            warn!("{} episode(s) dropped without a Trakt id", dropped_episodes);
        }

        let batch = WatchedBatch { movies, episodes };
        audit::write_json(&self.paths.filtered_output_file, &batch)?;
        self.debug_log.append(format!(
            "Episodes After Filtering:\n{}",
            serde_json::to_string_pretty(&batch.episodes)?
        ));

        let outcome = self.submit(&trakt_token, &batch).await;

        info!(
            operation = "sync_complete",
            movies = batch.movies.len(),
            episodes = batch.episodes.len(),
            dropped_episodes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Sync finished: {:?}",
            outcome
        );

        Ok(SyncReport {
            cutoff,
            movies: batch.movies.len(),
            episodes: batch.episodes.len(),
            dropped_episodes,
            outcome,
        })
    }

    fn load_simkl_token(&self) -> Result<String, SyncError> {
        match self.store.load(SIMKL_SERVICE) {
            Ok(Some(record)) if !record.access_token.trim().is_empty() => Ok(record.access_token),
            Ok(_) => Err(SyncError::MissingSourceToken("no token stored".to_string())),
            Err(e) => Err(SyncError::MissingSourceToken(format!("{:#}", e))),
        }
    }

    async fn submit(&self, trakt_token: &str, batch: &WatchedBatch) -> SubmitOutcome {
        if self.options.dry_run {
            info!("Dry run: not sending {} item(s) to Trakt", batch.len());
            return SubmitOutcome::DryRun;
        }

        match self.authenticator.trakt().add_to_history(trakt_token, batch).await {
            Ok(HistorySubmission::Skipped) => SubmitOutcome::Skipped,
            Ok(HistorySubmission::Recorded(response)) => {
                info!(
                    "Trakt added {} movie(s) and {} episode(s)",
                    response.added.movies, response.added.episodes
                );
                SubmitOutcome::Submitted {
                    added_movies: response.added.movies,
                    added_episodes: response.added.episodes,
                }
            }
            Err(e) => {
                let failure = SyncError::SubmitFailure(e.to_string());
                tracing::error!("{}", failure);
                self.debug_log.append(failure.to_string());
                SubmitOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{SecondsFormat, TimeZone};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use tempfile::TempDir;
    use watchrelay_config::{MemoryTokenStore, TRAKT_SERVICE};
    use watchrelay_models::TokenRecord;
    use watchrelay_sources::NoticePrompt;

    fn cutoff() -> Cutoff {
        Cutoff::at(Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap())
    }

    fn at(hours_after_cutoff: i64) -> String {
        (cutoff().timestamp() + Duration::hours(hours_after_cutoff)).to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn config(server: &ServerGuard) -> Config {
        let mut config = Config::template();
        config.simkl.client_id = "simkl-id".to_string();
        config.simkl.api_url = server.url();
        config.trakt.client_id = "trakt-id".to_string();
        config.trakt.client_secret = "trakt-secret".to_string();
        config.trakt.api_url = server.url();
        config
    }

    fn store_with_tokens() -> Arc<MemoryTokenStore> {
        Arc::new(
            MemoryTokenStore::new()
                .with_record(SIMKL_SERVICE, TokenRecord::without_expiry("simkl-token".into()))
                .with_record(
                    TRAKT_SERVICE,
                    TokenRecord::issued("trakt-token".into(), "refresh".into(), 86400, Utc::now()),
                ),
        )
    }

    fn job(server: &ServerGuard, dir: &TempDir, store: Arc<MemoryTokenStore>) -> SyncJob {
        SyncJob::new(&config(server), OutputPaths::in_dir(dir.path()), store, Arc::new(NoticePrompt))
    }

    async fn history_mock(server: &mut ServerGuard, body: serde_json::Value) -> mockito::Mock {
        server
            .mock("GET", "/sync/all-items/")
            .match_query(Matcher::UrlEncoded("date_from".into(), cutoff().to_query_value()))
            .match_header("authorization", "Bearer simkl-token")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_full_run_submits_resolved_batch() {
        let mut server = Server::new_async().await;
        let history = history_mock(
            &mut server,
            json!({
                "movies": [
                    { "last_watched_at": at(2), "movie": { "title": "Past Lives", "year": 2023, "ids": { "imdb": "tt13238346" } } },
                    { "last_watched_at": at(-8), "movie": { "title": "Old Watch", "year": 1999, "ids": { "imdb": "tt0000001" } } }
                ],
                "shows": [
                    {
                        "show": { "title": "Slow Horses", "ids": { "traktslug": "slow-horses" } },
                        "seasons": [{ "number": 4, "episodes": [{ "number": 2, "watched_at": at(1) }] }]
                    },
                    {
                        "show": { "title": "No Slug Show", "ids": { "simkl": 99 } },
                        "seasons": [{ "number": 1, "episodes": [{ "number": 1, "watched_at": at(1) }] }]
                    }
                ]
            }),
        )
        .await;
        let lookup = server
            .mock("GET", "/shows/slow-horses/seasons/4/episodes/2")
            .match_header("authorization", "Bearer trakt-token")
            .with_status(200)
            .with_body(json!({ "season": 4, "number": 2, "ids": { "trakt": 11223344 } }).to_string())
            .create_async()
            .await;
        let submit = server
            .mock("POST", "/sync/history")
            .match_body(Matcher::PartialJson(json!({
                "movies": [{ "title": "Past Lives", "year": 2023, "ids": { "imdb": "tt13238346" } }],
                "episodes": [{ "ids": { "trakt": 11223344 } }]
            })))
            .with_status(201)
            .with_body(json!({ "added": { "movies": 1, "episodes": 1 } }).to_string())
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let report = job(&server, &dir, store_with_tokens()).run_with_cutoff(cutoff()).await.unwrap();

        assert_eq!(report.movies, 1);
        assert_eq!(report.episodes, 1);
        assert_eq!(report.dropped_episodes, 1);
        assert_eq!(
            report.outcome,
            SubmitOutcome::Submitted { added_movies: 1, added_episodes: 1 }
        );

        let paths = OutputPaths::in_dir(dir.path());
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.raw_history_file).unwrap()).unwrap();
        assert_eq!(raw["movies"].as_array().unwrap().len(), 2);

        let filtered: WatchedBatch =
            serde_json::from_str(&std::fs::read_to_string(&paths.filtered_output_file).unwrap()).unwrap();
        assert_eq!(filtered.episodes, vec![WatchedEpisode::new(cutoff().timestamp() + Duration::hours(1), 11223344)]);

        let log = std::fs::read_to_string(&paths.debug_log_file).unwrap();
        assert!(log.contains("Filtering for items watched after: 2025-05-20T08:00:00.000000Z"));
        assert!(log.contains("Episodes After Filtering:"));

        history.assert_async().await;
        lookup.assert_async().await;
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_window_makes_no_submit_call() {
        let mut server = Server::new_async().await;
        let _history = history_mock(
            &mut server,
            json!({ "movies": [{ "last_watched_at": at(-1), "movie": { "title": "Too Old", "ids": {} } }] }),
        )
        .await;
        let submit = server.mock("POST", "/sync/history").expect(0).create_async().await;

        let dir = TempDir::new().unwrap();
        let report = job(&server, &dir, store_with_tokens()).run_with_cutoff(cutoff()).await.unwrap();

        assert_eq!(report.outcome, SubmitOutcome::Skipped);
        assert_eq!(report.movies + report.episodes, 0);
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_unresolved_episode_is_dropped_and_logged_once() {
        let mut server = Server::new_async().await;
        let _history = history_mock(
            &mut server,
            json!({
                "shows": [{
                    "show": { "title": "Gone", "ids": { "traktslug": "gone-show" } },
                    "seasons": [{ "number": 3, "episodes": [{ "number": 7, "watched_at": at(0) }] }]
                }]
            }),
        )
        .await;
        let _lookup = server
            .mock("GET", "/shows/gone-show/seasons/3/episodes/7")
            .with_status(404)
            .create_async()
            .await;
        let submit = server.mock("POST", "/sync/history").expect(0).create_async().await;

        let dir = TempDir::new().unwrap();
        let report = job(&server, &dir, store_with_tokens()).run_with_cutoff(cutoff()).await.unwrap();

        assert_eq!(report.episodes, 0);
        assert_eq!(report.dropped_episodes, 1);
        let log = std::fs::read_to_string(OutputPaths::in_dir(dir.path()).debug_log_file).unwrap();
        assert_eq!(
            log.lines()
                .filter(|l| l.contains("Failed to fetch Trakt episode ID for gone-show S3E7: 404"))
                .count(),
            1
        );
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_dry_run_skips_submit_but_writes_audit_files() {
        let mut server = Server::new_async().await;
        let _history = history_mock(
            &mut server,
            json!({ "movies": [{ "last_watched_at": at(3), "movie": { "title": "Aftersun", "year": 2022, "ids": { "tmdb": 965150 } } }] }),
        )
        .await;
        let submit = server.mock("POST", "/sync/history").expect(0).create_async().await;

        let dir = TempDir::new().unwrap();
        let options = SyncOptions { lookback: Duration::hours(12), dry_run: true };
        let report = job(&server, &dir, store_with_tokens())
            .with_options(options)
            .run_with_cutoff(cutoff())
            .await
            .unwrap();

        assert_eq!(report.outcome, SubmitOutcome::DryRun);
        assert_eq!(report.movies, 1);
        assert!(OutputPaths::in_dir(dir.path()).filtered_output_file.exists());
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_failure_is_reported_not_raised() {
        let mut server = Server::new_async().await;
        let _history = history_mock(
            &mut server,
            json!({ "movies": [{ "last_watched_at": at(1), "movie": { "title": "Nope", "ids": { "imdb": "tt10954984" } } }] }),
        )
        .await;
        let _submit = server
            .mock("POST", "/sync/history")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let report = job(&server, &dir, store_with_tokens()).run_with_cutoff(cutoff()).await.unwrap();

        assert!(report.outcome.is_failure());
        let log = std::fs::read_to_string(OutputPaths::in_dir(dir.path()).debug_log_file).unwrap();
        assert!(log.contains("500"));
        assert!(log.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal_and_logged() {
        let mut server = Server::new_async().await;
        let _history = server
            .mock("GET", "/sync/all-items/")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let err = job(&server, &dir, store_with_tokens()).run_with_cutoff(cutoff()).await.unwrap_err();

        assert!(matches!(err, SyncError::FetchFailure(_)));
        let log = std::fs::read_to_string(OutputPaths::in_dir(dir.path()).debug_log_file).unwrap();
        assert!(log.contains("Failed to fetch Simkl watch history"));
        assert!(log.contains("502"));
        assert!(!OutputPaths::in_dir(dir.path()).raw_history_file.exists());
    }

    #[tokio::test]
    async fn test_raw_history_saved_as_received_before_parsing() {
        let mut server = Server::new_async().await;
        let body = format!(
            r#"{{"shows":[],"movies":[{{"last_watched_at":"{}","movie":{{"title":null,"ids":{{"imdb":"tt0111161"}}}}}},{{"last_watched_at":"{}","movie":42}}]}}"#,
            at(1),
            at(2)
        );
        let _history = server
            .mock("GET", "/sync/all-items/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;
        let submit = server
            .mock("POST", "/sync/history")
            .match_body(Matcher::PartialJson(json!({ "movies": [{ "ids": { "imdb": "tt0111161" } }] })))
            .with_status(201)
            .with_body(json!({ "added": { "movies": 1, "episodes": 0 } }).to_string())
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let report = job(&server, &dir, store_with_tokens()).run_with_cutoff(cutoff()).await.unwrap();

        assert_eq!(report.movies, 1);
        let paths = OutputPaths::in_dir(dir.path());
        assert_eq!(std::fs::read_to_string(&paths.raw_history_file).unwrap(), body);
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_unparseable_history_is_fatal_after_raw_dump() {
        let mut server = Server::new_async().await;
        let _history = server
            .mock("GET", "/sync/all-items/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let err = job(&server, &dir, store_with_tokens()).run_with_cutoff(cutoff()).await.unwrap_err();

        assert!(matches!(err, SyncError::FetchFailure(_)));
        let paths = OutputPaths::in_dir(dir.path());
        assert_eq!(
            std::fs::read_to_string(&paths.raw_history_file).unwrap(),
            "<html>maintenance</html>"
        );
        assert!(!paths.filtered_output_file.exists());
    }

    #[tokio::test]
    async fn test_missing_simkl_token_stops_before_network() {
        let mut server = Server::new_async().await;
        let any = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryTokenStore::new());
        let err = job(&server, &dir, store).run_with_cutoff(cutoff()).await.unwrap_err();

        assert!(matches!(err, SyncError::MissingSourceToken(_)));
        any.assert_async().await;
    }
}
