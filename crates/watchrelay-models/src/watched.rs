use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media_ids::MediaIds;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedMovie {
    pub watched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub year: Option<u32>,
    pub ids: MediaIds,
}

/// Trakt identifiers for an episode. The Trakt id is mandatory: episodes that
/// could not be resolved never make it into a batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeIds {
    pub trakt: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedEpisode {
    pub watched_at: DateTime<Utc>,
    pub ids: EpisodeIds,
}

impl WatchedEpisode {
    pub fn new(watched_at: DateTime<Utc>, trakt_id: u64) -> Self {
        Self {
            watched_at,
            ids: EpisodeIds { trakt: trakt_id },
        }
    }
}

/// Filtered watch events for one run; also the body of the history-append request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatchedBatch {
    pub movies: Vec<WatchedMovie>,
    pub episodes: Vec<WatchedEpisode>,
}

impl WatchedBatch {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.episodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movies.len() + self.episodes.len()
    }
}
