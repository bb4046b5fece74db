use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use watchrelay_models::{parse_timestamp, Cutoff, MediaIds, WatchedMovie};
use watchrelay_sources::simkl::api::{SimklMovieEntry, SimklShowEntry};

/// An in-window episode that still needs its Trakt id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeCandidate {
    pub show_ids: MediaIds,
    pub season: u32,
    pub episode: u32,
    pub watched_at: DateTime<Utc>,
}

fn watched_in_window(raw: Option<&str>, cutoff: &Cutoff) -> Option<DateTime<Utc>> {
    let watched_at = parse_timestamp(raw?)?;
    cutoff.includes(watched_at).then_some(watched_at)
}

/// Movies whose last watch falls inside the window, in source order.
pub fn movies_in_window(entries: &[SimklMovieEntry], cutoff: &Cutoff) -> Vec<WatchedMovie> {
    entries
        .iter()
        .filter_map(|entry| {
            let watched_at = watched_in_window(entry.last_watched_at.as_deref(), cutoff)?;
            Some(WatchedMovie {
                watched_at,
                title: entry.movie.title.clone(),
                year: entry.movie.year,
                ids: entry.movie.ids.clone(),
            })
        })
        .collect()
}

/// Flatten show → season → episode and keep the episodes watched inside the window.
///
/// Episodes without a season or episode number, or without a parseable
/// `watched_at`, are skipped.
pub fn episodes_in_window(entries: &[SimklShowEntry], cutoff: &Cutoff) -> Vec<EpisodeCandidate> {
    let mut candidates = Vec::new();

    for entry in entries {
        for season in &entry.seasons {
            let Some(season_number) = season.number else {
                debug!(
                    "Skipping season without a number in {}",
                    entry.show.title.as_deref().unwrap_or("untitled show")
                );
                continue;
            };

            for episode in &season.episodes {
                let Some(episode_number) = episode.number else {
                    continue;
                };
                let Some(watched_at) = watched_in_window(episode.watched_at.as_deref(), cutoff) else {
                    continue;
                };

                candidates.push(EpisodeCandidate {
                    show_ids: entry.show.ids.clone(),
                    season: season_number,
                    episode: episode_number,
                    watched_at,
                });
            }
        }
    }

    candidates
}
