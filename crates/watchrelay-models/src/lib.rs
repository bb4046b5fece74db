pub mod cutoff;
pub mod media_ids;
pub mod token;
pub mod watched;

pub use cutoff::{parse_timestamp, Cutoff, DEFAULT_LOOKBACK_HOURS};
pub use media_ids::{MediaIds, TRAKT_SLUG_KEY};
pub use token::TokenRecord;
pub use watched::{EpisodeIds, WatchedBatch, WatchedEpisode, WatchedMovie};
