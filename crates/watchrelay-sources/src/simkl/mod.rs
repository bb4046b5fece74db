pub mod api;
pub mod auth;
pub mod client;

pub use api::{SimklAllItems, SimklEpisode, SimklHistory, SimklMovieEntry, SimklSeason, SimklShowEntry};
pub use client::SimklClient;
