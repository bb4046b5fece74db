pub mod api;
pub mod auth;
pub mod client;

pub use api::{EpisodeSummary, HistorySubmission, TraktUser};
pub use auth::{DeviceCode, DevicePoll, TokenResponse};
pub use client::TraktClient;
