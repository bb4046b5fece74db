use thiserror::Error;
use watchrelay_sources::SourceError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Trakt authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Trakt authorization timed out after {0}s")]
    AuthorizationTimedOut(u64),

    #[error("Trakt token could not be refreshed: {0}")]
    TokenExpiredNoRefresh(String),

    #[error("No Simkl token found; run `watchrelay auth simkl` first ({0})")]
    MissingSourceToken(String),

    #[error("Failed to fetch Simkl watch history: {0}")]
    FetchFailure(String),

    #[error("Failed to fetch Trakt episode ID for {slug} S{season}E{episode}: {reason}")]
    ResolutionFailure {
        slug: String,
        season: u32,
        episode: u32,
        reason: String,
    },

    #[error("Failed to sync to Trakt: {0}")]
    SubmitFailure(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Classify an error from the device-code or token exchange.
    pub fn from_auth(error: SourceError) -> Self {
        match error {
            SourceError::AuthorizationTimedOut { waited_secs, .. } => SyncError::AuthorizationTimedOut(waited_secs),
            other => SyncError::AuthenticationFailure(other.to_string()),
        }
    }

    pub fn token_store(error: anyhow::Error) -> Self {
        SyncError::TokenStore(format!("{:#}", error))
    }
}
