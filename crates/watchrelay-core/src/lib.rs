pub mod audit;
pub mod auth;
pub mod debug_log;
pub mod error;
pub mod filter;
pub mod resolver;
pub mod sync;

pub use auth::Authenticator;
pub use debug_log::DebugLog;
pub use error::SyncError;
pub use resolver::EpisodeResolver;
pub use sync::{SubmitOutcome, SyncJob, SyncOptions, SyncReport};
