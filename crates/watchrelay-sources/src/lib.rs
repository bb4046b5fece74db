pub mod error;
pub mod prompt;
pub mod simkl;
pub mod trakt;

pub use error::SourceError;
pub use prompt::{AuthorizationPrompt, DeviceAuthorization, NoticePrompt, PollSettings};
pub use simkl::SimklClient;
pub use trakt::TraktClient;
