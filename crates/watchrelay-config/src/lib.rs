pub mod config;
pub mod paths;
pub mod token_store;

pub use config::{AuthOptions, Config, FileOptions, SimklConfig, SyncOptions, TraktConfig};
pub use paths::{container_base_path, OutputPaths, PathManager};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, SIMKL_SERVICE, TRAKT_SERVICE};
