use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const PLACEHOLDER_CLIENT_ID: &str = "YOUR_CLIENT_ID";
const PLACEHOLDER_CLIENT_SECRET: &str = "YOUR_CLIENT_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub simkl: SimklConfig,
    pub trakt: TraktConfig,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub auth: AuthOptions,
    #[serde(default)]
    pub files: FileOptions,
}

/// Source service (read side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimklConfig {
    pub client_id: String,
    #[serde(default = "default_simkl_api_url")]
    pub api_url: String,
}

/// Destination service (write side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_trakt_api_url")]
    pub api_url: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// How far back each run looks for new watches
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthOptions {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound on device authorization polling, applied on top of the
    /// expiry the service reports for the device code
    #[serde(default = "default_max_poll_secs")]
    pub max_poll_secs: u64,
}

/// Optional overrides for the files written by a run. Unset entries fall back to
/// the locations chosen by `PathManager`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_history_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_output_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_simkl_api_url() -> String {
    "https://api.simkl.com".to_string()
}

fn default_trakt_api_url() -> String {
    "https://api.trakt.tv".to_string()
}

fn default_redirect_uri() -> String {
    "urn:ietf:wg:oauth:2.0:oob".to_string()
}

fn default_lookback_hours() -> i64 {
    watchrelay_models::DEFAULT_LOOKBACK_HOURS
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_max_poll_secs() -> u64 {
    600 // Trakt device codes live for 10 minutes
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            lookback_hours: default_lookback_hours(),
        }
    }
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_secs: default_max_poll_secs(),
        }
    }
}

impl AuthOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_poll(&self) -> Duration {
        Duration::from_secs(self.max_poll_secs)
    }
}

impl Config {
    /// Template written by `config init`, with placeholder credentials.
    pub fn template() -> Self {
        Self {
            simkl: SimklConfig {
                client_id: PLACEHOLDER_CLIENT_ID.to_string(),
                api_url: default_simkl_api_url(),
            },
            trakt: TraktConfig {
                client_id: PLACEHOLDER_CLIENT_ID.to_string(),
                client_secret: PLACEHOLDER_CLIENT_SECRET.to_string(),
                api_url: default_trakt_api_url(),
                redirect_uri: default_redirect_uri(),
            },
            sync: SyncOptions::default(),
            auth: AuthOptions::default(),
            files: FileOptions::default(),
        }
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if is_placeholder(&self.simkl.client_id, PLACEHOLDER_CLIENT_ID) {
            return Err(anyhow::anyhow!("simkl.client_id is not configured"));
        }
        if is_placeholder(&self.trakt.client_id, PLACEHOLDER_CLIENT_ID) {
            return Err(anyhow::anyhow!("trakt.client_id is not configured"));
        }
        if is_placeholder(&self.trakt.client_secret, PLACEHOLDER_CLIENT_SECRET) {
            return Err(anyhow::anyhow!("trakt.client_secret is not configured"));
        }
        if self.sync.lookback_hours <= 0 {
            return Err(anyhow::anyhow!("sync.lookback_hours must be positive"));
        }
        if self.auth.poll_interval_secs == 0 {
            return Err(anyhow::anyhow!("auth.poll_interval_secs must be at least 1"));
        }
        if self.auth.max_poll_secs < self.auth.poll_interval_secs {
            return Err(anyhow::anyhow!(
                "auth.max_poll_secs ({}) must not be shorter than auth.poll_interval_secs ({})",
                self.auth.max_poll_secs,
                self.auth.poll_interval_secs
            ));
        }
        Ok(())
    }
}

fn is_placeholder(value: &str, placeholder: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == placeholder
}
