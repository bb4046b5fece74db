use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use watchrelay_models::TokenRecord;

pub const TRAKT_SERVICE: &str = "trakt";
pub const SIMKL_SERVICE: &str = "simkl";

/// Persistence for OAuth token records, keyed by service name.
///
/// `load` returns `Ok(None)` when nothing has been stored yet and an error when a
/// stored record exists but cannot be read.
pub trait TokenStore: Send + Sync {
    fn load(&self, service: &str) -> Result<Option<TokenRecord>>;
    fn save(&self, service: &str, record: &TokenRecord) -> Result<()>;
}

/// One pretty-printed JSON file per service, `<dir>/<service>_token.json`.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, service: &str) -> PathBuf {
        self.dir.join(format!("{}_token.json", service))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, service: &str) -> Result<Option<TokenRecord>> {
        let path = self.path_for(service);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse token file {}", path.display()))?;
        Ok(Some(record))
    }

    fn save(&self, service: &str, record: &TokenRecord) -> Result<()> {
        let path = self.path_for(service);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write token file {}", path.display()))?;
        tracing::debug!("Saved {} token to {}", service, path.display());
        Ok(())
    }
}

/// In-process store for tests and one-shot tooling.
#[derive(Default)]
pub struct MemoryTokenStore {
    records: Mutex<HashMap<String, TokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, service: &str, record: TokenRecord) -> Self {
        if let Ok(mut records) = self.records.lock() {
            records.insert(service.to_string(), record);
        }
        self
    }

    pub fn get(&self, service: &str) -> Option<TokenRecord> {
        self.records.lock().ok()?.get(service).cloned()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self, service: &str) -> Result<Option<TokenRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("token store lock poisoned"))?;
        Ok(records.get(service).cloned())
    }

    fn save(&self, service: &str, record: &TokenRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("token store lock poisoned"))?;
        records.insert(service.to_string(), record.clone());
        Ok(())
    }
}
