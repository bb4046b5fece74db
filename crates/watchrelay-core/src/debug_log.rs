use chrono::{SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only plain-text log of network failures and filtering decisions.
///
/// Every line is also emitted at debug level through `tracing`. Write failures
/// are reported as warnings and never interrupt a run.
#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    path: Option<PathBuf>,
}

impl DebugLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Only forwards to `tracing`.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn append(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!(target: "watchrelay::debug_log", "{}", message);

        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = Self::write_line(path, message) {
            tracing::warn!("Failed to write debug log {}: {}", path.display(), e);
        }
    }

    fn write_line(path: &Path, message: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        for line in message.lines() {
            writeln!(file, "[{}] {}", timestamp, line)?;
        }
        Ok(())
    }
}
