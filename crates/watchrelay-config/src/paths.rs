use anyhow::Result;
use std::path::{Path, PathBuf};
use crate::config::FileOptions;

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("WATCHRELAY_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("watchrelay");

        Ok(Self::from_base(base_dir))
    }

    /// Everything under a single directory: config at the top, data and logs below.
    pub fn from_base(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn from_docker_env() -> Self {
        Self::from_base(container_base_path())
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn token_dir(&self) -> PathBuf {
        self.data_dir.join("tokens")
    }

    pub fn raw_history_file(&self) -> PathBuf {
        self.data_dir.join("full_simkl_output.json")
    }

    pub fn filtered_output_file(&self) -> PathBuf {
        self.data_dir.join("simkl_output.json")
    }

    pub fn debug_log_file(&self) -> PathBuf {
        self.log_dir.join("debug_log.txt")
    }

    /// Apply per-file overrides from the config on top of the default layout.
    pub fn resolve(&self, files: &FileOptions) -> OutputPaths {
        OutputPaths {
            token_dir: files.token_dir.clone().unwrap_or_else(|| self.token_dir()),
            raw_history_file: files
                .raw_history_file
                .clone()
                .unwrap_or_else(|| self.raw_history_file()),
            filtered_output_file: files
                .filtered_output_file
                .clone()
                .unwrap_or_else(|| self.filtered_output_file()),
            debug_log_file: files
                .debug_log_file
                .clone()
                .unwrap_or_else(|| self.debug_log_file()),
        }
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base directory, so its presence means Docker
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }

        // Otherwise ~/.config/watchrelay on Linux
        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}

/// Concrete locations of every file a sync run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub token_dir: PathBuf,
    pub raw_history_file: PathBuf,
    pub filtered_output_file: PathBuf,
    pub debug_log_file: PathBuf,
}

impl OutputPaths {
    /// All files inside one directory; used by tests and dry runs.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            token_dir: dir.join("tokens"),
            raw_history_file: dir.join("full_simkl_output.json"),
            filtered_output_file: dir.join("simkl_output.json"),
            debug_log_file: dir.join("debug_log.txt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = PathManager::from_base(PathBuf::from("/srv/watchrelay"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/watchrelay/config.toml"));
        assert_eq!(paths.token_dir(), PathBuf::from("/srv/watchrelay/data/tokens"));
        assert_eq!(paths.debug_log_file(), PathBuf::from("/srv/watchrelay/logs/debug_log.txt"));
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let paths = PathManager::from_base(PathBuf::from("/srv/watchrelay"));
        let files = FileOptions {
            token_dir: Some(PathBuf::from("/secrets")),
            filtered_output_file: Some(PathBuf::from("/tmp/out.json")),
            ..FileOptions::default()
        };

        let resolved = paths.resolve(&files);
        assert_eq!(resolved.token_dir, PathBuf::from("/secrets"));
        assert_eq!(resolved.filtered_output_file, PathBuf::from("/tmp/out.json"));
        assert_eq!(resolved.raw_history_file, PathBuf::from("/srv/watchrelay/data/full_simkl_output.json"));
    }
}
