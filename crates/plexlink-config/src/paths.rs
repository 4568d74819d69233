use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Overrides the directory holding config, credentials and logs
const HOME_ENV: &str = "PLEXLINK_HOME";

/// On-disk layout under one root directory:
///
/// ```text
/// <root>/config.toml
/// <root>/credentials.toml
/// <root>/logs/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathManager {
    root: PathBuf,
}

impl PathManager {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$PLEXLINK_HOME` when set, otherwise `plexlink` under the platform config dir
    pub fn new() -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(home));
        }
        dirs::config_dir()
            .map(|dir| Self::at(dir.join("plexlink")))
            .ok_or_else(|| anyhow!("Could not determine config directory, set {}", HOME_ENV))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.root.join("credentials.toml")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::at(".plexlink"))
    }
}
