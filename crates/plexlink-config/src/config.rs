use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub prefetch: PrefetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlexConfig {
    /// Direct server URL; discovered through plex.tv when absent
    #[serde(default)]
    pub server_url: Option<String>,
    /// Machine identifier used to pick a server during discovery
    #[serde(default)]
    pub machine_identifier: Option<String>,
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,
    /// Max episodes of the same show kept in the recent rail
    #[serde(default = "default_limit_per_show")]
    pub limit_per_show: usize,
    /// Home user ids whose history is shown; empty shows everyone
    #[serde(default)]
    pub preferred_home_user_ids: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TmdbConfig {
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrefetchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_prefetch_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Write logs to this file (rotated daily) instead of stderr.
    /// Relative paths live under the log directory.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn resolved_file(&self, log_dir: &Path) -> Option<PathBuf> {
        let file = self.file.as_ref()?;
        if file.is_absolute() {
            Some(file.clone())
        } else {
            Some(log_dir.join(file))
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_history_page_size() -> usize {
    50
}

fn default_limit_per_show() -> usize {
    3
}

fn default_prefetch_limit() -> usize {
    25
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            machine_identifier: None,
            history_page_size: default_history_page_size(),
            limit_per_show: default_limit_per_show(),
            preferred_home_user_ids: Vec::new(),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            limit: default_prefetch_limit(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, or defaults when it does not exist yet
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.plex.history_page_size == 0 {
            return Err(anyhow::anyhow!("plex.history_page_size must be greater than zero"));
        }
        if self.plex.limit_per_show == 0 {
            return Err(anyhow::anyhow!("plex.limit_per_show must be greater than zero"));
        }
        if let Some(url) = self.plex.server_url.as_deref().filter(|u| !u.trim().is_empty()) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!("plex.server_url must start with http:// or https://: {}", url));
            }
        }
        if self.tmdb.language.trim().is_empty() {
            return Err(anyhow::anyhow!("tmdb.language cannot be empty"));
        }
        Ok(())
    }
}
