use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const PLEX_TOKEN_KEY: &str = "plex_token";
const TMDB_API_KEY: &str = "tmdb_api_key";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Flat key/value credential file (`credentials.toml`)
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_plex_token(&self) -> Option<&String> {
        self.get(PLEX_TOKEN_KEY)
    }

    pub fn set_plex_token(&mut self, token: String) {
        self.set(PLEX_TOKEN_KEY.to_string(), token);
    }

    pub fn get_tmdb_api_key(&self) -> Option<&String> {
        self.get(TMDB_API_KEY)
    }

    pub fn set_tmdb_api_key(&mut self, api_key: String) {
        self.set(TMDB_API_KEY.to_string(), api_key);
    }
}
