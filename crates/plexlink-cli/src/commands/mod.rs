pub mod config;
pub mod recent;
pub mod resolve;

use color_eyre::Result;
use plexlink_config::{Config, CredentialStore, PathManager};
use plexlink_core::{IdentityCache, Resolver};
use plexlink_models::ServerHint;
use plexlink_sources::{PlexClient, TmdbClient};
use std::sync::Arc;
use tracing::debug;

/// Clients and the resolver wired up from config and stored credentials
pub struct Session {
    pub config: Config,
    pub token: Option<String>,
    pub server: ServerHint,
    pub plex: Arc<PlexClient>,
    pub resolver: Arc<Resolver>,
}

impl Session {
    /// `require_catalog` fails early when no TMDB API key is stored
    pub fn open(config: Config, path_manager: &PathManager, require_catalog: bool) -> Result<Self> {
        let credentials_file = path_manager.credentials_file();
        let mut cred_store = CredentialStore::new(credentials_file.clone());
        cred_store
            .load()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

        let token = cred_store.get_plex_token().cloned();
        let api_key = match cred_store.get_tmdb_api_key() {
            Some(key) => key.clone(),
            None if require_catalog => {
                return Err(color_eyre::eyre::eyre!(
                    "TMDB API key not configured. Run 'plexlink config tmdb' first."
                ));
            }
            None => String::new(),
        };

        let server = ServerHint {
            url: config.plex.server_url.clone().filter(|u| !u.trim().is_empty()),
            machine_identifier: config.plex.machine_identifier.clone(),
        };
        debug!("Using Plex server hint {:?}", server);

        let plex = Arc::new(PlexClient::new().map_err(|e| color_eyre::eyre::eyre!("Failed to create Plex client: {}", e))?);
        let catalog = Arc::new(TmdbClient::new(api_key, config.tmdb.language.clone()));
        let resolver = Arc::new(Resolver::new(plex.clone(), catalog, Arc::new(IdentityCache::new())));

        Ok(Self {
            config,
            token,
            server,
            plex,
            resolver,
        })
    }

    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| color_eyre::eyre::eyre!("Plex token not configured. Run 'plexlink config plex' first."))
    }
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
