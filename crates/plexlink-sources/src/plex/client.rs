use async_trait::async_trait;
use plexlink_models::{HomeUser, MetadataRecord, RawHistoryRecord, ServerAccount, ServerHint};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::SourceError;
use crate::plex::api::{PlexHttpClient, ServerInfo};
use crate::traits::MediaServer;

/// `MediaServer` backed by a Plex Media Server
pub struct PlexClient {
    api: PlexHttpClient,
    // Discovered server URL per hint, so discovery runs once per session
    discovered_server_urls: Arc<RwLock<HashMap<ServerHint, String>>>,
}

impl PlexClient {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_api(PlexHttpClient::new()?))
    }

    pub fn with_api(api: PlexHttpClient) -> Self {
        Self {
            api,
            discovered_server_urls: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Server URL: the hinted URL, a cached discovery, or a fresh discovery
    async fn get_server_url(&self, token: &str, server: &ServerHint) -> Result<String, SourceError> {
        if let Some(url) = server.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(url.trim_end_matches('/').to_string());
        }

        {
            let cached = self.discovered_server_urls.read().await;
            if let Some(url) = cached.get(server) {
                debug!("Plex: Using cached discovered server URL: {}", url);
                return Ok(url.clone());
            }
        }

        debug!("Plex: No server URL hint, discovering servers...");
        let servers = self.api.get_servers(token).await?;
        let chosen = pick_server(&servers, server.machine_identifier.as_deref()).ok_or(SourceError::NoServer)?;
        debug!("Plex: Using discovered server: {} ({})", chosen.name, chosen.url);

        let url = chosen.url.trim_end_matches('/').to_string();
        self.discovered_server_urls
            .write()
            .await
            .insert(server.clone(), url.clone());
        Ok(url)
    }
}

/// Prefer the server matching the machine identifier, then a local one, then any
fn pick_server<'a>(servers: &'a [ServerInfo], machine_identifier: Option<&str>) -> Option<&'a ServerInfo> {
    if let Some(wanted) = machine_identifier.filter(|id| !id.is_empty()) {
        if let Some(server) = servers.iter().find(|s| s.identifier == wanted) {
            return Some(server);
        }
    }
    servers.iter().find(|s| s.local).or_else(|| servers.first())
}

#[async_trait]
impl MediaServer for PlexClient {
    async fn fetch_history_page(
        &self,
        token: &str,
        page_size: usize,
        server: &ServerHint,
    ) -> Result<Vec<RawHistoryRecord>, SourceError> {
        let server_url = self.get_server_url(token, server).await?;
        self.api.get_play_history(&server_url, token, page_size).await
    }

    async fn fetch_now_playing(&self, token: &str, server: &ServerHint) -> Result<Vec<RawHistoryRecord>, SourceError> {
        let server_url = self.get_server_url(token, server).await?;
        self.api.get_sessions(&server_url, token).await
    }

    async fn fetch_metadata(
        &self,
        internal_id: &str,
        token: &str,
        server: &ServerHint,
    ) -> Result<Option<MetadataRecord>, SourceError> {
        let server_url = self.get_server_url(token, server).await?;
        self.api.get_metadata_item(&server_url, token, internal_id).await
    }

    async fn fetch_home_users(&self, token: &str) -> Result<Vec<HomeUser>, SourceError> {
        self.api.get_home_users(token).await
    }

    async fn fetch_server_accounts(&self, token: &str, server: &ServerHint) -> Result<Vec<ServerAccount>, SourceError> {
        let server_url = self.get_server_url(token, server).await?;
        self.api.get_accounts(&server_url, token).await
    }

    async fn fetch_current_user(&self, token: &str) -> Result<HomeUser, SourceError> {
        self.api.get_current_user(token).await
    }
}
