use async_trait::async_trait;
use plexlink_models::{
    CatalogMovie, CatalogShow, HomeUser, MetadataRecord, RawHistoryRecord, ServerAccount, ServerHint,
};

use crate::error::SourceError;

/// Media server operations the resolver and history rails depend on
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Most recent watch history, newest first
    async fn fetch_history_page(
        &self,
        token: &str,
        page_size: usize,
        server: &ServerHint,
    ) -> Result<Vec<RawHistoryRecord>, SourceError>;

    /// Currently active playback sessions
    async fn fetch_now_playing(&self, token: &str, server: &ServerHint) -> Result<Vec<RawHistoryRecord>, SourceError>;

    /// Metadata record for an internal id; `Ok(None)` when the server does not know it
    async fn fetch_metadata(
        &self,
        internal_id: &str,
        token: &str,
        server: &ServerHint,
    ) -> Result<Option<MetadataRecord>, SourceError>;

    /// Home user directory of the signed-in account
    async fn fetch_home_users(&self, token: &str) -> Result<Vec<HomeUser>, SourceError>;

    /// Accounts known to the server (numeric account id → display name)
    async fn fetch_server_accounts(&self, token: &str, server: &ServerHint) -> Result<Vec<ServerAccount>, SourceError>;

    /// The signed-in user; on a personal server this is account id 1
    async fn fetch_current_user(&self, token: &str) -> Result<HomeUser, SourceError>;
}

/// Title search against the catalog provider.
///
/// Results are returned in the provider's relevance order.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search_movies(&self, title: &str, year: Option<u32>) -> Result<Vec<CatalogMovie>, SourceError>;

    async fn search_shows(&self, title: &str, first_air_year: Option<u32>) -> Result<Vec<CatalogShow>, SourceError>;
}
