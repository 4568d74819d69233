use plexlink_models::{
    CatalogId, CatalogRoute, MediaKind, MetadataRecord, ResolutionFailure, ResolutionStep, ServerHint, WatchedItem,
};
use plexlink_sources::{CatalogSearch, MediaServer, SourceError};
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::identity_cache::IdentityCache;

const NO_SEARCH_MATCHES: &str = "No catalog matches for this title";
const EPISODE_NUMBERS_MISSING: &str = "Episode numbers missing";

/// Maps a watched item to its catalog route.
///
/// Stages run in order and stop at the first success:
/// 1. route cache
/// 2. show id cache (episodes with numbers)
/// 3. metadata fetch (failure tolerated)
/// 4. external ids from metadata guids, for episodes via the parent show
/// 5. catalog title search
///
/// Only transport errors in stages 4 and 5 end resolution early.
pub struct Resolver {
    server: Arc<dyn MediaServer>,
    catalog: Arc<dyn CatalogSearch>,
    cache: Arc<IdentityCache>,
}

/// How to treat the item once metadata has (or has not) been fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Episode,
    Show,
    Movie,
}

impl Branch {
    fn from_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Episode => Branch::Episode,
            MediaKind::Show => Branch::Show,
            MediaKind::Movie | MediaKind::Unknown => Branch::Movie,
        }
    }
}

impl Resolver {
    pub fn new(server: Arc<dyn MediaServer>, catalog: Arc<dyn CatalogSearch>, cache: Arc<IdentityCache>) -> Self {
        Self { server, catalog, cache }
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    pub async fn resolve(
        &self,
        item: &WatchedItem,
        token: Option<&str>,
        server: &ServerHint,
    ) -> Result<CatalogRoute, ResolutionFailure> {
        let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                debug!("No Plex token, cannot resolve {}", item.id);
                return Err(ResolutionFailure::new(
                    ResolutionStep::MissingToken,
                    "Sign in to Plex to open items in the catalog",
                    Vec::new(),
                )
                .with_search_query(item.search_query()));
            }
        };

        if let Some(route) = self.cache.route(&item.id).await {
            trace!("Route cache hit for {}", item.id);
            return Ok(route);
        }

        if let Some(route) = self.route_from_show_cache(item).await {
            debug!("Resolved {} from cached show id: {}", item.id, route);
            self.cache.insert_route(&item.id, route.clone()).await;
            return Ok(route);
        }

        let mut notes = Vec::new();
        let mut item = item.clone();

        let metadata = match self.server.fetch_metadata(&item.id, token, server).await {
            Ok(Some(metadata)) => {
                item.enrich_from(&metadata);
                Some(metadata)
            }
            Ok(None) => {
                notes.push(format!("Server has no metadata for {}", item.id));
                None
            }
            Err(e) => {
                debug!("Metadata fetch for {} failed: {}", item.id, e);
                notes.push(format!("{}: {}", ResolutionStep::FetchMetadata, e));
                None
            }
        };

        let kind = metadata
            .as_ref()
            .map(|m| m.kind)
            .filter(|kind| kind.is_known())
            .unwrap_or(item.kind);
        let branch = Branch::from_kind(kind);

        let found = match branch {
            Branch::Episode => self.resolve_episode(&item, token, server, &mut notes).await,
            Branch::Movie | Branch::Show => Ok(self.route_from_guids(metadata.as_ref(), branch, &mut notes)),
        };

        let route = match found {
            Ok(Some(route)) => route,
            Ok(None) => self.resolve_by_search(&item, branch, notes).await?,
            Err(e) => {
                return Err(ResolutionFailure::new(ResolutionStep::ResolveExternalIds, e.to_string(), notes)
                    .with_search_query(item.search_query()));
            }
        };

        info!("Resolved {} ({}) to {}", item.id, item.display_title(), route);
        self.cache.insert_route(&item.id, route.clone()).await;
        Ok(route)
    }

    async fn route_from_show_cache(&self, item: &WatchedItem) -> Option<CatalogRoute> {
        if !item.is_episode() {
            return None;
        }
        let series_id = item.series_internal_id.as_deref()?;
        let (season, episode) = item.episode_numbers()?;
        let show_id = self.cache.show_catalog_id(series_id).await?;
        Some(episode_route(show_id, season, episode, item))
    }

    fn route_from_guids(
        &self,
        metadata: Option<&MetadataRecord>,
        branch: Branch,
        notes: &mut Vec<String>,
    ) -> Option<CatalogRoute> {
        let Some(metadata) = metadata else {
            notes.push("No metadata to read external ids from".to_string());
            return None;
        };
        match route_for_metadata(metadata, branch) {
            Some(route) => Some(route),
            None => {
                let note = match metadata.external_ids().describe_others() {
                    Some(others) => format!("No TMDB id in guids of {} ({})", metadata.rating_key, others),
                    None => format!("No TMDB id in guids of {}", metadata.rating_key),
                };
                notes.push(note);
                None
            }
        }
    }

    /// Episode route via the parent show's external ids. `Ok(None)` means
    /// fall through to search.
    async fn resolve_episode(
        &self,
        item: &WatchedItem,
        token: &str,
        server: &ServerHint,
        notes: &mut Vec<String>,
    ) -> Result<Option<CatalogRoute>, SourceError> {
        let Some((season, episode)) = item.episode_numbers() else {
            notes.push(EPISODE_NUMBERS_MISSING.to_string());
            return Ok(None);
        };
        let Some(series_id) = item.series_internal_id.as_deref() else {
            notes.push("No internal show id to look up".to_string());
            return Ok(None);
        };

        match self.resolve_show_catalog_id(series_id, token, server).await? {
            Some(show_id) => Ok(Some(episode_route(show_id, season, episode, item))),
            None => {
                notes.push(format!("No TMDB id for show {}", series_id));
                Ok(None)
            }
        }
    }

    /// Catalog id of a show by its internal id, from cache or from the show's
    /// own metadata. Found ids are cached.
    pub(crate) async fn resolve_show_catalog_id(
        &self,
        internal_show_id: &str,
        token: &str,
        server: &ServerHint,
    ) -> Result<Option<CatalogId>, SourceError> {
        if let Some(show_id) = self.cache.show_catalog_id(internal_show_id).await {
            return Ok(Some(show_id));
        }

        let metadata = self.server.fetch_metadata(internal_show_id, token, server).await?;
        let show_id = metadata.and_then(|m| m.external_ids().tmdb_id);
        if let Some(show_id) = show_id {
            debug!("Show {} is TMDB {}", internal_show_id, show_id);
            self.cache.insert_show_catalog_id(internal_show_id, show_id).await;
        }
        Ok(show_id)
    }

    /// Movie or show route from the item's own guids, without search.
    /// Found routes are not cached here.
    pub(crate) async fn lookup_external_route(
        &self,
        item: &WatchedItem,
        token: &str,
        server: &ServerHint,
    ) -> Result<Option<CatalogRoute>, SourceError> {
        let metadata = self.server.fetch_metadata(&item.id, token, server).await?;
        Ok(metadata.and_then(|metadata| {
            let kind = if metadata.kind.is_known() { metadata.kind } else { item.kind };
            match Branch::from_kind(kind) {
                Branch::Episode => None,
                branch => route_for_metadata(&metadata, branch),
            }
        }))
    }

    async fn resolve_by_search(
        &self,
        item: &WatchedItem,
        branch: Branch,
        notes: Vec<String>,
    ) -> Result<CatalogRoute, ResolutionFailure> {
        let fail = |reason: String, notes: Vec<String>| {
            ResolutionFailure::new(ResolutionStep::ResolveBySearch, reason, notes)
                .with_search_query(item.search_query())
        };

        let search_shows = branch != Branch::Movie || item.series_title.is_some();
        let query = if search_shows { item.search_query() } else { item.title.as_str() };
        if query.trim().is_empty() {
            return Err(fail("No title to search for".to_string(), notes));
        }

        if !search_shows {
            debug!("Searching movies for {:?} ({:?})", query, item.year);
            let results = match self.catalog.search_movies(query, item.year).await {
                Ok(results) => results,
                Err(e) => return Err(fail(e.to_string(), notes)),
            };
            let Some(movie) = results.into_iter().next() else {
                return Err(fail(NO_SEARCH_MATCHES.to_string(), notes));
            };
            return Ok(CatalogRoute::movie(movie.id)
                .with_title(movie.title.or_else(|| Some(item.title.clone())))
                .with_artwork(movie.poster_path));
        }

        let year = item.year_hint();
        debug!("Searching shows for {:?} ({:?})", query, year);
        let results = match self.catalog.search_shows(query, year).await {
            Ok(results) => results,
            Err(e) => return Err(fail(e.to_string(), notes)),
        };
        let Some(show) = results.into_iter().next() else {
            return Err(fail(NO_SEARCH_MATCHES.to_string(), notes));
        };

        let was_episode = branch == Branch::Episode || item.is_episode();
        match item.episode_numbers() {
            Some((season, episode)) if was_episode => Ok(episode_route(show.id, season, episode, item)),
            _ => Ok(CatalogRoute::show(show.id)
                .with_title(show.name)
                .with_artwork(show.poster_path)),
        }
    }
}

fn route_for_metadata(metadata: &MetadataRecord, branch: Branch) -> Option<CatalogRoute> {
    let catalog_id = metadata.external_ids().tmdb_id?;
    let route = match branch {
        Branch::Show => CatalogRoute::show(catalog_id),
        _ => CatalogRoute::movie(catalog_id),
    };
    Some(route.with_title(metadata.title.clone()))
}

fn episode_route(show_id: CatalogId, season: u32, episode: u32, item: &WatchedItem) -> CatalogRoute {
    let title = Some(item.title.clone()).filter(|t| !t.is_empty());
    CatalogRoute::episode(show_id, season, episode).with_title(title)
}

#[cfg(test)]
mod tests;
