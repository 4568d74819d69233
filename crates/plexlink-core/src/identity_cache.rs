use plexlink_models::{CatalogId, CatalogRoute};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct CacheMaps {
    route_by_watched_item_id: HashMap<String, CatalogRoute>,
    show_catalog_id_by_internal_show_id: HashMap<String, CatalogId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub routes: usize,
    pub shows: usize,
}

/// Session memo of resolved identities.
///
/// Catalog identity never changes, so entries are never invalidated; the cache
/// lives as long as the process. All access goes through one lock, which
/// serializes the interactive resolver and the prefetch loop.
pub struct IdentityCache {
    maps: RwLock<CacheMaps>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self {
            maps: RwLock::new(CacheMaps::default()),
        }
    }

    pub async fn route(&self, watched_item_id: &str) -> Option<CatalogRoute> {
        self.maps.read().await.route_by_watched_item_id.get(watched_item_id).cloned()
    }

    pub async fn insert_route(&self, watched_item_id: &str, route: CatalogRoute) {
        self.maps
            .write()
            .await
            .route_by_watched_item_id
            .insert(watched_item_id.to_string(), route);
    }

    pub async fn show_catalog_id(&self, internal_show_id: &str) -> Option<CatalogId> {
        self.maps
            .read()
            .await
            .show_catalog_id_by_internal_show_id
            .get(internal_show_id)
            .copied()
    }

    pub async fn insert_show_catalog_id(&self, internal_show_id: &str, catalog_id: CatalogId) {
        self.maps
            .write()
            .await
            .show_catalog_id_by_internal_show_id
            .insert(internal_show_id.to_string(), catalog_id);
    }

    pub async fn stats(&self) -> CacheStats {
        let maps = self.maps.read().await;
        CacheStats {
            routes: maps.route_by_watched_item_id.len(),
            shows: maps.show_catalog_id_by_internal_show_id.len(),
        }
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_route_round_trip() {
        let cache = IdentityCache::new();
        assert!(cache.route("m1").await.is_none());

        cache.insert_route("m1", CatalogRoute::movie(550)).await;
        assert_eq!(cache.route("m1").await, Some(CatalogRoute::movie(550)));
        assert_eq!(cache.stats().await, CacheStats { routes: 1, shows: 0 });
    }

    #[tokio::test]
    async fn test_idempotent_writes() {
        let cache = IdentityCache::new();
        cache.insert_show_catalog_id("show42", 603).await;
        cache.insert_show_catalog_id("show42", 603).await;
        assert_eq!(cache.show_catalog_id("show42").await, Some(603));
        assert_eq!(cache.stats().await.shows, 1);
    }
}
