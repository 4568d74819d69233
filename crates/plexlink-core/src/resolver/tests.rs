use super::*;
use crate::test_support::{metadata, movie, show, FakeCatalog, FakeServer};
use std::sync::atomic::Ordering;

fn resolver(server: &Arc<FakeServer>, catalog: &Arc<FakeCatalog>) -> Resolver {
    Resolver::new(server.clone(), catalog.clone(), Arc::new(IdentityCache::new()))
}

fn episode(id: &str, season: Option<u32>, number: Option<u32>) -> WatchedItem {
    let mut item = WatchedItem::new(id, MediaKind::Episode, "");
    item.season_number = season;
    item.episode_number = number;
    item
}

fn hint() -> ServerHint {
    ServerHint::with_url("http://plex.local:32400")
}

#[tokio::test]
async fn test_missing_token_makes_no_calls() {
    let server = Arc::new(FakeServer::default());
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let mut item = WatchedItem::new("m1", MediaKind::Movie, "Fight Club");

    let failure = resolver.resolve(&item, None, &hint()).await.unwrap_err();
    assert_eq!(failure.step, ResolutionStep::MissingToken);
    assert_eq!(failure.search_query.as_deref(), Some("Fight Club"));

    item.title = "Other".to_string();
    let failure = resolver.resolve(&item, Some("  "), &hint()).await.unwrap_err();
    assert_eq!(failure.step, ResolutionStep::MissingToken);

    assert_eq!(server.network_calls(), 0);
    assert_eq!(catalog.calls(), 0);
}

#[tokio::test]
async fn test_missing_token_wins_over_cache() {
    let server = Arc::new(FakeServer::default());
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    resolver.cache().insert_route("m1", CatalogRoute::movie(550)).await;

    let item = WatchedItem::new("m1", MediaKind::Movie, "Fight Club");
    let failure = resolver.resolve(&item, None, &hint()).await.unwrap_err();
    assert_eq!(failure.step, ResolutionStep::MissingToken);
}

#[tokio::test]
async fn test_cached_show_id_builds_episode_without_network() {
    let server = Arc::new(FakeServer::default());
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    resolver.cache().insert_show_catalog_id("show42", 603).await;

    let mut item = episode("e1", Some(2), Some(5));
    item.series_internal_id = Some("show42".to_string());

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert_eq!(route, CatalogRoute::episode(603, 2, 5));
    assert_eq!(server.network_calls(), 0);
    assert_eq!(catalog.calls(), 0);
    assert_eq!(resolver.cache().route("e1").await, Some(CatalogRoute::episode(603, 2, 5)));
}

#[tokio::test]
async fn test_movie_from_metadata_guid() {
    let server = Arc::new(FakeServer::with_metadata([metadata(
        "m1",
        MediaKind::Movie,
        &["imdb://tt0137523", "themoviedb://550"],
    )]));
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let item = WatchedItem::new("m1", MediaKind::Movie, "Fight Club");

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert_eq!(route.catalog_id(), 550);
    assert!(matches!(route, CatalogRoute::Movie { .. }));
    assert_eq!(catalog.calls(), 0);
}

#[tokio::test]
async fn test_show_kind_from_metadata() {
    let server = Arc::new(FakeServer::with_metadata([metadata("s1", MediaKind::Show, &["tmdb://1399"])]));
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let item = WatchedItem::new("s1", MediaKind::Unknown, "Game of Thrones");

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert!(matches!(route, CatalogRoute::Show { catalog_id: 1399, .. }));
}

#[tokio::test]
async fn test_second_resolve_is_a_cache_hit() {
    let server = Arc::new(FakeServer::with_metadata([metadata("m1", MediaKind::Movie, &["tmdb://550"])]));
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let item = WatchedItem::new("m1", MediaKind::Movie, "Fight Club");

    let first = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    let calls = server.network_calls();
    let second = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(server.network_calls(), calls);
}

#[tokio::test]
async fn test_metadata_failure_falls_back_to_show_search() {
    let server = Arc::new(FakeServer {
        failing_metadata: ["e1".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let catalog = Arc::new(FakeCatalog::with_shows(vec![show(1437, "Firefly"), show(9999, "Firefly (2002)")]));
    let resolver = resolver(&server, &catalog);
    let mut item = episode("e1", Some(1), Some(1));
    item.series_title = Some("Firefly".to_string());

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert_eq!(route, CatalogRoute::episode(1437, 1, 1));
    assert_eq!(catalog.last_query(), Some(("Firefly".to_string(), None)));
    assert_eq!(catalog.movie_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_search_results_is_a_failure() {
    let server = Arc::new(FakeServer::default());
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let item = WatchedItem::new("m404", MediaKind::Movie, "Nonexistent");

    let failure = resolver.resolve(&item, Some("token"), &hint()).await.unwrap_err();
    assert_eq!(failure.step, ResolutionStep::ResolveBySearch);
    assert_eq!(failure.reason.as_deref(), Some("No catalog matches for this title"));
    assert_eq!(failure.search_query.as_deref(), Some("Nonexistent"));
    assert!(!failure.notes.is_empty());
    assert!(resolver.cache().route("m404").await.is_none());
}

#[tokio::test]
async fn test_failure_notes_mention_other_external_ids() {
    let server = Arc::new(FakeServer::with_metadata([metadata("m1", MediaKind::Movie, &["imdb://tt0137523"])]));
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let item = WatchedItem::new("m1", MediaKind::Movie, "Fight Club");

    let failure = resolver.resolve(&item, Some("token"), &hint()).await.unwrap_err();
    assert_eq!(failure.step, ResolutionStep::ResolveBySearch);
    assert!(failure
        .notes
        .iter()
        .any(|note| note == "No TMDB id in guids of m1 (imdb tt0137523)"));
}

#[tokio::test]
async fn test_search_transport_error_is_terminal() {
    let server = Arc::new(FakeServer::default());
    let catalog = Arc::new(FakeCatalog {
        fail: true,
        ..Default::default()
    });
    let resolver = resolver(&server, &catalog);
    let item = WatchedItem::new("m1", MediaKind::Movie, "Fight Club");

    let failure = resolver.resolve(&item, Some("token"), &hint()).await.unwrap_err();
    assert_eq!(failure.step, ResolutionStep::ResolveBySearch);
    assert!(failure.reason.unwrap_or_default().contains("503"));
}

#[tokio::test]
async fn test_movie_search_uses_title_and_year() {
    let server = Arc::new(FakeServer::default());
    let catalog = Arc::new(FakeCatalog::with_movies(vec![movie(550, "Fight Club"), movie(1, "Other")]));
    let resolver = resolver(&server, &catalog);
    let mut item = WatchedItem::new("m1", MediaKind::Movie, "Fight Club");
    item.year = Some(1999);

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert!(matches!(route, CatalogRoute::Movie { catalog_id: 550, .. }));
    assert_eq!(catalog.last_query(), Some(("Fight Club".to_string(), Some(1999))));
}

#[tokio::test]
async fn test_episode_via_parent_show_metadata() {
    let mut episode_meta = metadata("e1", MediaKind::Episode, &[]);
    episode_meta.grandparent_rating_key = Some("show42".to_string());
    episode_meta.parent_index = Some(3);
    episode_meta.index = Some(7);
    let server = Arc::new(FakeServer::with_metadata([
        episode_meta,
        metadata("show42", MediaKind::Show, &["tmdb://603"]),
    ]));
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let item = WatchedItem::new("e1", MediaKind::Episode, "");

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert_eq!(route, CatalogRoute::episode(603, 3, 7));
    assert_eq!(server.requested(), vec!["e1", "show42"]);
    assert_eq!(resolver.cache().show_catalog_id("show42").await, Some(603));
    assert_eq!(catalog.calls(), 0);
}

#[tokio::test]
async fn test_special_episode_numbers_are_kept() {
    let server = Arc::new(FakeServer::with_metadata([metadata("show42", MediaKind::Show, &["tmdb://603"])]));
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let mut item = episode("e0", Some(0), Some(0));
    item.series_internal_id = Some("show42".to_string());

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert_eq!(route, CatalogRoute::episode(603, 0, 0));
}

#[tokio::test]
async fn test_episode_without_numbers_skips_show_lookup() {
    let server = Arc::new(FakeServer::with_metadata([metadata("show42", MediaKind::Show, &["tmdb://603"])]));
    let catalog = Arc::new(FakeCatalog::with_shows(vec![show(603, "Lost")]));
    let resolver = resolver(&server, &catalog);
    let mut item = episode("e1", None, Some(4));
    item.series_internal_id = Some("show42".to_string());
    item.series_title = Some("Lost".to_string());

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert!(matches!(route, CatalogRoute::Show { catalog_id: 603, .. }));
    assert_eq!(server.requested(), vec!["e1"]);
}

#[tokio::test]
async fn test_episode_numbers_missing_note() {
    let server = Arc::new(FakeServer::default());
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let mut item = episode("e1", None, None);
    item.series_title = Some("Lost".to_string());

    let failure = resolver.resolve(&item, Some("token"), &hint()).await.unwrap_err();
    assert!(failure.notes.iter().any(|note| note == "Episode numbers missing"));
    assert_eq!(failure.search_query.as_deref(), Some("Lost"));
}

#[tokio::test]
async fn test_show_metadata_transport_error_is_terminal() {
    let server = Arc::new(FakeServer {
        failing_metadata: ["show42".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let catalog = Arc::new(FakeCatalog::with_shows(vec![show(603, "Lost")]));
    let resolver = resolver(&server, &catalog);
    let mut item = episode("e1", Some(1), Some(2));
    item.series_internal_id = Some("show42".to_string());

    let failure = resolver.resolve(&item, Some("token"), &hint()).await.unwrap_err();
    assert_eq!(failure.step, ResolutionStep::ResolveExternalIds);
    assert_eq!(catalog.calls(), 0);
}

#[tokio::test]
async fn test_show_without_guids_falls_through_to_search() {
    let server = Arc::new(FakeServer::with_metadata([metadata("show42", MediaKind::Show, &["plex://show/abc"])]));
    let catalog = Arc::new(FakeCatalog::with_shows(vec![show(4607, "Lost")]));
    let resolver = resolver(&server, &catalog);
    let mut item = episode("e1", Some(1), Some(2));
    item.series_internal_id = Some("show42".to_string());
    item.series_title = Some("Lost".to_string());
    item.year = Some(2004);

    let route = resolver.resolve(&item, Some("token"), &hint()).await.unwrap();
    assert_eq!(route, CatalogRoute::episode(4607, 1, 2));
    assert_eq!(catalog.last_query(), Some(("Lost".to_string(), Some(2004))));
    assert_eq!(resolver.cache().show_catalog_id("show42").await, None);
}

#[tokio::test]
async fn test_lookup_external_route_ignores_episodes() {
    let server = Arc::new(FakeServer::with_metadata([metadata("e1", MediaKind::Episode, &["tmdb://1"])]));
    let catalog = Arc::new(FakeCatalog::default());
    let resolver = resolver(&server, &catalog);
    let item = WatchedItem::new("e1", MediaKind::Episode, "Pilot");

    let route = resolver.lookup_external_route(&item, "token", &hint()).await.unwrap();
    assert!(route.is_none());
}
