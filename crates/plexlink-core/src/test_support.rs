//! In-memory collaborators with call counters

use async_trait::async_trait;
use plexlink_models::{
    CatalogMovie, CatalogShow, HomeUser, MediaKind, MetadataRecord, RawHistoryRecord, ServerAccount, ServerHint,
};
use plexlink_sources::{CatalogSearch, MediaServer, SourceError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

fn unavailable(path: &str) -> SourceError {
    SourceError::Status {
        status: 503,
        url: format!("http://fake{}", path),
    }
}

#[derive(Default)]
pub(crate) struct FakeServer {
    pub metadata: HashMap<String, MetadataRecord>,
    /// Ids whose metadata fetch fails with a transport-like error
    pub failing_metadata: HashSet<String>,
    pub accounts: Vec<ServerAccount>,
    pub fail_accounts: bool,
    pub current_user: Option<HomeUser>,

    pub metadata_calls: AtomicUsize,
    pub accounts_calls: AtomicUsize,
    pub current_user_calls: AtomicUsize,
    pub requested_metadata: Mutex<Vec<String>>,
    /// Signalled on every metadata fetch
    pub metadata_fetched: Notify,
}

impl FakeServer {
    pub fn with_metadata(records: impl IntoIterator<Item = MetadataRecord>) -> Self {
        Self {
            metadata: records
                .into_iter()
                .map(|record| (record.rating_key.clone(), record))
                .collect(),
            ..Default::default()
        }
    }

    pub fn network_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
            + self.accounts_calls.load(Ordering::SeqCst)
            + self.current_user_calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested_metadata.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaServer for FakeServer {
    async fn fetch_history_page(
        &self,
        _token: &str,
        _page_size: usize,
        _server: &ServerHint,
    ) -> Result<Vec<RawHistoryRecord>, SourceError> {
        Ok(Vec::new())
    }

    async fn fetch_now_playing(&self, _token: &str, _server: &ServerHint) -> Result<Vec<RawHistoryRecord>, SourceError> {
        Ok(Vec::new())
    }

    async fn fetch_metadata(
        &self,
        internal_id: &str,
        _token: &str,
        _server: &ServerHint,
    ) -> Result<Option<MetadataRecord>, SourceError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_metadata.lock().unwrap().push(internal_id.to_string());
        self.metadata_fetched.notify_one();
        if self.failing_metadata.contains(internal_id) {
            return Err(unavailable(&format!("/library/metadata/{}", internal_id)));
        }
        Ok(self.metadata.get(internal_id).cloned())
    }

    async fn fetch_home_users(&self, _token: &str) -> Result<Vec<HomeUser>, SourceError> {
        Ok(Vec::new())
    }

    async fn fetch_server_accounts(&self, _token: &str, _server: &ServerHint) -> Result<Vec<ServerAccount>, SourceError> {
        self.accounts_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_accounts {
            return Err(unavailable("/accounts"));
        }
        Ok(self.accounts.clone())
    }

    async fn fetch_current_user(&self, _token: &str) -> Result<HomeUser, SourceError> {
        self.current_user_calls.fetch_add(1, Ordering::SeqCst);
        self.current_user
            .clone()
            .ok_or_else(|| SourceError::InvalidToken("no current user".to_string()))
    }
}

#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub movies: Vec<CatalogMovie>,
    pub shows: Vec<CatalogShow>,
    pub fail: bool,

    pub movie_calls: AtomicUsize,
    pub show_calls: AtomicUsize,
    pub queries: Mutex<Vec<(String, Option<u32>)>>,
}

impl FakeCatalog {
    pub fn with_shows(shows: Vec<CatalogShow>) -> Self {
        Self {
            shows,
            ..Default::default()
        }
    }

    pub fn with_movies(movies: Vec<CatalogMovie>) -> Self {
        Self {
            movies,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.movie_calls.load(Ordering::SeqCst) + self.show_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<(String, Option<u32>)> {
        self.queries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    async fn search_movies(&self, title: &str, year: Option<u32>) -> Result<Vec<CatalogMovie>, SourceError> {
        self.movie_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push((title.to_string(), year));
        if self.fail {
            return Err(unavailable("/3/search/movie"));
        }
        Ok(self.movies.clone())
    }

    async fn search_shows(&self, title: &str, first_air_year: Option<u32>) -> Result<Vec<CatalogShow>, SourceError> {
        self.show_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push((title.to_string(), first_air_year));
        if self.fail {
            return Err(unavailable("/3/search/tv"));
        }
        Ok(self.shows.clone())
    }
}

pub(crate) fn metadata(rating_key: &str, kind: MediaKind, guids: &[&str]) -> MetadataRecord {
    MetadataRecord {
        rating_key: rating_key.to_string(),
        kind,
        guids: guids.iter().map(|g| g.to_string()).collect(),
        ..Default::default()
    }
}

pub(crate) fn show(id: u64, name: &str) -> CatalogShow {
    CatalogShow {
        id,
        name: Some(name.to_string()),
        first_air_date: None,
        poster_path: None,
    }
}

pub(crate) fn movie(id: u64, title: &str) -> CatalogMovie {
    CatalogMovie {
        id,
        title: Some(title.to_string()),
        release_date: None,
        poster_path: None,
    }
}
