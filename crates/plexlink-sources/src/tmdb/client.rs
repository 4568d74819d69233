use async_trait::async_trait;
use plexlink_models::{CatalogMovie, CatalogShow};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::SourceError;
use crate::traits::CatalogSearch;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB title search
pub struct TmdbClient {
    http: Client,
    api_key: String,
    language: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: String, language: String) -> Self {
        Self::with_base_url(api_key, language, TMDB_BASE_URL)
    }

    pub fn with_base_url(api_key: String, language: String, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            language,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, path: &str, title: &str, year_param: &str, year: Option<u32>) -> String {
        let mut url = format!(
            "{}{}?query={}&language={}&include_adult=false",
            self.base_url,
            path,
            urlencoding::encode(title),
            urlencoding::encode(&self.language)
        );
        if let Some(y) = year {
            url.push_str(&format!("&{}={}", year_param, y));
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let response = self
            .http
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::decode(format!("TMDB parse error: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MovieResult {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShowResult {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
}

impl From<MovieResult> for CatalogMovie {
    fn from(r: MovieResult) -> Self {
        CatalogMovie {
            id: r.id,
            title: r.title,
            release_date: r.release_date.filter(|d| !d.is_empty()),
            poster_path: r.poster_path,
        }
    }
}

impl From<ShowResult> for CatalogShow {
    fn from(r: ShowResult) -> Self {
        CatalogShow {
            id: r.id,
            name: r.name,
            first_air_date: r.first_air_date.filter(|d| !d.is_empty()),
            poster_path: r.poster_path,
        }
    }
}

#[async_trait]
impl CatalogSearch for TmdbClient {
    async fn search_movies(&self, title: &str, year: Option<u32>) -> Result<Vec<CatalogMovie>, SourceError> {
        let url = self.search_url("/search/movie", title, "year", year);
        let response: SearchResponse<MovieResult> = self.get(&url).await?;
        debug!("TMDB movie search for '{}' (year: {:?}): {} results", title, year, response.results.len());
        Ok(response.results.into_iter().map(CatalogMovie::from).collect())
    }

    async fn search_shows(&self, title: &str, first_air_year: Option<u32>) -> Result<Vec<CatalogShow>, SourceError> {
        let url = self.search_url("/search/tv", title, "first_air_date_year", first_air_year);
        let response: SearchResponse<ShowResult> = self.get(&url).await?;
        debug!(
            "TMDB show search for '{}' (first air year: {:?}): {} results",
            title,
            first_air_year,
            response.results.len()
        );
        Ok(response.results.into_iter().map(CatalogShow::from).collect())
    }
}
