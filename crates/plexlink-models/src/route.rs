use serde::{Deserialize, Serialize};

/// Catalog (TMDB) identifier
pub type CatalogId = u64;

/// Resolved destination in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogRoute {
    Movie {
        catalog_id: CatalogId,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        poster_path: Option<String>,
    },
    Show {
        catalog_id: CatalogId,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        poster_path: Option<String>,
    },
    Episode {
        show_catalog_id: CatalogId,
        season_number: u32,
        episode_number: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        still_path: Option<String>,
    },
}

impl CatalogRoute {
    pub fn movie(catalog_id: CatalogId) -> Self {
        CatalogRoute::Movie { catalog_id, title: None, poster_path: None }
    }

    pub fn show(catalog_id: CatalogId) -> Self {
        CatalogRoute::Show { catalog_id, title: None, poster_path: None }
    }

    pub fn episode(show_catalog_id: CatalogId, season_number: u32, episode_number: u32) -> Self {
        CatalogRoute::Episode {
            show_catalog_id,
            season_number,
            episode_number,
            title: None,
            still_path: None,
        }
    }

    /// The catalog id of the movie or show this route points at
    pub fn catalog_id(&self) -> CatalogId {
        match self {
            CatalogRoute::Movie { catalog_id, .. } | CatalogRoute::Show { catalog_id, .. } => *catalog_id,
            CatalogRoute::Episode { show_catalog_id, .. } => *show_catalog_id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            CatalogRoute::Movie { title, .. }
            | CatalogRoute::Show { title, .. }
            | CatalogRoute::Episode { title, .. } => title.as_deref(),
        }
    }

    /// Attach a display title (no-op if `title` is None)
    pub fn with_title(mut self, new_title: Option<String>) -> Self {
        if new_title.is_none() {
            return self;
        }
        match &mut self {
            CatalogRoute::Movie { title, .. }
            | CatalogRoute::Show { title, .. }
            | CatalogRoute::Episode { title, .. } => *title = new_title,
        }
        self
    }

    /// Attach artwork: poster for movies/shows, still for episodes
    pub fn with_artwork(mut self, path: Option<String>) -> Self {
        if path.is_none() {
            return self;
        }
        match &mut self {
            CatalogRoute::Movie { poster_path, .. } | CatalogRoute::Show { poster_path, .. } => *poster_path = path,
            CatalogRoute::Episode { still_path, .. } => *still_path = path,
        }
        self
    }
}

impl std::fmt::Display for CatalogRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogRoute::Movie { catalog_id, .. } => write!(f, "movie/{}", catalog_id),
            CatalogRoute::Show { catalog_id, .. } => write!(f, "tv/{}", catalog_id),
            CatalogRoute::Episode { show_catalog_id, season_number, episode_number, .. } => {
                write!(f, "tv/{}/season/{}/episode/{}", show_catalog_id, season_number, episode_number)
            }
        }
    }
}
