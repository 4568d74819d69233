use serde::{Deserialize, Serialize};

use crate::route::CatalogId;

/// Movie search hit from the catalog provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMovie {
    pub id: CatalogId,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
}

/// TV show search hit from the catalog provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogShow {
    pub id: CatalogId,
    pub name: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
}
