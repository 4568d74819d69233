use serde::{Deserialize, Serialize};

use crate::route::CatalogId;

/// Cross-reference identifiers extracted from media server guids
///
/// Guids look like:
/// - "tmdb://550" (new Plex agents)
/// - "com.plexapp.agents.themoviedb://550?lang=en" (legacy agents)
/// - "imdb://tt0137523"
/// - "tvdb://81189"
/// - "plex://movie/5d776b5e1e5c36001f8e9b8a" (Plex-internal, ignored)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalIds {
    pub tmdb_id: Option<CatalogId>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<u64>,
}

impl ExternalIds {
    /// Extract all ids from a list of guid strings; the first hit per namespace wins
    pub fn from_guids<I, S>(guids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids = ExternalIds::default();
        for guid in guids {
            let guid = guid.as_ref();
            if ids.tmdb_id.is_none() {
                ids.tmdb_id = parse_tmdb_from_guid(guid);
            }
            if ids.imdb_id.is_none() {
                ids.imdb_id = parse_imdb_from_guid(guid);
            }
            if ids.tvdb_id.is_none() {
                ids.tvdb_id = parse_tvdb_from_guid(guid);
            }
        }
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.tmdb_id.is_none() && self.imdb_id.is_none() && self.tvdb_id.is_none()
    }

    /// Non-TMDB ids for failure notes, e.g. "imdb tt0137523, tvdb 81189"
    pub fn describe_others(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(imdb) = &self.imdb_id {
            parts.push(format!("imdb {}", imdb));
        }
        if let Some(tvdb) = self.tvdb_id {
            parts.push(format!("tvdb {}", tvdb));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Value after `<namespace>://`, cut at the first path/query separator
fn guid_value<'a>(guid: &'a str, namespace: &str) -> Option<&'a str> {
    let marker = format!("{}://", namespace);
    let start = guid.find(&marker)?;
    // "tmdb://" must not match inside another namespace such as "xtmdb://"
    if start > 0 {
        let prev = guid[..start].chars().last()?;
        if prev.is_ascii_alphanumeric() {
            return None;
        }
    }
    let value = &guid[start + marker.len()..];
    value
        .split(|c| c == '?' || c == '&' || c == '/')
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parse a TMDB id from "tmdb://" or "themoviedb://" guids
fn parse_tmdb_from_guid(guid: &str) -> Option<CatalogId> {
    guid_value(guid, "tmdb")
        .or_else(|| guid_value(guid, "themoviedb"))
        .and_then(|v| v.parse::<CatalogId>().ok())
}

fn parse_imdb_from_guid(guid: &str) -> Option<String> {
    let id = guid_value(guid, "imdb")?;
    // tt followed by at least seven digits
    if id.starts_with("tt") && id.len() >= 9 && id[2..].chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

fn parse_tvdb_from_guid(guid: &str) -> Option<u64> {
    guid_value(guid, "tvdb")
        .or_else(|| guid_value(guid, "thetvdb"))
        .and_then(|v| v.parse::<u64>().ok())
}
