use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::external_ids::ExternalIds;
use crate::media::MediaKind;

/// Where to reach the media server.
///
/// `url` wins when present; otherwise the server is discovered through plex.tv,
/// preferring the one whose client identifier equals `machine_identifier`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ServerHint {
    pub url: Option<String>,
    pub machine_identifier: Option<String>,
}

impl ServerHint {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            machine_identifier: None,
        }
    }
}

/// One row of watch history or an active session, as returned by the server
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawHistoryRecord {
    pub rating_key: String,
    pub type_: String,
    pub title: Option<String>,
    pub grandparent_title: Option<String>,
    pub grandparent_rating_key: Option<String>,
    /// Season number for episodes
    pub parent_index: Option<u32>,
    /// Episode number for episodes
    pub index: Option<u32>,
    pub year: Option<u32>,
    pub originally_available_at: Option<NaiveDate>,
    pub account_id: Option<u64>,
    pub username: Option<String>,
}

/// Single metadata record (`/library/metadata/{id}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataRecord {
    pub rating_key: String,
    pub kind: MediaKind,
    pub title: Option<String>,
    pub year: Option<u32>,
    pub originally_available_at: Option<NaiveDate>,
    /// Cross-reference ids, e.g. "tmdb://550"
    pub guids: Vec<String>,
    pub grandparent_rating_key: Option<String>,
    pub grandparent_title: Option<String>,
    pub parent_index: Option<u32>,
    pub index: Option<u32>,
}

impl MetadataRecord {
    pub fn external_ids(&self) -> ExternalIds {
        ExternalIds::from_guids(&self.guids)
    }
}
