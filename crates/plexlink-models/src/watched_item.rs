use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::media::MediaKind;
use crate::plex::{MetadataRecord, RawHistoryRecord};

/// One viewing record, normalized from the media server
///
/// Episodes should carry `series_title`, but upstream data is not always
/// complete; consumers must cope with it being absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WatchedItem {
    pub id: String,
    pub kind: MediaKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originally_available_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_internal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_account_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_username: Option<String>,
}

impl WatchedItem {
    pub fn new(id: impl Into<String>, kind: MediaKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            series_title: None,
            season_number: None,
            episode_number: None,
            year: None,
            originally_available_date: None,
            series_internal_id: None,
            viewer_account_id: None,
            viewer_username: None,
        }
    }

    pub fn from_record(record: &RawHistoryRecord) -> Self {
        Self {
            id: record.rating_key.clone(),
            kind: MediaKind::from_plex_type(&record.type_),
            title: record.title.clone().unwrap_or_default(),
            series_title: non_blank(record.grandparent_title.as_deref()),
            season_number: record.parent_index,
            episode_number: record.index,
            year: record.year,
            originally_available_date: record.originally_available_at,
            series_internal_id: non_blank(record.grandparent_rating_key.as_deref()),
            viewer_account_id: record.account_id,
            viewer_username: non_blank(record.username.as_deref()),
        }
    }

    pub fn from_metadata(record: &MetadataRecord) -> Self {
        Self {
            id: record.rating_key.clone(),
            kind: record.kind,
            title: record.title.clone().unwrap_or_default(),
            series_title: non_blank(record.grandparent_title.as_deref()),
            season_number: record.parent_index,
            episode_number: record.index,
            year: record.year,
            originally_available_date: record.originally_available_at,
            series_internal_id: non_blank(record.grandparent_rating_key.as_deref()),
            viewer_account_id: None,
            viewer_username: None,
        }
    }

    pub fn is_episode(&self) -> bool {
        self.kind == MediaKind::Episode
    }

    /// Season and episode numbers, only when both are known (0 is a valid number)
    pub fn episode_numbers(&self) -> Option<(u32, u32)> {
        match (self.season_number, self.episode_number) {
            (Some(season), Some(episode)) => Some((season, episode)),
            _ => None,
        }
    }

    /// Key used to group episodes of the same show
    pub fn series_key(&self) -> String {
        self.series_internal_id
            .clone()
            .or_else(|| self.series_title.clone())
            .unwrap_or_else(|| self.title.clone())
    }

    /// Title to seed a catalog search: series title when known, else item title
    pub fn search_query(&self) -> &str {
        self.series_title.as_deref().unwrap_or(&self.title)
    }

    /// Year hint from `year`, falling back to the original air date
    pub fn year_hint(&self) -> Option<u32> {
        self.year.or_else(|| {
            self.originally_available_date
                .and_then(|date| u32::try_from(date.year()).ok())
        })
    }

    /// Fill gaps from a metadata record without overwriting known values
    pub fn enrich_from(&mut self, metadata: &MetadataRecord) {
        if self.series_internal_id.is_none() {
            self.series_internal_id = non_blank(metadata.grandparent_rating_key.as_deref());
        }
        if self.series_title.is_none() {
            self.series_title = non_blank(metadata.grandparent_title.as_deref());
        }
        if self.season_number.is_none() {
            self.season_number = metadata.parent_index;
        }
        if self.episode_number.is_none() {
            self.episode_number = metadata.index;
        }
        if self.year.is_none() {
            self.year = metadata.year;
        }
        if self.originally_available_date.is_none() {
            self.originally_available_date = metadata.originally_available_at;
        }
        if self.title.is_empty() {
            if let Some(title) = &metadata.title {
                self.title = title.clone();
            }
        }
    }

    /// Rail title: "<series> • S<season>E<episode>" for episodes, item title otherwise
    pub fn display_title(&self) -> String {
        if !self.is_episode() {
            return self.title.clone();
        }
        let series = self.series_title.as_deref().unwrap_or(&self.title);
        match self.episode_numbers() {
            Some((season, episode)) => format!("{} • S{}E{}", series, season, episode),
            None => series.to_string(),
        }
    }

    /// Rail subtitle: episode title for episodes, year (or empty) otherwise
    pub fn display_subtitle(&self) -> String {
        if self.is_episode() {
            return self.title.clone();
        }
        self.year.map(|y| y.to_string()).unwrap_or_default()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
