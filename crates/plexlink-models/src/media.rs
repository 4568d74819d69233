use serde::{Deserialize, Serialize};

/// Kind of a media item as reported by the media server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
    Episode,
    #[default]
    Unknown,
}

impl MediaKind {
    /// Map a Plex `type` attribute ("movie", "show", "episode", ...) to a kind
    pub fn from_plex_type(type_: &str) -> Self {
        match type_.trim().to_ascii_lowercase().as_str() {
            "movie" => MediaKind::Movie,
            "show" => MediaKind::Show,
            "episode" => MediaKind::Episode,
            _ => MediaKind::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MediaKind::Unknown)
    }
}
