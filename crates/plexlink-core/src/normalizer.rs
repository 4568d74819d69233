use plexlink_models::{RawHistoryRecord, WatchedItem};
use std::collections::{HashMap, HashSet};

/// Default number of episodes of one show kept in the recent rail
pub const DEFAULT_LIMIT_PER_SHOW: usize = 3;

/// Turn a raw history page into watched items: dedupe by id, then cap
/// episodes per show. Source order is preserved throughout.
pub fn normalize(records: &[RawHistoryRecord], limit_per_show: usize) -> Vec<WatchedItem> {
    let items = records.iter().map(WatchedItem::from_record).collect();
    cap_episodes_per_show(dedupe_by_id(items), limit_per_show)
}

/// Keep the first occurrence of every id
pub fn dedupe_by_id(items: Vec<WatchedItem>) -> Vec<WatchedItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

/// Keep at most `limit` episodes per series key. Non-episodes are untouched.
pub fn cap_episodes_per_show(items: Vec<WatchedItem>, limit: usize) -> Vec<WatchedItem> {
    let mut per_show: HashMap<String, usize> = HashMap::new();
    items
        .into_iter()
        .filter(|item| {
            if !item.is_episode() {
                return true;
            }
            let count = per_show.entry(item.series_key()).or_insert(0);
            *count += 1;
            *count <= limit
        })
        .collect()
}

/// Drop every recent item that is also playing right now
pub fn exclude_now_playing(recent: Vec<WatchedItem>, now_playing: &[WatchedItem]) -> Vec<WatchedItem> {
    let playing: HashSet<&str> = now_playing.iter().map(|item| item.id.as_str()).collect();
    recent
        .into_iter()
        .filter(|item| !playing.contains(item.id.as_str()))
        .collect()
}

/// The two history rails shown to the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRails {
    pub now_playing: Vec<WatchedItem>,
    pub recent: Vec<WatchedItem>,
}

impl HistoryRails {
    /// Build both rails from the rows `keep` accepts.
    ///
    /// Rows are filtered before anything is counted, so rows of other viewers
    /// never use up a show's quota. Now-playing entries are only deduplicated.
    /// Recent entries already in the now-playing rail are removed before the
    /// per-show cap, so a show being watched right now still gets its full
    /// quota of older episodes.
    pub fn build(
        now_playing_raw: &[RawHistoryRecord],
        recent_raw: &[RawHistoryRecord],
        limit_per_show: usize,
        keep: impl Fn(&WatchedItem) -> bool,
    ) -> Self {
        let rows = |records: &[RawHistoryRecord]| -> Vec<WatchedItem> {
            dedupe_by_id(records.iter().map(WatchedItem::from_record).collect())
                .into_iter()
                .filter(|item| keep(item))
                .collect()
        };
        let now_playing = rows(now_playing_raw);
        let recent = cap_episodes_per_show(exclude_now_playing(rows(recent_raw), &now_playing), limit_per_show);
        Self { now_playing, recent }
    }

    /// Now playing first, then recent
    pub fn combined(&self) -> Vec<WatchedItem> {
        self.now_playing.iter().chain(self.recent.iter()).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.now_playing.is_empty() && self.recent.is_empty()
    }
}
