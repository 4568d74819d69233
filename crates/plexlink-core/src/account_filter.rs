use plexlink_models::account::normalize_name;
use plexlink_models::{HomeUser, ServerHint, WatchedItem};
use plexlink_sources::MediaServer;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Account id of the owning viewer on a personal server
pub const PRIMARY_ACCOUNT_ID: u64 = 1;

#[derive(Default)]
struct IndexState {
    names_by_account_id: HashMap<u64, HashSet<String>>,
    /// Name variants of the primary viewer, keyed by the token they were resolved with
    primary: Option<(String, HashSet<String>)>,
}

/// Session cache of numeric viewer id → normalized name variants.
///
/// Filled lazily: ids are only looked up when they show up as candidates.
/// The lock is held across the lookup so concurrent callers never fetch the
/// same thing twice.
#[derive(Default)]
pub struct AccountNameIndex {
    state: Mutex<IndexState>,
}

impl AccountNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name variants for each candidate id. Ids that could not be resolved are
    /// returned separately.
    async fn resolve(
        &self,
        candidates: &HashSet<u64>,
        media_server: &dyn MediaServer,
        token: &str,
        server: &ServerHint,
    ) -> (HashMap<u64, HashSet<String>>, Vec<u64>) {
        let mut state = self.state.lock().await;
        let mut resolved = HashMap::new();
        let mut unresolved = Vec::new();

        if candidates.contains(&PRIMARY_ACCOUNT_ID) {
            let cached = state
                .primary
                .as_ref()
                .filter(|(cached_token, _)| cached_token == token)
                .map(|(_, names)| names.clone());
            let names = match cached {
                Some(names) => Some(names),
                None => match media_server.fetch_current_user(token).await {
                    Ok(user) => {
                        let names = user.name_variants();
                        state.primary = Some((token.to_string(), names.clone()));
                        Some(names)
                    }
                    Err(e) => {
                        debug!("Could not resolve primary viewer: {}", e);
                        None
                    }
                },
            };
            match names {
                Some(names) => {
                    resolved.insert(PRIMARY_ACCOUNT_ID, names);
                }
                None => unresolved.push(PRIMARY_ACCOUNT_ID),
            }
        }

        let others: Vec<u64> = candidates
            .iter()
            .copied()
            .filter(|id| *id != PRIMARY_ACCOUNT_ID)
            .collect();
        let missing = others
            .iter()
            .any(|id| !state.names_by_account_id.contains_key(id));

        if missing {
            match media_server.fetch_server_accounts(token, server).await {
                Ok(accounts) => {
                    debug!("Loaded {} server accounts", accounts.len());
                    for account in accounts {
                        if account.id == PRIMARY_ACCOUNT_ID {
                            continue;
                        }
                        if let Some(name) = normalize_name(&account.name) {
                            state
                                .names_by_account_id
                                .entry(account.id)
                                .or_default()
                                .insert(name);
                        }
                    }
                }
                Err(e) => debug!("Could not load server accounts: {}", e),
            }
        }

        for id in others {
            match state.names_by_account_id.get(&id) {
                Some(names) => {
                    resolved.insert(id, names.clone());
                }
                None => unresolved.push(id),
            }
        }

        unresolved.sort_unstable();
        (resolved, unresolved)
    }
}

/// Result of matching viewer accounts against the preferred home users
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountMatch {
    /// No preferred users configured; everything matches
    pub pass_through: bool,
    pub matching: HashSet<u64>,
    /// Name variants of all preferred users, used for items without an account id
    pub preferred_names: HashSet<String>,
    pub unresolved: Vec<u64>,
}

impl AccountMatch {
    pub fn everyone() -> Self {
        Self {
            pass_through: true,
            ..Default::default()
        }
    }

    pub fn matches(&self, account_id: u64) -> bool {
        self.pass_through || self.matching.contains(&account_id)
    }

    /// Whether an item's viewer is one of the preferred users
    pub fn matches_item(&self, item: &WatchedItem) -> bool {
        if self.pass_through {
            return true;
        }
        if let Some(id) = item.viewer_account_id {
            return self.matching.contains(&id);
        }
        item.viewer_username
            .as_deref()
            .and_then(normalize_name)
            .map(|name| self.preferred_names.contains(&name))
            .unwrap_or(false)
    }
}

/// Restrict history to the viewers the user cares about
pub struct AccountFilter {
    server: Arc<dyn MediaServer>,
    index: Arc<AccountNameIndex>,
}

impl AccountFilter {
    pub fn new(server: Arc<dyn MediaServer>, index: Arc<AccountNameIndex>) -> Self {
        Self { server, index }
    }

    /// Match candidate account ids against the preferred home users.
    ///
    /// An id matches when it is itself preferred, or when its name variants
    /// intersect those of any preferred user. Name matching is heuristic; the
    /// server gives no authoritative account to home user mapping.
    pub async fn match_accounts(
        &self,
        candidates: &[u64],
        preferred: &[u64],
        directory: &[HomeUser],
        token: &str,
        server: &ServerHint,
    ) -> AccountMatch {
        if preferred.is_empty() {
            return AccountMatch::everyone();
        }

        let preferred_ids: HashSet<u64> = preferred.iter().copied().collect();
        let preferred_names: HashSet<String> = directory
            .iter()
            .filter(|user| preferred_ids.contains(&user.id))
            .flat_map(|user| user.name_variants())
            .collect();

        let mut matching: HashSet<u64> = candidates
            .iter()
            .copied()
            .filter(|id| preferred_ids.contains(id))
            .collect();

        let to_resolve: HashSet<u64> = candidates
            .iter()
            .copied()
            .filter(|id| !matching.contains(id))
            .collect();

        let mut unresolved = Vec::new();
        if !to_resolve.is_empty() && !preferred_names.is_empty() {
            let (resolved, missing) = self
                .index
                .resolve(&to_resolve, self.server.as_ref(), token, server)
                .await;
            for (id, names) in resolved {
                if !names.is_disjoint(&preferred_names) {
                    matching.insert(id);
                }
            }
            if !missing.is_empty() {
                warn!("Could not resolve viewer account ids: {:?}", missing);
            }
            unresolved = missing;
        }

        debug!(
            "Matched {} of {} viewer accounts against {} preferred users",
            matching.len(),
            candidates.len(),
            preferred_ids.len()
        );

        AccountMatch {
            pass_through: false,
            matching,
            preferred_names,
            unresolved,
        }
    }
}

/// Distinct viewer account ids in first-seen order
pub fn candidate_ids(items: &[WatchedItem]) -> Vec<u64> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.viewer_account_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::HistoryRails;
    use crate::test_support::FakeServer;
    use plexlink_models::{MediaKind, RawHistoryRecord, ServerAccount};
    use std::sync::atomic::Ordering;

    fn user(id: u64, title: &str) -> HomeUser {
        HomeUser {
            id,
            title: Some(title.to_string()),
            username: None,
            friendly_name: None,
        }
    }

    fn filter(server: Arc<FakeServer>) -> AccountFilter {
        AccountFilter::new(server, Arc::new(AccountNameIndex::new()))
    }

    #[tokio::test]
    async fn test_no_preferred_ids_matches_everything() {
        let server = Arc::new(FakeServer::default());
        let result = filter(server.clone())
            .match_accounts(&[5, 6], &[], &[], "token", &ServerHint::default())
            .await;
        assert!(result.matches(5));
        assert!(result.matches(6));
        assert!(result.matches(999));
        assert_eq!(server.accounts_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_preferred_id_matches_even_when_resolution_fails() {
        let server = Arc::new(FakeServer {
            fail_accounts: true,
            ..Default::default()
        });
        let result = filter(server)
            .match_accounts(&[42, 7], &[42], &[user(42, "Alice")], "token", &ServerHint::default())
            .await;
        assert!(result.matches(42));
        assert!(!result.matches(7));
        assert_eq!(result.unresolved, vec![7]);
    }

    #[tokio::test]
    async fn test_matches_by_name_variant() {
        let server = Arc::new(FakeServer {
            accounts: vec![
                ServerAccount { id: 7, name: " alice ".to_string() },
                ServerAccount { id: 8, name: "Bob".to_string() },
            ],
            ..Default::default()
        });
        let result = filter(server)
            .match_accounts(&[7, 8], &[42], &[user(42, "Alice"), user(43, "Bob")], "token", &ServerHint::default())
            .await;
        assert!(result.matches(7));
        assert!(!result.matches(8));
        assert!(result.unresolved.is_empty());
    }

    #[tokio::test]
    async fn test_primary_viewer_resolved_once_per_token() {
        let server = Arc::new(FakeServer {
            current_user: Some(user(1, "Owner")),
            ..Default::default()
        });
        let filter = filter(server.clone());
        let directory = [user(42, "owner")];

        for _ in 0..3 {
            let result = filter
                .match_accounts(&[PRIMARY_ACCOUNT_ID], &[42], &directory, "token", &ServerHint::default())
                .await;
            assert!(result.matches(PRIMARY_ACCOUNT_ID));
        }
        assert_eq!(server.current_user_calls.load(Ordering::SeqCst), 1);

        filter
            .match_accounts(&[PRIMARY_ACCOUNT_ID], &[42], &directory, "other-token", &ServerHint::default())
            .await;
        assert_eq!(server.current_user_calls.load(Ordering::SeqCst), 2);
        assert_eq!(server.accounts_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_account_names_are_cached() {
        let server = Arc::new(FakeServer {
            accounts: vec![ServerAccount { id: 7, name: "Alice".to_string() }],
            ..Default::default()
        });
        let filter = filter(server.clone());
        let directory = [user(42, "Alice")];

        filter.match_accounts(&[7], &[42], &directory, "token", &ServerHint::default()).await;
        filter.match_accounts(&[7], &[42], &directory, "token", &ServerHint::default()).await;
        assert_eq!(server.accounts_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_items_match_by_username_when_id_missing() {
        let server = Arc::new(FakeServer::default());
        let mut by_id = WatchedItem::new("a", MediaKind::Movie, "A");
        by_id.viewer_account_id = Some(42);
        let mut by_name = WatchedItem::new("b", MediaKind::Movie, "B");
        by_name.viewer_username = Some("ALICE".to_string());
        let mut stranger = WatchedItem::new("c", MediaKind::Movie, "C");
        stranger.viewer_username = Some("mallory".to_string());
        let anonymous = WatchedItem::new("d", MediaKind::Movie, "D");

        let items = vec![by_id, by_name, stranger, anonymous];

        let account_match = filter(server)
            .match_accounts(&candidate_ids(&items), &[42], &[user(42, "Alice")], "token", &ServerHint::default())
            .await;
        let ids: Vec<_> = items
            .iter()
            .filter(|item| account_match.matches_item(item))
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rails_filtered_by_viewer_before_capping() {
        let server = Arc::new(FakeServer::default());
        let record = |id: &str, account_id: u64| RawHistoryRecord {
            rating_key: id.to_string(),
            type_: "episode".to_string(),
            grandparent_title: Some("Lost".to_string()),
            grandparent_rating_key: Some("lost".to_string()),
            account_id: Some(account_id),
            ..Default::default()
        };
        let history = vec![record("a", 99), record("b", 99), record("c", 99), record("d", 42), record("e", 42)];

        let items: Vec<WatchedItem> = history.iter().map(WatchedItem::from_record).collect();
        let account_match = filter(server)
            .match_accounts(&candidate_ids(&items), &[42], &[user(42, "Alice")], "token", &ServerHint::default())
            .await;
        let rails = HistoryRails::build(&[], &history, 3, |item| account_match.matches_item(item));

        let ids: Vec<_> = rails.recent.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "e"]);
    }
}
