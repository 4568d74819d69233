use plexlink_models::{MediaKind, ServerHint, WatchedItem};
use plexlink_sources::SourceError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::resolver::Resolver;

/// Items considered per prefetch run
pub const DEFAULT_PREFETCH_LIMIT: usize = 25;

/// Outcome of one prefetch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    pub considered: usize,
    pub attempted: usize,
    pub warmed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

/// Background warm-up of the identity cache for visible history rows.
///
/// Runs one item at a time. Starting a new run cancels the previous one
/// between items. Errors are logged and dropped.
pub struct PrefetchScheduler {
    resolver: Arc<Resolver>,
    attempted: Arc<tokio::sync::Mutex<HashSet<String>>>,
    current: Mutex<Option<CancellationToken>>,
    limit: usize,
}

impl PrefetchScheduler {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self {
            resolver,
            attempted: Arc::new(tokio::sync::Mutex::new(HashSet::new())),
            current: Mutex::new(None),
            limit: DEFAULT_PREFETCH_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Start a prefetch run over the first items of `items`.
    ///
    /// Must be called from within a tokio runtime. The returned handle can be
    /// dropped; the run continues in the background.
    pub fn schedule(&self, items: &[WatchedItem], token: Option<&str>, server: &ServerHint) -> JoinHandle<PrefetchSummary> {
        let cancel = CancellationToken::new();
        if let Some(previous) = self.replace_current(Some(cancel.clone())) {
            debug!("Cancelling previous prefetch run");
            previous.cancel();
        }

        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string) else {
            debug!("No Plex token, skipping prefetch");
            return tokio::spawn(async { PrefetchSummary::default() });
        };

        let run = PrefetchRun {
            resolver: self.resolver.clone(),
            attempted: self.attempted.clone(),
            items: items.iter().take(self.limit).cloned().collect(),
            token,
            server: server.clone(),
            cancel,
        };
        tokio::spawn(run.execute())
    }

    /// Cancel the running prefetch, if any
    pub fn cancel(&self) {
        if let Some(current) = self.replace_current(None) {
            current.cancel();
        }
    }

    fn replace_current(&self, next: Option<CancellationToken>) -> Option<CancellationToken> {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *current, next)
    }
}

impl Drop for PrefetchScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct PrefetchRun {
    resolver: Arc<Resolver>,
    attempted: Arc<tokio::sync::Mutex<HashSet<String>>>,
    items: Vec<WatchedItem>,
    token: String,
    server: ServerHint,
    cancel: CancellationToken,
}

impl PrefetchRun {
    async fn execute(self) -> PrefetchSummary {
        let mut summary = PrefetchSummary {
            considered: self.items.len(),
            ..Default::default()
        };

        for item in &self.items {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            if item.kind == MediaKind::Unknown {
                summary.skipped += 1;
                continue;
            }
            if !self.attempted.lock().await.insert(item.id.clone()) {
                summary.skipped += 1;
                continue;
            }

            summary.attempted += 1;
            match self.prefetch_item(item).await {
                Ok(true) => summary.warmed += 1,
                Ok(false) => {}
                Err(e) => debug!("Prefetch of {} failed: {}", item.id, e),
            }

            tokio::task::yield_now().await;
        }

        info!(
            "Prefetch done: {} considered, {} attempted, {} warmed, {} skipped{}",
            summary.considered,
            summary.attempted,
            summary.warmed,
            summary.skipped,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        summary
    }

    /// Returns whether a new cache entry was written
    async fn prefetch_item(&self, item: &WatchedItem) -> Result<bool, SourceError> {
        let cache = self.resolver.cache();

        if item.is_episode() {
            let Some(series_id) = item.series_internal_id.as_deref() else {
                return Ok(false);
            };
            if cache.show_catalog_id(series_id).await.is_some() {
                return Ok(false);
            }
            let show_id = self
                .resolver
                .resolve_show_catalog_id(series_id, &self.token, &self.server)
                .await?;
            return Ok(show_id.is_some());
        }

        if cache.route(&item.id).await.is_some() {
            return Ok(false);
        }
        match self
            .resolver
            .lookup_external_route(item, &self.token, &self.server)
            .await?
        {
            Some(route) => {
                cache.insert_route(&item.id, route).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
