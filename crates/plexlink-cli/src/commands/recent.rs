use crate::output::Output;
use color_eyre::Result;
use plexlink_config::{Config, PathManager, PrefetchConfig};
use plexlink_core::account_filter::candidate_ids;
use plexlink_core::{AccountFilter, AccountMatch, AccountNameIndex, HistoryRails, PrefetchScheduler};
use plexlink_models::{CatalogRoute, ResolutionFailure, WatchedItem};
use plexlink_sources::MediaServer;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::Session;

pub async fn run_recent(
    config: Config,
    path_manager: &PathManager,
    limit: Option<usize>,
    resolve: bool,
    output: &Output,
) -> Result<()> {
    let session = Session::open(config, path_manager, resolve)?;
    let token = session.require_token()?;
    let plex = session.plex.as_ref();

    let (now_playing, history) = tokio::join!(
        plex.fetch_now_playing(token, &session.server),
        plex.fetch_history_page(token, session.config.plex.history_page_size, &session.server),
    );
    let now_playing = now_playing.unwrap_or_else(|e| {
        // Sessions are a nice-to-have next to history
        warn!("Could not fetch now playing: {}", e);
        Vec::new()
    });
    let history = history.map_err(|e| color_eyre::eyre::eyre!("Failed to fetch watch history: {}", e))?;

    let preferred = &session.config.plex.preferred_home_user_ids;
    let account_match = if preferred.is_empty() {
        AccountMatch::everyone()
    } else {
        let directory = plex.fetch_home_users(token).await.unwrap_or_else(|e| {
            warn!("Could not fetch home users, matching by account id only: {}", e);
            Vec::new()
        });
        let viewers: Vec<WatchedItem> = now_playing
            .iter()
            .chain(history.iter())
            .map(WatchedItem::from_record)
            .collect();
        let filter = AccountFilter::new(session.plex.clone(), Arc::new(AccountNameIndex::new()));
        filter
            .match_accounts(&candidate_ids(&viewers), preferred, &directory, token, &session.server)
            .await
    };

    // Viewer filter runs before the per-show cap
    let mut rails = HistoryRails::build(&now_playing, &history, session.config.plex.limit_per_show, |item| {
        account_match.matches_item(item)
    });
    info!(
        "Fetched {} now playing and {} history records ({} recent after normalizing)",
        now_playing.len(),
        history.len(),
        rails.recent.len()
    );

    if let Some(limit) = limit {
        rails.recent.truncate(limit);
    }

    let outcomes = if resolve {
        if prefetch_wanted(resolve, &session.config.prefetch) {
            let scheduler = PrefetchScheduler::new(session.resolver.clone()).with_limit(session.config.prefetch.limit);
            match scheduler.schedule(&rails.combined(), Some(token), &session.server).await {
                Ok(summary) => debug!("Prefetch summary: {:?}", summary),
                Err(e) => debug!("Prefetch task failed: {}", e),
            }
        }
        let mut outcomes = Vec::new();
        for item in rails.combined() {
            let outcome = session.resolver.resolve(&item, Some(token), &session.server).await;
            outcomes.push(outcome);
        }
        let stats = session.resolver.cache().stats().await;
        debug!("Identity cache holds {} routes and {} shows", stats.routes, stats.shows);
        Some(outcomes)
    } else {
        None
    };

    print_rails(&rails, outcomes.as_deref(), output);
    Ok(())
}

/// Prefetch runs only for rows resolved in this process
fn prefetch_wanted(resolve: bool, prefetch: &PrefetchConfig) -> bool {
    resolve && prefetch.enabled && prefetch.limit > 0
}

fn print_rails(
    rails: &HistoryRails,
    outcomes: Option<&[Result<CatalogRoute, ResolutionFailure>]>,
    output: &Output,
) {
    let outcome_at = |index: usize| outcomes.and_then(|o| o.get(index));

    if !output.is_human() {
        let offset = rails.now_playing.len();
        let now_playing: Vec<_> = rails
            .now_playing
            .iter()
            .enumerate()
            .map(|(i, item)| row_json(item, outcome_at(i)))
            .collect();
        let recent: Vec<_> = rails
            .recent
            .iter()
            .enumerate()
            .map(|(i, item)| row_json(item, outcome_at(offset + i)))
            .collect();
        output.json(&json!({ "now_playing": now_playing, "recent": recent }));
        return;
    }

    if rails.is_empty() {
        output.info("Nothing watched yet");
        return;
    }
    if !rails.now_playing.is_empty() {
        output.heading("Now playing");
        for (i, item) in rails.now_playing.iter().enumerate() {
            output.row(item, outcome_at(i));
        }
    }
    if !rails.recent.is_empty() {
        output.heading("Recently watched");
        let offset = rails.now_playing.len();
        for (i, item) in rails.recent.iter().enumerate() {
            output.row(item, outcome_at(offset + i));
        }
    }
}

fn row_json(item: &WatchedItem, outcome: Option<&Result<CatalogRoute, ResolutionFailure>>) -> serde_json::Value {
    let mut row = json!({
        "item": item,
        "display_title": item.display_title(),
        "display_subtitle": item.display_subtitle(),
    });
    match outcome {
        Some(Ok(route)) => row["route"] = json!(route),
        Some(Err(failure)) => row["failure"] = json!(failure),
        None => {}
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefetch_only_when_resolving() {
        let enabled = PrefetchConfig::default();
        assert!(enabled.enabled);
        assert!(prefetch_wanted(true, &enabled));
        assert!(!prefetch_wanted(false, &enabled));

        let disabled = PrefetchConfig {
            enabled: false,
            ..PrefetchConfig::default()
        };
        assert!(!prefetch_wanted(true, &disabled));
    }
}
