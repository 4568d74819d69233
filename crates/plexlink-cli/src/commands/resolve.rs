use crate::output::{catalog_url, Output};
use color_eyre::Result;
use plexlink_config::{Config, PathManager};
use plexlink_models::{MediaKind, WatchedItem};
use plexlink_sources::MediaServer;
use serde_json::json;

use super::Session;

pub async fn run_resolve(config: Config, path_manager: &PathManager, rating_key: &str, output: &Output) -> Result<()> {
    let session = Session::open(config, path_manager, true)?;

    // Without a token the resolver reports the missing sign-in itself
    let item = match session.token.as_deref() {
        Some(token) => session
            .plex
            .fetch_metadata(rating_key, token, &session.server)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to fetch Plex item {}: {}", rating_key, e))?
            .map(|metadata| WatchedItem::from_metadata(&metadata))
            .ok_or_else(|| color_eyre::eyre::eyre!("No Plex item with rating key {}", rating_key))?,
        None => WatchedItem::new(rating_key, MediaKind::Unknown, ""),
    };

    match session
        .resolver
        .resolve(&item, session.token.as_deref(), &session.server)
        .await
    {
        Ok(route) => {
            if output.is_human() {
                output.success(format!("{} → {}", item.display_title(), route));
                output.info(catalog_url(&route));
            } else {
                output.json(&json!({
                    "item": item,
                    "route": route,
                    "url": catalog_url(&route),
                }));
            }
            Ok(())
        }
        Err(failure) => {
            output.failure(&failure);
            Err(color_eyre::eyre::eyre!("Resolution failed at step: {}", failure.step))
        }
    }
}
