pub mod account;
pub mod catalog;
pub mod external_ids;
pub mod failure;
pub mod media;
pub mod plex;
pub mod route;
pub mod watched_item;

pub use account::{HomeUser, ServerAccount};
pub use catalog::{CatalogMovie, CatalogShow};
pub use external_ids::ExternalIds;
pub use failure::{ResolutionFailure, ResolutionStep};
pub use media::MediaKind;
pub use plex::{MetadataRecord, RawHistoryRecord, ServerHint};
pub use route::{CatalogId, CatalogRoute};
pub use watched_item::WatchedItem;
