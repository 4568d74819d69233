pub mod error;
pub mod plex;
pub mod tmdb;
pub mod traits;

pub use error::SourceError;
pub use plex::PlexClient;
pub use tmdb::TmdbClient;
pub use traits::{CatalogSearch, MediaServer};
