pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, LoggingConfig, PlexConfig, PrefetchConfig, TmdbConfig};
pub use credentials::CredentialStore;
pub use paths::PathManager;
