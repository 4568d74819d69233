pub mod api;
pub mod client;

pub use api::{PlexHttpClient, ServerInfo};
pub use client::PlexClient;
