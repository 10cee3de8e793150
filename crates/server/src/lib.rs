//! HTTP boundary for the media download server
//!
//! Maps the catalog and the download subsystem onto axum routes: an HTML
//! index, a JSON file listing, the paced download endpoint and a status
//! endpoint reporting the registry snapshot.

mod pages;
mod server;

pub use server::MediaServer;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
