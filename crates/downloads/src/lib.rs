//! Download admission and bandwidth sharing
//!
//! This crate tracks in-flight file transfers in a shared registry, caps how
//! many may run at once, splits a fixed bandwidth budget evenly across the
//! active set, and streams file bytes in paced chunks. Rates are recomputed
//! whenever a download starts or finishes, so running transfers speed up when
//! others complete and slow down when new ones are admitted.

mod error;
mod pacing;
mod registry;
mod session;
mod stream;

pub use error::DownloadError;
pub use pacing::{pace_delay, shared_rate};
pub use registry::{DownloadLimits, DownloadRegistry, DownloadStatus, SessionHandle};
pub use session::{Session, SessionId};
pub use stream::DownloadStream;

/// Result type alias for download operations
pub type Result<T> = std::result::Result<T, DownloadError>;
