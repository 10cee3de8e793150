//! Session bookkeeping for in-flight downloads

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Unique identifier for one in-flight download
///
/// Allocated from a monotonically increasing counter owned by the registry,
/// so two simultaneous requests for the same file still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(raw: u64) -> Self {
        SessionId(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// One in-flight download tracked by the registry
///
/// The rate field is written only by the registry's reallocation step and the
/// bytes-sent counter only through the registry's accessors, both under its
/// lock. Snapshots hand out clones, never references into the registry.
#[derive(Debug, Clone)]
pub struct Session {
    /// Registry key for this transfer
    pub id: SessionId,
    /// Full path of the file being served
    pub path: PathBuf,
    /// Filename presented to the client
    pub filename: String,
    /// Total file size in bytes
    pub size_bytes: u64,
    /// When the transfer was admitted
    pub started_at: DateTime<Utc>,
    /// Bytes emitted so far
    pub bytes_sent: u64,
    /// Currently allocated send rate in bytes per second
    pub rate: u64,
}

impl Session {
    pub(crate) fn new(id: SessionId, path: PathBuf, filename: String, size_bytes: u64) -> Self {
        Session {
            id,
            path,
            filename,
            size_bytes,
            started_at: Utc::now(),
            bytes_sent: 0,
            rate: 0,
        }
    }
}
