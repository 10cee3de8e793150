//! Error types for download admission and streaming

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Custom error type for download operations
#[derive(Debug)]
pub enum DownloadError {
    /// All download slots are taken; the caller should retry later
    AdmissionRejected { active: usize, limit: usize },
    /// The file could not be opened or read (deleted, permissions, or a
    /// removable volume that disappeared since the catalog was built)
    FileUnavailable { path: PathBuf, source: io::Error },
    /// The client went away mid-stream; an early termination, not a failure
    ClientDisconnected,
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::AdmissionRejected { active, limit } => {
                write!(f, "download limit reached ({} of {} slots in use)", active, limit)
            }
            DownloadError::FileUnavailable { path, source } => {
                write!(f, "file unavailable: {}: {}", path.display(), source)
            }
            DownloadError::ClientDisconnected => write!(f, "client disconnected"),
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DownloadError::FileUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}
