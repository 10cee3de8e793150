//! Shared registry of active downloads
//!
//! Single source of truth for admission decisions and bandwidth division.
//! Every mutation (admit, release, progress updates) happens under one write
//! lock, and rate reallocation runs before that lock is dropped, so the
//! active set and the per-session rates are never observably inconsistent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::pacing::shared_rate;
use crate::session::{Session, SessionId};
use crate::DownloadError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Limits shared by every download, fixed at process start
#[derive(Debug, Clone, Copy)]
pub struct DownloadLimits {
    /// Total allowed throughput in bytes per second, split across sessions
    pub bandwidth_budget: u64,
    /// Maximum number of simultaneous downloads
    pub max_concurrent: usize,
    /// Read size used by the streaming engine, in bytes
    pub chunk_size: usize,
}

/// Read-only snapshot served by the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct DownloadStatus {
    pub active_downloads: usize,
    pub bandwidth_used_mbps: f64,
}

/// Registry of currently active downloads
///
/// Cloneable handle over shared state, in the same shape as the rest of the
/// server state: cheap to clone into handlers and background tasks.
#[derive(Clone)]
pub struct DownloadRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    next_id: Arc<AtomicU64>,
    limits: DownloadLimits,
}

impl DownloadRegistry {
    /// Create an empty registry with the given limits
    pub fn new(limits: DownloadLimits) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            limits,
        }
    }

    /// The limits this registry was built with
    pub fn limits(&self) -> DownloadLimits {
        self.limits
    }

    /// Admit a new download if a slot is free
    ///
    /// The ceiling check and the insert happen under a single lock
    /// acquisition, so two racing requests can never both take the last
    /// slot. Rates for the whole active set are recomputed with the
    /// post-admission count before the lock is dropped.
    ///
    /// # Returns
    /// * `Ok(SessionHandle)` guarding the new session
    /// * `Err(DownloadError::AdmissionRejected)` when the ceiling is reached
    pub fn try_admit(
        &self,
        path: PathBuf,
        filename: String,
        size_bytes: u64,
    ) -> crate::Result<SessionHandle> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if sessions.len() >= self.limits.max_concurrent {
            return Err(DownloadError::AdmissionRejected {
                active: sessions.len(),
                limit: self.limits.max_concurrent,
            });
        }

        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        sessions.insert(id, Session::new(id, path, filename, size_bytes));
        Self::reallocate(&mut sessions, self.limits.bandwidth_budget);

        tracing::info!(
            session = id.as_u64(),
            active = sessions.len(),
            rate = shared_rate(self.limits.bandwidth_budget, sessions.len()),
            "download admitted"
        );

        Ok(SessionHandle {
            registry: self.clone(),
            id,
            released: false,
        })
    }

    /// Remove a session and rebalance the remaining ones
    ///
    /// Idempotent: releasing an id that is already gone is a no-op, so a
    /// cleanup path and a success path may both call this safely.
    pub fn release(&self, id: SessionId) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if sessions.remove(&id).is_some() {
            Self::reallocate(&mut sessions, self.limits.bandwidth_budget);
            tracing::debug!(session = id.as_u64(), active = sessions.len(), "download released");
        }
    }

    /// Number of downloads currently in flight
    pub fn active_count(&self) -> usize {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }

    /// Clone of every active session, for status reporting
    pub fn snapshot(&self) -> Vec<Session> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.values().cloned().collect()
    }

    /// Aggregate status for the status endpoint
    ///
    /// Bandwidth used is the sum of currently allocated rates, reported in
    /// MB/s rounded to two decimals.
    pub fn status(&self) -> DownloadStatus {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        let used: u64 = sessions.values().map(|s| s.rate).sum();
        DownloadStatus {
            active_downloads: sessions.len(),
            bandwidth_used_mbps: (used as f64 / BYTES_PER_MB * 100.0).round() / 100.0,
        }
    }

    /// The rate currently allocated to a session, if it is still active
    pub fn current_rate(&self, id: SessionId) -> Option<u64> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(&id).map(|s| s.rate)
    }

    /// Add to a session's bytes-sent counter; no-op if it is gone
    pub(crate) fn record_sent(&self, id: SessionId, bytes: u64) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = sessions.get_mut(&id) {
            session.bytes_sent += bytes;
        }
    }

    // Caller must hold the write lock.
    fn reallocate(sessions: &mut HashMap<SessionId, Session>, budget: u64) {
        let rate = shared_rate(budget, sessions.len());
        for session in sessions.values_mut() {
            session.rate = rate;
        }
    }
}

/// Guard for one admitted session
///
/// Dropping the handle releases the session, so a stream that is cancelled
/// mid-flight (client disconnect drops the response body) still deregisters
/// and frees its slot and bandwidth share. Explicit release and drop-release
/// are both idempotent.
pub struct SessionHandle {
    registry: DownloadRegistry,
    id: SessionId,
    released: bool,
}

impl SessionHandle {
    /// Identity of the guarded session
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Fresh read of the session's allocated rate
    ///
    /// `None` means the session is no longer in the registry.
    pub fn current_rate(&self) -> Option<u64> {
        self.registry.current_rate(self.id)
    }

    /// Record bytes emitted for this session
    pub fn record_sent(&self, bytes: u64) {
        self.registry.record_sent(self.id, bytes);
    }

    /// Release the session now instead of at drop time
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(self.id);
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.release();
    }
}
