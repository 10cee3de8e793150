//! Paced streaming engine
//!
//! Reads a file in fixed-size chunks and delays between chunks so the
//! achieved rate stays at or below the session's allocated share of the
//! bandwidth budget. The allocated rate is read fresh from the registry
//! before every chunk, so a running stream speeds up when other downloads
//! finish and slows down when new ones are admitted.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::Stream;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::pacing::pace_delay;
use crate::registry::SessionHandle;
use crate::DownloadError;

/// Chunked file reader paced to an admitted session's allocated rate
///
/// A stream always starts from byte zero; there is no seek or resume. The
/// session handle travels with the stream, so whatever ends it (end of file,
/// read error, or the consumer dropping it on client disconnect) releases
/// the session and triggers a rate rebalance for the remaining downloads.
pub struct DownloadStream {
    file: File,
    path: PathBuf,
    handle: SessionHandle,
    chunk_size: usize,
    first_chunk: bool,
}

impl DownloadStream {
    /// Open `path` for reading under an admitted session
    ///
    /// # Errors
    /// `FileUnavailable` if the file cannot be opened (deleted since the
    /// catalog was built, permissions, or a vanished mount). The handle is
    /// consumed either way; on failure it is dropped here, which frees the
    /// admission slot.
    pub async fn open(path: &Path, handle: SessionHandle, chunk_size: usize) -> crate::Result<Self> {
        let file = File::open(path).await.map_err(|source| DownloadError::FileUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            handle,
            chunk_size,
            first_chunk: true,
        })
    }

    /// Read the next paced chunk
    ///
    /// # Returns
    /// * `Ok(Some(bytes))` — the next chunk, after any pacing delay
    /// * `Ok(None)` — end of file; the session has been released
    /// * `Err(FileUnavailable)` — read failure mid-stream
    /// * `Err(ClientDisconnected)` — the session vanished from the registry
    pub async fn next_chunk(&mut self) -> crate::Result<Option<Bytes>> {
        let mut buf = vec![0u8; self.chunk_size];
        let n = self
            .file
            .read(&mut buf)
            .await
            .map_err(|source| DownloadError::FileUnavailable {
                path: self.path.clone(),
                source,
            })?;

        if n == 0 {
            self.handle.release();
            return Ok(None);
        }
        buf.truncate(n);

        if self.first_chunk {
            // No artificial stall before the very first bytes
            self.first_chunk = false;
        } else {
            // Fresh rate every chunk: the allocator may have rebalanced
            // while this stream was sleeping
            let rate = self
                .handle
                .current_rate()
                .ok_or(DownloadError::ClientDisconnected)?;
            tokio::time::sleep(pace_delay(n, rate)).await;
        }

        self.handle.record_sent(n as u64);
        Ok(Some(Bytes::from(buf)))
    }

    /// Adapt into a byte stream suitable for an HTTP response body
    pub fn into_byte_stream(self) -> impl Stream<Item = crate::Result<Bytes>> {
        futures::stream::try_unfold(self, |mut stream| async move {
            match stream.next_chunk().await? {
                Some(chunk) => Ok(Some((chunk, stream))),
                None => Ok(None),
            }
        })
    }
}
