//! Scan-ahead search over the receiver's original file.
//!
//! For each requested digest the receiver reads a window of up to
//! `window_chunks * chunk_size` bytes starting at its cursor and slides a
//! chunk-sized candidate across it one byte at a time. The first offset whose
//! digest matches wins and the cursor moves past the matched bytes.
//!
//! A miss leaves the cursor where it was. The next digest is searched from the
//! same position, so content that sits later in the original file stays
//! reachable even when an earlier chunk (missing, corrupted, or preceded by
//! junk) had to be fetched from the sender.

use std::io::{self, SeekFrom};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::digest::ChunkDigest;

/// Offset of the first candidate in `window` whose digest equals `digest`.
///
/// The candidate at offset `o` is `window[o..o + chunk_size]`, cut short at the
/// end of the window. Offsets are tried in ascending order over the whole
/// window, not on chunk boundaries.
pub fn find_chunk(window: &[u8], chunk_size: usize, digest: &ChunkDigest) -> Option<usize> {
    (0..window.len()).find(|&offset| {
        let end = offset.saturating_add(chunk_size).min(window.len());
        ChunkDigest::of(&window[offset..end]) == *digest
    })
}

/// The receiver's read cursor into its original (pre-transfer) file.
///
/// `original` is `None` when the receiver had no prior copy; every search then
/// misses.
pub struct ScanCursor<F> {
    original: Option<F>,
    position: u64,
    chunk_size: usize,
    window_len: usize,
}

impl<F> ScanCursor<F>
where
    F: AsyncRead + AsyncSeek + Unpin,
{
    pub fn new(original: Option<F>, chunk_size: usize, window_chunks: usize) -> Self {
        Self {
            original,
            position: 0,
            chunk_size,
            window_len: chunk_size.saturating_mul(window_chunks),
        }
    }

    /// Current search position in the original file.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn has_original(&self) -> bool {
        self.original.is_some()
    }

    /// Search the window at the cursor for a chunk with `digest`.
    ///
    /// On a match returns the matched bytes and advances the cursor to
    /// `cursor + offset + chunk_size`. On a miss (including end of file)
    /// returns `None` and leaves the cursor untouched.
    pub async fn scan_ahead(&mut self, digest: ChunkDigest) -> io::Result<Option<Bytes>> {
        let Some(file) = self.original.as_mut() else {
            return Ok(None);
        };

        file.seek(SeekFrom::Start(self.position)).await?;
        // Sized by what the file actually holds past the cursor
        let mut window = Vec::new();
        (&mut *file)
            .take(self.window_len as u64)
            .read_to_end(&mut window)
            .await?;
        if window.is_empty() {
            return Ok(None);
        }

        // Digest loop is CPU bound; keep it off the async workers
        let chunk_size = self.chunk_size;
        let (window, found) = tokio::task::spawn_blocking(move || {
            let found = find_chunk(&window, chunk_size, &digest);
            (window, found)
        })
        .await
        .map_err(io::Error::other)?;

        let Some(offset) = found else {
            return Ok(None);
        };

        let end = (offset + chunk_size).min(window.len());
        let chunk = Bytes::from(window).slice(offset..end);
        self.position += (offset + chunk_size) as u64;
        Ok(Some(chunk))
    }
}
