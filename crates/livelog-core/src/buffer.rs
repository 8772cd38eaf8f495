//! The append-only byte log backing a [`crate::Stream`].

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Holds every byte appended by the producer, addressable by absolute
/// offset. Unbounded: bytes are retained for the life of the process, which
/// is the reference policy from the spec (eviction is a process restart,
/// not a sliding window).
#[derive(Debug, Default)]
pub(crate) struct BackingBuffer {
    bytes: Mutex<Vec<u8>>,
    // Mirrors `bytes.lock().len()` so readers can poll the length without
    // contending on the lock on the common "nothing new yet" path.
    length: AtomicU64,
}

impl BackingBuffer {
    pub(crate) fn new() -> Self {
        Self {
            bytes: Mutex::new(Vec::new()),
            length: AtomicU64::new(0),
        }
    }

    /// Appends `chunk` to the log. Bytes already written never change.
    pub(crate) fn append(&self, chunk: &[u8]) {
        let mut guard = self.bytes.lock().expect("backing buffer lock poisoned");
        guard.extend_from_slice(chunk);
        self.length.store(guard.len() as u64, Ordering::Release);
    }

    /// Current length of the log. May be stale by a few bytes relative to
    /// an in-flight `append`, but never goes backwards.
    pub(crate) fn length(&self) -> u64 {
        self.length.load(Ordering::Acquire)
    }

    /// Returns up to `max_len` bytes starting at `offset`. Returns fewer
    /// bytes than requested (possibly zero) if the log doesn't have that
    /// much data yet; never returns bytes past what has been appended.
    pub(crate) fn read_at(&self, offset: u64, max_len: usize) -> Bytes {
        let guard = self.bytes.lock().expect("backing buffer lock poisoned");
        let len = guard.len() as u64;
        if offset >= len {
            return Bytes::new();
        }
        let start = offset as usize;
        let end = std::cmp::min(guard.len(), start.saturating_add(max_len));
        Bytes::copy_from_slice(&guard[start..end])
    }
}
