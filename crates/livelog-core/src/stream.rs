//! The central object: owns the backing buffer, the observer registry, and
//! drives ingestion from a single producer.

use crate::buffer::BackingBuffer;
use crate::error::CoreError;
use crate::invariants::{debug_assert_generation_advanced, debug_assert_handle_deregistered};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::observer::ObserverHandle;
use crate::range::Stop;
use bytes::Bytes;
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Notify;
use tracing::{debug, trace};

const READ_CHUNK_SIZE: usize = 64 * 1024;

struct Inner {
    buffer: BackingBuffer,
    observers: DashSet<u64>,
    next_observer_id: AtomicU64,
    closed: AtomicBool,
    generation: AtomicU64,
    notify: Notify,
    metrics: Metrics,
}

/// The single in-memory log backing one producer's upload and all of its
/// consumers. Cheaply `Clone`: every clone refers to the same underlying
/// state, which is how the producer task and every observer task share it.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<Inner>,
}

impl Stream {
    /// Creates a new, empty, open stream.
    ///
    /// Returns `Result` (rather than `Self`) to fit the `StreamOpenFailed`
    /// error kind even though building the in-memory state here cannot
    /// itself fail; callers that need to validate the producer source
    /// before accepting it (e.g. checking a request's headers) do so
    /// before calling this, and surface that failure the same way.
    pub fn new() -> Result<Self, CoreError> {
        Ok(Self {
            inner: Arc::new(Inner {
                buffer: BackingBuffer::new(),
                observers: DashSet::new(),
                next_observer_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                notify: Notify::new(),
                metrics: Metrics::default(),
            }),
        })
    }

    /// Drives ingestion from `source` to completion: reads until EOF or
    /// error, appending each chunk and waking observers as it goes.
    ///
    /// Runs to completion on whatever task calls it; does not return until
    /// the stream is closed, either by EOF (`Ok(())`) or by a read error
    /// (`Err(CoreError::ProducerFailed)`). Either way, `state` transitions
    /// to `Closed` exactly once before this returns.
    pub async fn consume<R>(&self, mut source: R) -> Result<(), CoreError>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            match source.read(&mut chunk).await {
                Ok(0) => {
                    debug!(bytes = self.length(), "producer reached EOF");
                    self.close();
                    return Ok(());
                }
                Ok(n) => {
                    self.inner.buffer.append(&chunk[..n]);
                    self.inner.metrics.record_append(n as u64);
                    self.bump_and_notify();
                    trace!(n, total = self.length(), "appended chunk");
                }
                Err(err) => {
                    debug!(error = %err, "producer read failed");
                    self.close();
                    return Err(CoreError::ProducerFailed(err));
                }
            }
        }
    }

    /// Registers a new observer reading `[start, stop)` and returns its
    /// handle. Callable concurrently with `consume` and with other
    /// `observe`/`unobserve` calls.
    pub fn observe(&self, start: u64, stop: Stop) -> ObserverHandle {
        let id = self.inner.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.insert(id);
        self.inner.metrics.observer_attached();
        ObserverHandle {
            id,
            start,
            stop,
            position: start,
            stream: self.clone(),
        }
    }

    /// Removes an observer from the registry. Idempotent: calling this
    /// more than once for the same id (e.g. once explicitly and once via
    /// `Drop`) is a no-op after the first call.
    pub(crate) fn unobserve(&self, id: u64) {
        if self.inner.observers.remove(&id).is_some() {
            debug_assert_handle_deregistered!(true);
            self.inner.metrics.observer_detached();
        }
    }

    /// Total bytes currently available to read. Fixed forever once the
    /// stream is closed.
    pub fn length(&self) -> u64 {
        self.inner.buffer.length()
    }

    /// `true` once ingestion has completed (EOF or producer error).
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of observers currently registered.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// A snapshot of this stream's counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub(crate) fn notify(&self) -> &Notify {
        &self.inner.notify
    }

    pub(crate) fn read_at(&self, offset: u64, max_len: usize) -> Bytes {
        self.inner.buffer.read_at(offset, max_len)
    }

    pub(crate) fn record_delivered(&self, n: u64) {
        self.inner.metrics.record_delivered(n);
    }

    fn bump_and_notify(&self) {
        let old = self.inner.generation.fetch_add(1, Ordering::AcqRel);
        debug_assert_generation_advanced!(old, old + 1);
        self.inner.notify.notify_waiters();
    }

    /// Transitions `Open -> Closed` exactly once, firing the notifier so
    /// every waiting observer re-checks its state and drains what remains.
    fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            self.bump_and_notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    #[tokio::test]
    async fn consume_appends_and_closes_on_eof() {
        let stream = Stream::new().unwrap();
        let (mut writer, reader) = duplex(64);
        let consume_stream = stream.clone();
        let consumer = tokio::spawn(async move { consume_stream.consume(reader).await });

        writer.write_all(b"ABCDE").await.unwrap();
        drop(writer);

        consumer.await.unwrap().unwrap();
        assert!(stream.is_closed());
        assert_eq!(stream.length(), 5);
    }

    #[tokio::test]
    async fn observe_and_unobserve_track_registry() {
        let stream = Stream::new().unwrap();
        assert_eq!(stream.observer_count(), 0);
        let handle = stream.observe(0, Stop::Open);
        assert_eq!(stream.observer_count(), 1);
        drop(handle);
        assert_eq!(stream.observer_count(), 0);
    }

    #[tokio::test]
    async fn double_unobserve_is_a_no_op() {
        let stream = Stream::new().unwrap();
        let handle = stream.observe(0, Stop::Open);
        let id = handle.id();
        stream.unobserve(id);
        assert_eq!(stream.observer_count(), 0);
        drop(handle); // triggers a second unobserve for the same id
        assert_eq!(stream.observer_count(), 0);
    }
}
