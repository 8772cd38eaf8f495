//! A consumer's cursor over a [`crate::Stream`].

use crate::error::CoreError;
use crate::invariants::debug_assert_position_monotonic;
use crate::range::Stop;
use crate::stream::Stream;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

/// A cursor bound to a `(start, stop)` range over a [`Stream`].
///
/// Created by [`Stream::observe`]. Dropping a handle — whether because
/// [`ObserverHandle::write_to`] returned, or because the handle was
/// discarded without ever being written — deregisters it from the stream.
/// This is the only cleanup path; it covers success, sink errors, and the
/// consumer's task being cancelled mid-delivery.
pub struct ObserverHandle {
    pub(crate) id: u64,
    pub(crate) start: u64,
    pub(crate) stop: Stop,
    pub(crate) position: u64,
    pub(crate) stream: Stream,
}

impl ObserverHandle {
    /// This handle's identity within its stream's observer registry.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The offset this handle started reading from.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// The offset this handle will stop reading at, if bounded.
    pub fn stop(&self) -> Stop {
        self.stop
    }

    /// The next offset this handle will deliver. Monotonically
    /// non-decreasing over the handle's lifetime.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// `true` if this handle has delivered everything it ever will.
    pub fn is_complete(&self) -> bool {
        match self.stop {
            Stop::Bounded(stop) => self.position >= stop,
            Stop::Open => {
                self.stream.is_closed() && self.position >= self.stream.length()
            }
        }
    }

    /// Copies bytes `[position, effective_stop)` to `sink`, in order,
    /// blocking whenever this handle has caught up to the stream's current
    /// length and the stream is still open. Returns the total number of
    /// bytes delivered.
    ///
    /// Consumes `self`: once this returns (successfully or not), the
    /// handle is gone and deregistered from the stream.
    pub async fn write_to<W>(mut self, sink: &mut W) -> Result<u64, CoreError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut delivered = 0u64;
        loop {
            // Register for the next wakeup *before* inspecting state, so a
            // concurrent append or close between the check below and the
            // await is never missed (tokio::sync::Notify's documented
            // pattern: the future observes any notify_waiters() call made
            // after it was created, even before it's first polled).
            let notified = self.stream.notify().notified();
            tokio::pin!(notified);

            let buf_len = self.stream.length();
            let readable_end = self.stop.clamp(buf_len);

            if self.position < readable_end {
                let want = (readable_end - self.position) as usize;
                let chunk = self.stream.read_at(self.position, want);
                if !chunk.is_empty() {
                    sink.write_all(&chunk).await.map_err(CoreError::SinkFailed)?;
                    let old = self.position;
                    self.position += chunk.len() as u64;
                    debug_assert_position_monotonic!(old, self.position);
                    delivered += chunk.len() as u64;
                    self.stream.record_delivered(chunk.len() as u64);
                    continue;
                }
            }

            let bounded_done = matches!(self.stop, Stop::Bounded(stop) if self.position >= stop);
            let closed_done = self.stream.is_closed() && self.position >= self.stream.length();
            if bounded_done || closed_done {
                break;
            }

            notified.await;
        }
        sink.flush().await.map_err(CoreError::SinkFailed)?;
        Ok(delivered)
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.stream.unobserve(self.id);
    }
}
