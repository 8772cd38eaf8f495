//! Error types for the core fan-out buffer.

use thiserror::Error;

/// Errors that can occur while driving a [`crate::Stream`] or delivering
/// bytes through an [`crate::ObserverHandle`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// The producer source could not be prepared for reading.
    #[error("failed to open stream: {0}")]
    StreamOpenFailed(#[source] std::io::Error),

    /// Reading from the producer source failed mid-stream.
    #[error("producer read failed: {0}")]
    ProducerFailed(#[source] std::io::Error),

    /// Writing to an observer's sink failed (the consumer disconnected).
    #[error("sink write failed: {0}")]
    SinkFailed(#[source] std::io::Error),
}

impl CoreError {
    /// Returns `true` if the caller may retry the operation that produced
    /// this error (only `StreamOpenFailed`: the single-producer latch is
    /// released on this path so a fresh PUT can be attempted).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StreamOpenFailed(_))
    }

    /// Returns `true` if this error permanently ends the affected side
    /// (the stream for a producer error, or just the one observer for a
    /// sink error).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ProducerFailed(_) | Self::SinkFailed(_))
    }
}
