//! Single-writer / many-reader byte log fan-out buffer.
//!
//! A [`Stream`] accepts one producer's bytes via [`Stream::consume`] and lets
//! any number of [`ObserverHandle`]s read the same bytes concurrently, each
//! from its own offset, whether or not the producer has finished. This is
//! the core of a live log relay: the HTTP plumbing, access control, and
//! process configuration all live above this crate.
//!
//! # Coordination
//!
//! Appends and close are published through a single [`tokio::sync::Notify`]
//! broadcast to every waiting observer (`notify_waiters`, not `notify_one`):
//! a single-slot wakeup would lose wakeups with more than one observer
//! attached. Observers never trust a wakeup alone; they always recompute
//! what's available against [`Stream`]'s current length before deciding to
//! wait again.

mod buffer;
mod error;
mod invariants;
mod metrics;
mod observer;
mod range;
mod stream;

pub use error::CoreError;
pub use metrics::MetricsSnapshot;
pub use observer::ObserverHandle;
pub use range::{parse_range, RangeError, Stop};
pub use stream::Stream;
