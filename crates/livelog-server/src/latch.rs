//! The single-producer latch: the core trusts the collaborator to enforce
//! this, so it lives entirely in this crate.

use tokio::sync::Mutex;

/// Guards against a concurrent PUT while one is already being ingested.
/// Taken before `consume` starts; released only on `StreamOpenFailed` (so a
/// retry is possible) or process exit — never on normal completion, since
/// this system is designed for exactly one job per process lifetime.
#[derive(Default)]
pub(crate) struct ProducerLatch {
    busy: Mutex<bool>,
}

impl ProducerLatch {
    /// Attempts to take the latch. Returns `false` if already held.
    pub(crate) async fn try_acquire(&self) -> bool {
        let mut busy = self.busy.lock().await;
        if *busy {
            false
        } else {
            *busy = true;
            true
        }
    }

    /// Releases the latch so a subsequent PUT can be attempted.
    pub(crate) async fn release(&self) {
        *self.busy.lock().await = false;
    }
}
