use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag for a running scan.
///
/// Clones share the same flag: hand one clone to [crate::collection::FindOptions]
/// and keep another to call [InterruptHandle::interrupt] from any thread.
/// The scan notices the flag before reading its next record and yields an
/// [crate::errors::ErrorKind::Interrupted] error.
#[derive(Clone, Debug, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        InterruptHandle {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
