use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Work counters of one query execution, as reported by `explain`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Index keys visited by the index lookup.
    pub keys_examined: usize,
    /// Records fetched from the store and tested against the filter.
    pub docs_examined: usize,
    /// Documents handed to the caller.
    pub returned: usize,
}

/// Shared counters the streams of one query increment while they run.
#[derive(Clone, Default)]
pub(crate) struct StatsRecorder {
    keys_examined: Arc<AtomicUsize>,
    docs_examined: Arc<AtomicUsize>,
    returned: Arc<AtomicUsize>,
}

impl StatsRecorder {
    pub(crate) fn new() -> Self {
        StatsRecorder::default()
    }

    pub(crate) fn add_keys_examined(&self, count: usize) {
        self.keys_examined.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn doc_examined(&self) {
        self.docs_examined.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn doc_returned(&self) {
        self.returned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ExecutionStats {
        ExecutionStats {
            keys_examined: self.keys_examined.load(Ordering::Relaxed),
            docs_examined: self.docs_examined.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
        }
    }
}
