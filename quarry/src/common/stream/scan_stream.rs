use crate::collection::{Document, RecordId};
use crate::common::InterruptHandle;
use crate::errors::{ErrorKind, QuarryError, QuarryResult};
use crate::store::RecordStore;

use super::StatsRecorder;

/// Yields the `Interrupted` error when the handle has been set.
pub(crate) fn check_interrupt(interrupt: &Option<InterruptHandle>) -> QuarryResult<()> {
    match interrupt {
        Some(handle) if handle.is_interrupted() => {
            log::warn!("Scan interrupted by caller");
            Err(QuarryError::new("Scan interrupted", ErrorKind::Interrupted))
        }
        _ => Ok(()),
    }
}

/// Walks every record of a store snapshot in insertion order.
pub(crate) struct ScanStream {
    records: RecordStore,
    last_id: Option<RecordId>,
    interrupt: Option<InterruptHandle>,
    stats: StatsRecorder,
    done: bool,
}

impl ScanStream {
    pub fn new(records: RecordStore, interrupt: Option<InterruptHandle>, stats: StatsRecorder) -> Self {
        ScanStream {
            records,
            last_id: None,
            interrupt,
            stats,
            done: false,
        }
    }
}

impl Iterator for ScanStream {
    type Item = QuarryResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Err(e) = check_interrupt(&self.interrupt) {
            self.done = true;
            return Some(Err(e));
        }

        match self.records.next_after(self.last_id.as_ref()) {
            Some((id, document)) => {
                self.last_id = Some(*id);
                self.stats.doc_examined();
                Some(Ok(document.clone()))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
