use crate::collection::{Document, RecordId};
use crate::common::InterruptHandle;
use crate::errors::QuarryResult;
use crate::store::RecordStore;

use super::{check_interrupt, StatsRecorder};

/// Fetches the records of an index lookup, in lookup order, from a store
/// snapshot.
pub(crate) struct IndexedStream {
    records: RecordStore,
    ids: std::vec::IntoIter<RecordId>,
    interrupt: Option<InterruptHandle>,
    stats: StatsRecorder,
    done: bool,
}

impl IndexedStream {
    pub fn new(
        records: RecordStore,
        ids: Vec<RecordId>,
        interrupt: Option<InterruptHandle>,
        stats: StatsRecorder,
    ) -> Self {
        IndexedStream {
            records,
            ids: ids.into_iter(),
            interrupt,
            stats,
            done: false,
        }
    }
}

impl Iterator for IndexedStream {
    type Item = QuarryResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Err(e) = check_interrupt(&self.interrupt) {
                self.done = true;
                return Some(Err(e));
            }

            let id = self.ids.next()?;
            // index and records come from the same snapshot, a miss is skipped
            if let Some(document) = self.records.get(&id) {
                self.stats.doc_examined();
                return Some(Ok(document.clone()));
            }
            log::warn!("Index entry {:?} has no record", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn follows_id_order_and_skips_unknown_ids() {
        let mut store = RecordStore::new();
        let ids: Vec<RecordId> = (1..=3).map(|raw| RecordId::from_raw(raw).unwrap()).collect();
        for (n, id) in ids.iter().enumerate() {
            store.put(*id, doc! { n: (n as i64) }.with_id(*id));
        }

        let order = vec![ids[2], RecordId::from_raw(99).unwrap(), ids[0]];
        let stats = StatsRecorder::new();
        let found: Vec<RecordId> = IndexedStream::new(store, order, None, stats.clone())
            .map(|doc| doc.unwrap().id().unwrap())
            .collect();
        assert_eq!(found, vec![ids[2], ids[0]]);
        assert_eq!(stats.snapshot().docs_examined, 2);
    }
}
