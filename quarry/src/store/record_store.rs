use im::OrdMap;
use std::ops::Bound::{Excluded, Unbounded};

use crate::collection::{Document, RecordId};

/// Documents of one collection keyed by record identity.
///
/// Identities increase with every insert, so key order is insertion order.
/// The map is persistent: `clone` is O(1) and yields a snapshot that later
/// writes do not affect.
#[derive(Clone, Default)]
pub struct RecordStore {
    records: OrdMap<RecordId, Document>,
}

impl RecordStore {
    pub fn new() -> Self {
        RecordStore {
            records: OrdMap::new(),
        }
    }

    pub fn get(&self, id: &RecordId) -> Option<&Document> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stores a document, returning the one it replaced.
    pub(crate) fn put(&mut self, id: RecordId, document: Document) -> Option<Document> {
        self.records.insert(id, document)
    }

    pub(crate) fn remove(&mut self, id: &RecordId) -> Option<Document> {
        self.records.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &Document)> {
        self.records.iter()
    }

    /// The first record stored after `id`, or the first record when `id` is
    /// `None`.
    pub fn next_after(&self, id: Option<&RecordId>) -> Option<(&RecordId, &Document)> {
        match id {
            None => self.records.iter().next(),
            Some(id) => self.records.range((Excluded(id), Unbounded)).next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn id(raw: u64) -> RecordId {
        RecordId::from_raw(raw).unwrap()
    }

    #[test]
    fn iterates_in_identity_order() {
        let mut store = RecordStore::new();
        store.put(id(3), doc! { n: 3 });
        store.put(id(1), doc! { n: 1 });
        store.put(id(2), doc! { n: 2 });
        let ids: Vec<u64> = store.iter().map(|(id, _)| id.id_value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn next_after_steps_through_records() {
        let mut store = RecordStore::new();
        store.put(id(1), doc! { n: 1 });
        store.put(id(5), doc! { n: 5 });
        let (first, _) = store.next_after(None).unwrap();
        assert_eq!(first.id_value(), 1);
        let (second, _) = store.next_after(Some(first)).unwrap();
        assert_eq!(second.id_value(), 5);
        assert!(store.next_after(Some(&id(5))).is_none());
    }

    #[test]
    fn snapshot_is_isolated() {
        let mut store = RecordStore::new();
        store.put(id(1), doc! { n: 1 });
        let snapshot = store.clone();
        store.put(id(1), doc! { n: 100 });
        store.put(id(2), doc! { n: 2 });
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(&id(1)), Some(&doc! { n: 1 }));
        assert_eq!(store.remove(&id(2)), Some(doc! { n: 2 }));
        assert!(!store.contains(&id(2)));
    }
}
