use im::{OrdMap, OrdSet};
use itertools::Itertools;

use crate::collection::{Document, RecordId};

use super::index_key::{index_keys, IndexKey, KeyPart};
use super::{IndexDescriptor, IndexScan};

/// Result of an index lookup.
#[derive(Debug, Default)]
pub struct IndexLookup {
    /// Candidate identities in index order, without duplicates.
    pub ids: Vec<RecordId>,
    pub keys_examined: usize,
}

/// An ordered index from [IndexKey] to the identities filed under it.
///
/// The entries live in a persistent map, so cloning an index is O(1) and a
/// clone taken for a read is unaffected by later writes.
#[derive(Clone)]
pub struct OrderedIndex {
    descriptor: IndexDescriptor,
    entries: OrdMap<IndexKey, OrdSet<RecordId>>,
}

impl OrderedIndex {
    pub(crate) fn new(descriptor: IndexDescriptor) -> Self {
        OrderedIndex {
            descriptor,
            entries: OrdMap::new(),
        }
    }

    /// Builds an index over existing records.
    pub(crate) fn build<'a>(
        descriptor: IndexDescriptor,
        records: impl Iterator<Item = (&'a RecordId, &'a Document)>,
    ) -> Self {
        let mut index = OrderedIndex::new(descriptor);
        for (id, document) in records {
            index.add(*id, document);
        }
        index
    }

    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn add(&mut self, id: RecordId, document: &Document) {
        for key in index_keys(&self.descriptor, document) {
            self.add_key(key, id);
        }
    }

    pub(crate) fn remove(&mut self, id: RecordId, document: &Document) {
        for key in index_keys(&self.descriptor, document) {
            self.remove_key(&key, id);
        }
    }

    /// Moves `id` from the keys of `old` to the keys of `new`, touching only
    /// keys that differ.
    pub(crate) fn update(&mut self, id: RecordId, old: &Document, new: &Document) {
        let old_keys = index_keys(&self.descriptor, old);
        let new_keys = index_keys(&self.descriptor, new);

        for key in old_keys.iter() {
            if new_keys.binary_search(key).is_err() {
                self.remove_key(key, id);
            }
        }
        for key in new_keys {
            if old_keys.binary_search(&key).is_err() {
                self.add_key(key, id);
            }
        }
    }

    fn add_key(&mut self, key: IndexKey, id: RecordId) {
        let mut ids = self.entries.get(&key).cloned().unwrap_or_default();
        ids.insert(id);
        self.entries.insert(key, ids);
    }

    fn remove_key(&mut self, key: &IndexKey, id: RecordId) {
        if let Some(ids) = self.entries.get(key) {
            let mut ids = ids.clone();
            ids.remove(&id);
            if ids.is_empty() {
                self.entries.remove(key);
            } else {
                self.entries.insert(key.clone(), ids);
            }
        }
    }

    /// Collects candidate identities for a scan in index order.
    ///
    /// Keys sharing the equality prefix are contiguous, and so are the keys
    /// whose next part satisfies the range, so the walk starts at the first
    /// possible key and stops at the first key past the matching run.
    pub fn lookup(&self, scan: &IndexScan) -> IndexLookup {
        let fields = self.descriptor.fields();
        let prefix: IndexKey = scan
            .equality()
            .iter()
            .zip(fields.iter())
            .map(|(value, (_, order))| KeyPart::new(value.clone(), *order))
            .collect();
        let prefix_len = prefix.len();

        let range = scan
            .range()
            .and_then(|(mode, bound)| fields.get(prefix_len).map(|(_, order)| (mode, bound, *order)));

        let start = match range {
            Some((mode, bound, order)) if mode.is_lower_bound() != order.is_descending() => {
                prefix.extended(KeyPart::new(bound.clone(), order))
            }
            _ => prefix.clone(),
        };

        let mut lookup = IndexLookup::default();
        let mut in_range = false;
        let mut ids = Vec::new();
        for (key, key_ids) in self.entries.range(start..) {
            lookup.keys_examined += 1;
            if !key.starts_with(&prefix) {
                break;
            }

            if let Some((mode, bound, _)) = range {
                let matches = key
                    .parts()
                    .get(prefix_len)
                    .is_some_and(|part| mode.test(part.value(), bound));
                if !matches {
                    if in_range {
                        break;
                    }
                    continue;
                }
                in_range = true;
            }

            ids.extend(key_ids.iter().copied());
        }

        lookup.ids = ids.into_iter().unique().collect();
        lookup
    }
}
