use parking_lot::RwLock;
use std::sync::Arc;

use crate::index::{IndexDescriptor, OrderedIndex};
use crate::store::RecordStore;

/// Records and indexes of one collection.
///
/// Both live in persistent maps, so a clone is an O(1) snapshot that later
/// writes do not affect. `index_generation` changes with every change to
/// the set of indexes and tags the plans made from a snapshot.
#[derive(Clone, Default)]
pub(crate) struct CollectionState {
    pub(crate) records: RecordStore,
    pub(crate) indexes: Vec<OrderedIndex>,
    pub(crate) index_generation: u64,
}

impl CollectionState {
    pub(crate) fn indexes_changed(&mut self) {
        self.index_generation += 1;
    }

    pub(crate) fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes
            .iter()
            .map(|index| index.descriptor().clone())
            .collect()
    }

    pub(crate) fn find_index(&self, descriptor: &IndexDescriptor) -> Option<&OrderedIndex> {
        self.indexes
            .iter()
            .find(|index| index.descriptor() == descriptor)
    }
}

/// State shared by the read, write and index operations of a collection.
///
/// Writers hold the write lock for the whole change, index maintenance
/// included. Readers hold the read lock only while cloning a snapshot.
#[derive(Clone, Default)]
pub(crate) struct SharedState {
    inner: Arc<RwLock<CollectionState>>,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        SharedState::default()
    }

    pub(crate) fn snapshot(&self) -> CollectionState {
        self.inner.read().clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&CollectionState) -> R) -> R {
        f(&self.inner.read())
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut CollectionState) -> R) -> R {
        f(&mut self.inner.write())
    }
}
