use super::collection_state::{CollectionState, SharedState};
use super::find_optimizer::FindOptimizer;
use crate::errors::QuarryResult;
use crate::index::{IndexDescriptor, OrderedIndex};

#[derive(Clone)]
pub(crate) struct IndexOperations {
    state: SharedState,
    find_optimizer: FindOptimizer,
}

impl IndexOperations {
    pub fn new(state: SharedState, find_optimizer: FindOptimizer) -> Self {
        IndexOperations {
            state,
            find_optimizer,
        }
    }

    /// Builds an index over the current records.
    ///
    /// Creating an index that already exists is a no-op. The index is built
    /// under the write lock, so no write can slip in between the build and
    /// the moment the index starts being maintained.
    pub fn create_index(&self, descriptor: IndexDescriptor) -> QuarryResult<()> {
        let created = self.state.write(|state| {
            if state.find_index(&descriptor).is_some() {
                return false;
            }
            let index = OrderedIndex::build(descriptor.clone(), state.records.iter());
            log::debug!(
                "Built index {} with {} key(s) over {} record(s)",
                descriptor,
                index.key_count(),
                state.records.len()
            );
            state.indexes.push(index);
            self.indexes_changed(state);
            true
        });

        if !created {
            log::warn!("Index {} already exists", descriptor);
        }
        Ok(())
    }

    pub fn drop_index(&self, descriptor: &IndexDescriptor) -> QuarryResult<()> {
        let dropped = self.state.write(|state| {
            let before = state.indexes.len();
            state.indexes.retain(|index| index.descriptor() != descriptor);
            let dropped = before != state.indexes.len();
            if dropped {
                self.indexes_changed(state);
            }
            dropped
        });

        if dropped {
            log::debug!("Dropped index {}", descriptor);
        }
        Ok(())
    }

    pub fn drop_all_indexes(&self) -> QuarryResult<()> {
        self.state.write(|state| {
            if !state.indexes.is_empty() {
                state.indexes.clear();
                self.indexes_changed(state);
            }
        });
        Ok(())
    }

    // must run under the write lock that changed the index set
    fn indexes_changed(&self, state: &mut CollectionState) {
        state.indexes_changed();
        self.find_optimizer.invalidate_cache();
    }

    pub fn has_index(&self, descriptor: &IndexDescriptor) -> bool {
        self.state
            .read(|state| state.find_index(descriptor).is_some())
    }

    /// Index definitions in creation order.
    pub fn list_indexes(&self) -> Vec<IndexDescriptor> {
        self.state.read(|state| state.index_descriptors())
    }
}
