use icu_collator::{Collator, CollatorPreferences};

use super::collection_state::{CollectionState, SharedState};
use super::find_optimizer::FindOptimizer;
use crate::{
    collection::{AccessPath, Document, FindOptions, FindPlan, QueryExplanation, RecordId},
    common::{
        stream::{
            DocumentStream, FilteredStream, IndexedStream, PagedStream, ProjectedStream,
            ScanStream, SortedStream, StatsRecorder,
        },
        DocumentCursor, InterruptHandle,
    },
    errors::{ErrorKind, QuarryError, QuarryResult},
    filter::Filter,
};

#[derive(Clone)]
pub(crate) struct ReadOperations {
    state: SharedState,
    find_optimizer: FindOptimizer,
}

impl ReadOperations {
    pub fn new(state: SharedState, find_optimizer: FindOptimizer) -> Self {
        ReadOperations {
            state,
            find_optimizer,
        }
    }

    /// Plans the query against a fresh snapshot and returns a lazy cursor
    /// over that snapshot.
    pub fn find(&self, filter: Filter, find_options: &FindOptions) -> QuarryResult<DocumentCursor> {
        let snapshot = self.state.snapshot();
        self.find_in(snapshot, &filter, find_options)
    }

    pub fn find_one(&self, filter: Filter, find_options: &FindOptions) -> QuarryResult<Option<Document>> {
        let limit = find_options.limit.map_or(1, |limit| limit.min(1));
        let find_options = find_options.clone().limit(limit);
        self.find(filter, &find_options)?.first()
    }

    pub fn get_by_id(&self, id: &RecordId) -> Option<Document> {
        self.state.read(|state| state.records.get(id).cloned())
    }

    pub fn count(&self, filter: Filter) -> QuarryResult<usize> {
        self.find(filter, &FindOptions::new())?.size()
    }

    /// Runs the query to completion and reports the plan with its statistics.
    pub fn explain(&self, filter: Filter, find_options: &FindOptions) -> QuarryResult<QueryExplanation> {
        let mut cursor = self.find(filter, find_options)?;
        cursor.size()?;
        Ok(QueryExplanation::new(
            cursor.find_plan().clone(),
            cursor.execution_stats(),
        ))
    }

    /// Identities of the records in `state` matching `filter`, in identity
    /// order. Used by writers that already hold the write lock.
    pub(crate) fn matching_ids(&self, state: &CollectionState, filter: &Filter) -> QuarryResult<Vec<RecordId>> {
        let mut ids = Vec::new();
        for document in self.find_in(state.clone(), filter, &FindOptions::new())? {
            if let Some(id) = document?.id() {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn find_in(
        &self,
        snapshot: CollectionState,
        filter: &Filter,
        find_options: &FindOptions,
    ) -> QuarryResult<DocumentCursor> {
        let index_descriptors = snapshot.index_descriptors();
        let find_plan = self.find_optimizer.create_find_plan(
            filter,
            find_options,
            &index_descriptors,
            snapshot.index_generation,
        )?;
        self.create_cursor(snapshot, find_plan, find_options.interrupt.clone())
    }

    fn create_cursor(
        &self,
        snapshot: CollectionState,
        find_plan: FindPlan,
        interrupt: Option<InterruptHandle>,
    ) -> QuarryResult<DocumentCursor> {
        let stats = StatsRecorder::new();
        let mut stream = self.candidate_stream(snapshot, &find_plan, interrupt, &stats);

        if !find_plan.filter().is_all_filter() {
            stream = Box::new(FilteredStream::new(stream, find_plan.filter().clone()));
        }

        if let Some(sort_by) = find_plan.sort_by() {
            let collator = match find_plan.collator_options() {
                Some(options) => Some(
                    Collator::try_new(CollatorPreferences::default(), options).map_err(|e| {
                        log::error!("Failed to create collator: {}", e);
                        QuarryError::new(
                            &format!("Failed to create collator: {}", e),
                            ErrorKind::InvalidSpecification,
                        )
                    })?,
                ),
                None => None,
            };
            stream = Box::new(SortedStream::new(
                stream,
                sort_by.sorting_order().to_vec(),
                collator,
            ));
        }

        if find_plan.skip().is_some() || find_plan.limit().is_some() {
            stream = Box::new(PagedStream::new(stream, find_plan.skip(), find_plan.limit()));
        }

        if let Some(projection) = find_plan.projection() {
            stream = Box::new(ProjectedStream::new(stream, projection.clone()));
        }

        Ok(DocumentCursor::new(stream, find_plan, stats))
    }

    fn candidate_stream(
        &self,
        snapshot: CollectionState,
        find_plan: &FindPlan,
        interrupt: Option<InterruptHandle>,
        stats: &StatsRecorder,
    ) -> DocumentStream {
        match find_plan.access_path() {
            AccessPath::CollectionScan => {
                Box::new(ScanStream::new(snapshot.records, interrupt, stats.clone()))
            }
            AccessPath::IdLookup(id) => {
                let ids = if snapshot.records.contains(id) {
                    vec![*id]
                } else {
                    Vec::new()
                };
                Box::new(IndexedStream::new(snapshot.records, ids, interrupt, stats.clone()))
            }
            AccessPath::IndexScan(scan) => {
                let lookup = snapshot
                    .find_index(scan.descriptor())
                    .map(|index| index.lookup(scan));
                match lookup {
                    Some(lookup) => {
                        stats.add_keys_examined(lookup.keys_examined);
                        Box::new(IndexedStream::new(
                            snapshot.records,
                            lookup.ids,
                            interrupt,
                            stats.clone(),
                        ))
                    }
                    None => {
                        log::warn!(
                            "Index {} is gone, falling back to a collection scan",
                            scan.descriptor()
                        );
                        Box::new(ScanStream::new(snapshot.records, interrupt, stats.clone()))
                    }
                }
            }
        }
    }
}
