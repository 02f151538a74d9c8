use std::sync::Arc;

use super::collection_state::SharedState;
use super::read_operations::ReadOperations;
use super::write_result::WriteResult;
use crate::{
    collection::{Document, RecordId, RecordIdGenerator, UpdateOptions, UpdateSpec},
    common::DOC_ID,
    errors::{ErrorKind, QuarryError, QuarryResult},
    filter::Filter,
};

#[derive(Clone)]
pub(crate) struct WriteOperations {
    state: SharedState,
    id_generator: Arc<RecordIdGenerator>,
    read_operations: ReadOperations,
}

impl WriteOperations {
    pub fn new(state: SharedState, read_operations: ReadOperations) -> Self {
        WriteOperations {
            state,
            id_generator: Arc::new(RecordIdGenerator::new()),
            read_operations,
        }
    }

    /// Inserts all documents or none.
    ///
    /// Every document is validated before the first one is stored. Each gets
    /// a fresh `_id`, placed as its first field.
    pub fn insert_many(&self, documents: Vec<Document>) -> QuarryResult<WriteResult> {
        for document in &documents {
            if document.contains_key(DOC_ID) {
                log::error!("Document {} already carries an {} field", document, DOC_ID);
                return Err(QuarryError::new(
                    &format!("{} is assigned by the collection and cannot be supplied", DOC_ID),
                    ErrorKind::InvalidId,
                ));
            }
        }

        let ids = self.state.write(|state| {
            let mut ids = Vec::with_capacity(documents.len());
            for document in documents {
                let id = self.id_generator.next_id();
                let stored = document.with_id(id);
                for index in state.indexes.iter_mut() {
                    index.add(id, &stored);
                }
                state.records.put(id, stored);
                ids.push(id);
            }
            ids
        });

        log::debug!("Inserted {} document(s)", ids.len());
        Ok(WriteResult::new(ids))
    }

    /// Applies `update` to the records matching `filter`.
    ///
    /// All updated documents are computed before any is stored, so a failure
    /// on one record leaves the collection unchanged.
    pub fn update(
        &self,
        filter: &Filter,
        update: &UpdateSpec,
        update_options: &UpdateOptions,
    ) -> QuarryResult<WriteResult> {
        let ids = self.state.write(|state| -> QuarryResult<Vec<RecordId>> {
            let mut ids = self.read_operations.matching_ids(state, filter)?;
            if update_options.is_just_once() {
                ids.truncate(1);
            }

            if ids.is_empty() {
                if !update_options.is_insert_if_absent() {
                    return Ok(ids);
                }

                let seed = upsert_seed(filter)?;
                let inserted = update.apply(&seed)?;
                let id = self.id_generator.next_id();
                let stored = inserted.with_id(id);
                for index in state.indexes.iter_mut() {
                    index.add(id, &stored);
                }
                state.records.put(id, stored);
                log::debug!("Upserted document {:?}", id);
                return Ok(vec![id]);
            }

            let mut changes = Vec::with_capacity(ids.len());
            for id in &ids {
                if let Some(old) = state.records.get(id) {
                    let new = update.apply(old)?;
                    changes.push((*id, old.clone(), new));
                }
            }

            for (id, old, new) in changes {
                for index in state.indexes.iter_mut() {
                    index.update(id, &old, &new);
                }
                state.records.put(id, new);
            }
            Ok(ids)
        })?;

        log::debug!("Updated {} document(s) with {}", ids.len(), update);
        Ok(WriteResult::new(ids))
    }

    pub fn remove(&self, filter: &Filter, just_once: bool) -> QuarryResult<WriteResult> {
        let ids = self.state.write(|state| -> QuarryResult<Vec<RecordId>> {
            let mut ids = self.read_operations.matching_ids(state, filter)?;
            if just_once {
                ids.truncate(1);
            }

            for id in &ids {
                if let Some(document) = state.records.remove(id) {
                    for index in state.indexes.iter_mut() {
                        index.remove(*id, &document);
                    }
                }
            }
            Ok(ids)
        })?;

        log::debug!("Removed {} document(s)", ids.len());
        Ok(WriteResult::new(ids))
    }
}

/// The document an upsert starts from: the equality terms of the filter's
/// top-level conjunction.
fn upsert_seed(filter: &Filter) -> QuarryResult<Document> {
    let mut seed = Document::new();
    for conjunct in filter.conjuncts() {
        if let Some((field, value)) = conjunct.equality_term() {
            if field != DOC_ID && !seed.contains_field(field) {
                seed.put(field, value.clone())?;
            }
        }
    }
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::operation::find_optimizer::FindOptimizer;
    use crate::collection::{insert_if_absent, just_once, FindOptions};
    use crate::common::Value;
    use crate::doc;
    use crate::filter::{all, field};
    use crate::index::{IndexDescriptor, IndexScan, OrderedIndex};

    fn operations() -> (SharedState, ReadOperations, WriteOperations) {
        let state = SharedState::new();
        state.write(|s| {
            s.indexes
                .push(OrderedIndex::new(IndexDescriptor::on_field("stock").unwrap()))
        });
        let read = ReadOperations::new(state.clone(), FindOptimizer::new(10));
        let write = WriteOperations::new(state.clone(), read.clone());
        (state, read, write)
    }

    fn stock_lookup(state: &SharedState, stock: i64) -> usize {
        state.read(|s| {
            let index = &s.indexes[0];
            let scan = IndexScan::new(index.descriptor().clone(), vec![Value::I64(stock)], None);
            index.lookup(&scan).ids.len()
        })
    }

    #[test]
    fn insert_assigns_increasing_ids_first() {
        let (_, read, write) = operations();
        let result = write
            .insert_many(vec![doc! { title: "A", stock: 1 }, doc! { title: "B", stock: 2 }])
            .unwrap();
        let ids = result.affected_record_ids();
        assert!(ids[0] < ids[1]);

        let stored = read.get_by_id(&ids[0]).unwrap();
        assert_eq!(stored.keys().next().map(|k| k.as_str()), Some(DOC_ID));
        assert_eq!(stored.get("title"), Some(&Value::from("A")));
    }

    #[test]
    fn insert_rejects_caller_ids_atomically() {
        let (_, read, write) = operations();
        let err = write
            .insert_many(vec![doc! { title: "A" }, doc! { _id: 5, title: "B" }])
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
        assert_eq!(read.count(all()).unwrap(), 0);
    }

    #[test]
    fn update_maintains_indexes() {
        let (state, read, write) = operations();
        write
            .insert_many(vec![doc! { title: "A", stock: 1 }, doc! { title: "B", stock: 1 }])
            .unwrap();
        assert_eq!(stock_lookup(&state, 1), 2);

        let update = UpdateSpec::from_spec(&doc! { "$inc": { stock: 4 } }).unwrap();
        let result = write
            .update(&field("title").eq("A"), &update, &UpdateOptions::default())
            .unwrap();
        assert_eq!(result.affected_count(), 1);
        assert_eq!(stock_lookup(&state, 1), 1);
        assert_eq!(stock_lookup(&state, 5), 1);
        assert_eq!(read.count(field("stock").eq(5)).unwrap(), 1);
    }

    #[test]
    fn update_just_once_touches_first_match() {
        let (_, read, write) = operations();
        let inserted = write
            .insert_many(vec![doc! { stock: 1 }, doc! { stock: 1 }])
            .unwrap();
        let update = UpdateSpec::from_spec(&doc! { "$set": { flagged: true } }).unwrap();
        let result = write.update(&field("stock").eq(1), &update, &just_once()).unwrap();
        assert_eq!(result.affected_record_ids(), &inserted.affected_record_ids()[..1]);
        assert_eq!(read.count(field("flagged").eq(true)).unwrap(), 1);
    }

    #[test]
    fn failed_update_changes_nothing() {
        let (_, read, write) = operations();
        write
            .insert_many(vec![doc! { stock: 1 }, doc! { stock: "many" }])
            .unwrap();
        let update = UpdateSpec::from_spec(&doc! { "$inc": { stock: 1 } }).unwrap();
        assert!(write.update(&all(), &update, &UpdateOptions::default()).is_err());
        assert_eq!(read.count(field("stock").eq(1)).unwrap(), 1);
    }

    #[test]
    fn upsert_seeds_from_equality_terms() {
        let (_, read, write) = operations();
        let update = UpdateSpec::from_spec(&doc! { "$inc": { stock: 3 } }).unwrap();
        let filter = field("title").eq("New").and(field("meta.kind").eq("book"));

        let result = write.update(&filter, &update, &insert_if_absent()).unwrap();
        assert_eq!(result.affected_count(), 1);

        let stored = read.find_one(filter.clone(), &FindOptions::new()).unwrap().unwrap();
        assert_eq!(stored.get("meta.kind"), Some(&Value::from("book")));
        assert_eq!(stored.get("stock"), Some(&Value::I64(3)));

        let result = write.update(&filter, &update, &insert_if_absent()).unwrap();
        assert_eq!(result.affected_record_ids(), &[stored.id().unwrap()]);
        assert_eq!(read.count(all()).unwrap(), 1);
    }

    #[test]
    fn zero_matches_is_not_an_error() {
        let (_, _, write) = operations();
        let update = UpdateSpec::from_spec(&doc! { "$set": { a: 1 } }).unwrap();
        assert!(write
            .update(&field("a").eq(0), &update, &UpdateOptions::default())
            .unwrap()
            .is_empty());
        assert!(write.remove(&field("a").eq(0), false).unwrap().is_empty());
    }

    #[test]
    fn remove_drops_records_and_index_entries() {
        let (state, read, write) = operations();
        write
            .insert_many(vec![doc! { stock: 1 }, doc! { stock: 1 }, doc! { stock: 2 }])
            .unwrap();

        assert_eq!(write.remove(&field("stock").eq(1), true).unwrap().affected_count(), 1);
        assert_eq!(stock_lookup(&state, 1), 1);

        assert_eq!(write.remove(&all(), false).unwrap().affected_count(), 2);
        assert_eq!(stock_lookup(&state, 2), 0);
        assert_eq!(read.count(all()).unwrap(), 0);
    }
}
