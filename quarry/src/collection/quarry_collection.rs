use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::operation::collection_state::CollectionState;
use super::operation::{
    FindOptimizer, IndexOperations, ReadOperations, SharedState, WriteOperations, WriteResult,
};
use super::{
    Document, FindOptions, QueryExplanation, RecordId, UpdateOptions, UpdateSpec,
};
use crate::aggregation::Pipeline;
use crate::common::DocumentCursor;
use crate::errors::{ErrorKind, QuarryError, QuarryResult};
use crate::filter::{all, Filter};
use crate::index::IndexDescriptor;
use crate::quarry_config::QuarryConfig;

/// A named set of documents with their indexes.
///
/// Handles are cheap to clone and share the same collection. Reads run
/// against a snapshot taken when they start, so a query never observes a
/// write half-applied; writes are serialized.
///
/// # Examples
///
/// ```rust
/// use quarry::common::Value;
/// use quarry::doc;
/// use quarry::filter::field;
/// use quarry::Quarry;
///
/// let db = Quarry::builder().open().unwrap();
/// let books = db.collection("books").unwrap();
///
/// books.insert(doc! { title: "Dune", stock: 3 }).unwrap();
/// books.update(field("title").eq("Dune"), &doc! { "$inc": { stock: -1 } }).unwrap();
///
/// let dune = books.find_one(field("title").eq("Dune")).unwrap().unwrap();
/// assert_eq!(dune.get("stock"), Some(&Value::I64(2)));
/// ```
#[derive(Clone)]
pub struct QuarryCollection {
    inner: Arc<QuarryCollectionInner>,
}

impl QuarryCollection {
    pub(crate) fn new(name: &str, config: &QuarryConfig) -> Self {
        QuarryCollection {
            inner: Arc::new(QuarryCollectionInner::new(name, config)),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_dropped(&self) -> bool {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Inserts one document and returns its new identity.
    pub fn insert(&self, document: Document) -> QuarryResult<WriteResult> {
        self.insert_many(vec![document])
    }

    /// Inserts all documents or, if any of them is invalid, none.
    pub fn insert_many(&self, documents: Vec<Document>) -> QuarryResult<WriteResult> {
        self.inner.ensure_opened()?;
        self.inner.write_operations.insert_many(documents)
    }

    /// Applies an update specification (`$set`, `$unset`, `$inc`) to every
    /// matching document.
    pub fn update(&self, filter: Filter, update: &Document) -> QuarryResult<WriteResult> {
        self.update_with_options(filter, update, &UpdateOptions::default())
    }

    pub fn update_with_options(
        &self,
        filter: Filter,
        update: &Document,
        update_options: &UpdateOptions,
    ) -> QuarryResult<WriteResult> {
        self.inner.ensure_opened()?;
        let update = UpdateSpec::from_spec(update)?;
        self.inner
            .write_operations
            .update(&filter, &update, update_options)
    }

    /// Updates the first matching document in identity order.
    pub fn update_one(&self, filter: Filter, update: &Document) -> QuarryResult<WriteResult> {
        self.update_with_options(filter, update, &UpdateOptions::new(false, true))
    }

    pub fn remove(&self, filter: Filter, just_once: bool) -> QuarryResult<WriteResult> {
        self.inner.ensure_opened()?;
        self.inner.write_operations.remove(&filter, just_once)
    }

    pub fn find(&self, filter: Filter) -> QuarryResult<DocumentCursor> {
        self.find_with_options(filter, &FindOptions::new())
    }

    pub fn find_with_options(
        &self,
        filter: Filter,
        find_options: &FindOptions,
    ) -> QuarryResult<DocumentCursor> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.find(filter, find_options)
    }

    pub fn find_one(&self, filter: Filter) -> QuarryResult<Option<Document>> {
        self.inner.ensure_opened()?;
        self.inner
            .read_operations
            .find_one(filter, &FindOptions::new())
    }

    pub fn get_by_id(&self, id: &RecordId) -> QuarryResult<Option<Document>> {
        self.inner.ensure_opened()?;
        Ok(self.inner.read_operations.get_by_id(id))
    }

    /// Number of stored documents.
    pub fn size(&self) -> QuarryResult<usize> {
        self.inner.ensure_opened()?;
        Ok(self.inner.state.read(|state| state.records.len()))
    }

    pub fn count(&self, filter: Filter) -> QuarryResult<usize> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.count(filter)
    }

    /// Runs the query and reports the access path it used along with the
    /// keys and documents it examined.
    pub fn explain(
        &self,
        filter: Filter,
        find_options: &FindOptions,
    ) -> QuarryResult<QueryExplanation> {
        self.inner.ensure_opened()?;
        self.inner.read_operations.explain(filter, find_options)
    }

    pub fn create_index(&self, descriptor: IndexDescriptor) -> QuarryResult<()> {
        self.inner.ensure_opened()?;
        self.inner.index_operations.create_index(descriptor)
    }

    /// Creates an index from a specification such as `{author: 1, year: -1}`.
    pub fn create_index_from_spec(&self, spec: &Document) -> QuarryResult<()> {
        self.create_index(IndexDescriptor::from_spec(spec)?)
    }

    pub fn drop_index(&self, descriptor: &IndexDescriptor) -> QuarryResult<()> {
        self.inner.ensure_opened()?;
        self.inner.index_operations.drop_index(descriptor)
    }

    pub fn drop_all_indexes(&self) -> QuarryResult<()> {
        self.inner.ensure_opened()?;
        self.inner.index_operations.drop_all_indexes()
    }

    pub fn has_index(&self, descriptor: &IndexDescriptor) -> QuarryResult<bool> {
        self.inner.ensure_opened()?;
        Ok(self.inner.index_operations.has_index(descriptor))
    }

    pub fn list_indexes(&self) -> QuarryResult<Vec<IndexDescriptor>> {
        self.inner.ensure_opened()?;
        Ok(self.inner.index_operations.list_indexes())
    }

    /// Runs `pipeline` over the documents of this collection.
    ///
    /// A leading `$match` is planned like a `find`, so it can use an index.
    /// The input is a snapshot taken when the call starts.
    pub fn aggregate(&self, pipeline: &Pipeline) -> QuarryResult<Vec<Document>> {
        self.inner.ensure_opened()?;
        let (input, consumed) = match pipeline.leading_match() {
            Some(filter) => (
                self.inner
                    .read_operations
                    .find(filter.clone(), &FindOptions::new())?,
                1,
            ),
            None => (self.inner.read_operations.find(all(), &FindOptions::new())?, 0),
        };

        log::debug!(
            "Aggregating {} with {} using {}",
            self.inner.name,
            pipeline,
            input.find_plan()
        );
        pipeline.run(Box::new(input), consumed).collect()
    }

    pub(crate) fn mark_dropped(&self) {
        self.inner.dropped.store(true, Ordering::Relaxed);
        self.inner.state.write(|state| *state = CollectionState::default());
    }
}

struct QuarryCollectionInner {
    name: String,
    state: SharedState,
    read_operations: ReadOperations,
    write_operations: WriteOperations,
    index_operations: IndexOperations,
    dropped: AtomicBool,
}

impl QuarryCollectionInner {
    fn new(name: &str, config: &QuarryConfig) -> Self {
        let state = SharedState::new();
        let find_optimizer = FindOptimizer::new(config.plan_cache_limit());
        let read_operations = ReadOperations::new(state.clone(), find_optimizer.clone());
        let write_operations = WriteOperations::new(state.clone(), read_operations.clone());
        let index_operations = IndexOperations::new(state.clone(), find_optimizer);

        QuarryCollectionInner {
            name: name.to_string(),
            state,
            read_operations,
            write_operations,
            index_operations,
            dropped: AtomicBool::from(false),
        }
    }

    fn ensure_opened(&self) -> QuarryResult<()> {
        if self.dropped.load(Ordering::Relaxed) {
            log::error!("Collection '{}' is dropped and cannot be accessed", self.name);
            return Err(QuarryError::new(
                &format!("Collection '{}' is dropped and cannot be accessed", self.name),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}
