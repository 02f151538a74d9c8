use crate::collection::{Projection, RecordId};
use crate::common::{SortableFields, COLLECTION_SCAN, INDEX_SCAN};
use crate::filter::Filter;
use crate::index::IndexScan;
use icu_collator::options::CollatorOptions;
use std::fmt::Display;
use std::sync::Arc;

const ID_LOOKUP: &str = "IDLOOKUP";

/// How candidate records are produced before filtering.
#[derive(Clone, Debug)]
pub enum AccessPath {
    /// Every record in insertion order.
    CollectionScan,
    /// The records an index lookup returns, in index order.
    IndexScan(IndexScan),
    /// At most one record, fetched by identity.
    IdLookup(RecordId),
}

impl AccessPath {
    /// The stage name reported by `explain`.
    pub fn stage(&self) -> &'static str {
        match self {
            AccessPath::CollectionScan => COLLECTION_SCAN,
            AccessPath::IndexScan(_) => INDEX_SCAN,
            AccessPath::IdLookup(_) => ID_LOOKUP,
        }
    }
}

impl Display for AccessPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessPath::CollectionScan => write!(f, "{}", COLLECTION_SCAN),
            AccessPath::IndexScan(scan) => write!(f, "{} {}", INDEX_SCAN, scan),
            AccessPath::IdLookup(id) => write!(f, "{} {}", ID_LOOKUP, id),
        }
    }
}

/// The executable form of a find: an access path plus the pipeline applied
/// to its output.
///
/// The complete filter is always kept and re-applied to every candidate,
/// so the access path only changes how much work a query does, never its
/// result.
#[derive(Clone)]
pub struct FindPlan {
    inner: Arc<FindPlanInner>,
}

impl FindPlan {
    pub(crate) fn new(access_path: AccessPath, filter: Filter) -> Self {
        FindPlan {
            inner: Arc::new(FindPlanInner {
                access_path,
                filter,
                sort_by: None,
                skip: None,
                limit: None,
                projection: None,
                collator_options: None,
            }),
        }
    }

    pub fn access_path(&self) -> &AccessPath {
        &self.inner.access_path
    }

    pub fn filter(&self) -> &Filter {
        &self.inner.filter
    }

    pub fn sort_by(&self) -> Option<&SortableFields> {
        self.inner.sort_by.as_ref()
    }

    pub fn skip(&self) -> Option<u64> {
        self.inner.skip
    }

    pub fn limit(&self) -> Option<u64> {
        self.inner.limit
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.inner.projection.as_ref()
    }

    pub fn collator_options(&self) -> Option<CollatorOptions> {
        self.inner.collator_options
    }

    // setters are used by the optimizer before the plan is shared
    pub(crate) fn set_sort_by(&mut self, sort_by: Option<SortableFields>) {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.sort_by = sort_by.filter(|fields| !fields.is_empty());
        }
    }

    pub(crate) fn set_skip(&mut self, skip: Option<u64>) {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.skip = skip;
        }
    }

    pub(crate) fn set_limit(&mut self, limit: Option<u64>) {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.limit = limit;
        }
    }

    pub(crate) fn set_projection(&mut self, projection: Option<Projection>) {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.projection = projection;
        }
    }

    pub(crate) fn set_collator_options(&mut self, options: Option<CollatorOptions>) {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.collator_options = options;
        }
    }
}

struct FindPlanInner {
    access_path: AccessPath,
    filter: Filter,
    sort_by: Option<SortableFields>,
    skip: Option<u64>,
    limit: Option<u64>,
    projection: Option<Projection>,
    collator_options: Option<CollatorOptions>,
}

impl Display for FindPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} filter={}", self.access_path(), self.filter())?;
        if let Some(sort_by) = self.sort_by() {
            write!(f, " sort={}", sort_by)?;
        }
        if let Some(skip) = self.skip() {
            write!(f, " skip={}", skip)?;
        }
        if let Some(limit) = self.limit() {
            write!(f, " limit={}", limit)?;
        }
        if let Some(projection) = self.projection() {
            write!(f, " projection={}", projection)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for FindPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FindPlan({})", self)
    }
}
