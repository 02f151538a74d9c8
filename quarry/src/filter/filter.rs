use crate::collection::{Document, RecordId};
use crate::common::{Value, DOC_ID};
use std::any::Any;
use std::fmt::{Debug, Display};
use std::ops::Deref;
use std::sync::Arc;

use super::{AllFilter, AndFilter, ComparisonMode, EqualsFilter, NorFilter, NotFilter, OrFilter};

/// A predicate over a single [Document].
///
/// Evaluation is pure and infallible: a comparison between incompatible
/// types is simply `false`. All validation happens when the filter is
/// built.
///
/// Besides [FilterProvider::apply], a provider can describe itself to the
/// query planner. Equality and range providers report the term they test so
/// that an index can serve it, and `AND` providers expose their children so
/// the planner can flatten them.
pub trait FilterProvider: Any + Send + Sync + Display {
    fn apply(&self, entry: &Document) -> bool;

    fn field_name(&self) -> Option<&str> {
        None
    }

    /// The `(field, value)` pair of an index-servable equality test.
    fn equality_term(&self) -> Option<(&str, &Value)> {
        None
    }

    /// The `(field, mode, bound)` triple of an index-servable range test.
    fn range_term(&self) -> Option<(&str, ComparisonMode, &Value)> {
        None
    }

    fn logical_filters(&self) -> Option<&[Filter]> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// A shareable, immutable filter.
///
/// Filters are built from a specification document with
/// [Filter::from_spec] or with the fluent helpers in this module.
///
/// # Examples
///
/// ```rust
/// use quarry::doc;
/// use quarry::filter::{field, Filter};
///
/// let fluent = field("price").gt(10).and(field("author").eq("Orwell"));
/// let parsed = Filter::from_spec(&doc! { price: { "$gt": 10 }, author: "Orwell" }).unwrap();
///
/// let book = doc! { title: "1984", author: "Orwell", price: 12 };
/// assert!(fluent.apply(&book));
/// assert!(parsed.apply(&book));
/// ```
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }

    pub fn is_all_filter(&self) -> bool {
        self.inner.as_any().is::<AllFilter>()
    }

    pub fn is_and_filter(&self) -> bool {
        self.inner.as_any().is::<AndFilter>()
    }

    /// Flattens nested `AND` filters into their conjuncts.
    pub(crate) fn conjuncts(&self) -> Vec<Filter> {
        match self.inner.logical_filters() {
            Some(children) if self.is_and_filter() => {
                children.iter().flat_map(|child| child.conjuncts()).collect()
            }
            _ => vec![self.clone()],
        }
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Matches every document.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

/// Matches the document with the given record identity.
pub fn by_id(id: RecordId) -> Filter {
    Filter::new(EqualsFilter::new(DOC_ID.to_string(), Value::Id(id)))
}

pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

pub fn nor(filters: Vec<Filter>) -> Filter {
    Filter::new(NorFilter::new(filters))
}

pub fn not(filter: Filter) -> Filter {
    Filter::new(NotFilter::new(filter))
}
