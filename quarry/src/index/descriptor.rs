use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use crate::collection::Document;
use crate::common::{SortOrder, OPERATOR_PREFIX};
use crate::errors::{invalid_spec, QuarryResult};

/// The definition of an ordered index: one or more field paths, each with
/// its own direction.
///
/// Two descriptors are equal when they list the same fields in the same
/// order with the same directions.
///
/// ```rust
/// use quarry::doc;
/// use quarry::index::IndexDescriptor;
///
/// let descriptor = IndexDescriptor::from_spec(&doc! { author: 1, published_year: -1 }).unwrap();
/// assert_eq!(descriptor.to_string(), "{author: 1, published_year: -1}");
/// assert!(descriptor.is_compound_index());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    inner: Arc<IndexDescriptorInner>,
}

impl IndexDescriptor {
    pub fn new(fields: Vec<(String, SortOrder)>) -> QuarryResult<Self> {
        if fields.is_empty() {
            return Err(invalid_spec("Index must have at least one field"));
        }

        for (i, (name, _)) in fields.iter().enumerate() {
            if name.is_empty() || name.starts_with(OPERATOR_PREFIX) {
                return Err(invalid_spec(&format!("Invalid index field name '{}'", name)));
            }
            if fields[..i].iter().any(|(other, _)| other == name) {
                return Err(invalid_spec(&format!("Index field '{}' is listed twice", name)));
            }
        }

        Ok(Self {
            inner: Arc::new(IndexDescriptorInner { fields }),
        })
    }

    /// Parses an index specification such as `{author: 1, published_year: -1}`.
    pub fn from_spec(spec: &Document) -> QuarryResult<Self> {
        let mut fields = Vec::with_capacity(spec.size());
        for (name, direction) in spec.iter() {
            fields.push((name.clone(), SortOrder::from_direction(name, direction)?));
        }
        IndexDescriptor::new(fields)
    }

    /// A single field ascending index.
    pub fn on_field(field_name: &str) -> QuarryResult<Self> {
        IndexDescriptor::new(vec![(field_name.to_string(), SortOrder::Ascending)])
    }

    pub fn is_compound_index(&self) -> bool {
        self.inner.fields.len() > 1
    }
}

impl Deref for IndexDescriptor {
    type Target = IndexDescriptorInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Display for IndexDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, order)) in self.inner.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, order)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct IndexDescriptorInner {
    fields: Vec<(String, SortOrder)>,
}

impl IndexDescriptorInner {
    pub fn fields(&self) -> &[(String, SortOrder)] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}
