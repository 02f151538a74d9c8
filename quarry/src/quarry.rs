use std::sync::Arc;

use dashmap::DashMap;
use itertools::Itertools;

use crate::collection::QuarryCollection;
use crate::common::{FIELD_SEPARATOR, OPERATOR_PREFIX};
use crate::errors::{ErrorKind, QuarryError, QuarryResult};
use crate::quarry_builder::QuarryBuilder;
use crate::quarry_config::QuarryConfig;

/// The entry point: a set of named, in-memory collections.
///
/// `Quarry` is cheap to clone; clones share the same collections.
///
/// # Examples
///
/// ```rust
/// use quarry::aggregation::Pipeline;
/// use quarry::doc;
/// use quarry::Quarry;
///
/// let db = Quarry::builder().open().unwrap();
/// let books = db.collection("books").unwrap();
/// books
///     .insert_many(vec![
///         doc! { title: "Dune", genre: "Sci-Fi" },
///         doc! { title: "Emma", genre: "Fiction" },
///         doc! { title: "Ubik", genre: "Sci-Fi" },
///     ])
///     .unwrap();
///
/// let pipeline = Pipeline::from_stages(&[
///     doc! { "$match": { genre: "Sci-Fi" } },
///     doc! { "$count": "total" },
/// ])
/// .unwrap();
/// assert_eq!(books.aggregate(&pipeline).unwrap(), vec![doc! { total: 2 }]);
/// assert_eq!(db.list_collection_names(), vec!["books".to_string()]);
/// ```
#[derive(Clone)]
pub struct Quarry {
    inner: Arc<QuarryInner>,
}

impl Quarry {
    pub fn builder() -> QuarryBuilder {
        QuarryBuilder::new()
    }

    pub(crate) fn new(quarry_config: QuarryConfig) -> Self {
        Quarry {
            inner: Arc::new(QuarryInner {
                collections: DashMap::new(),
                quarry_config,
            }),
        }
    }

    /// Gets a collection by name, creating it on first use.
    ///
    /// Names must be non-empty and may not contain spaces or `.`, nor start
    /// with `$`.
    pub fn collection(&self, name: &str) -> QuarryResult<QuarryCollection> {
        validate_collection_name(name)?;
        let collection = self
            .inner
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Creating collection {}", name);
                QuarryCollection::new(name, &self.inner.quarry_config)
            })
            .clone();
        Ok(collection)
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.contains_key(name)
    }

    /// Removes a collection and its indexes. Existing handles to it fail
    /// with `InvalidOperation` afterwards. Dropping an unknown collection is
    /// a no-op.
    pub fn drop_collection(&self, name: &str) -> QuarryResult<()> {
        if let Some((_, collection)) = self.inner.collections.remove(name) {
            collection.mark_dropped();
            log::debug!("Dropped collection {}", name);
        }
        Ok(())
    }

    /// Collection names in lexicographic order.
    pub fn list_collection_names(&self) -> Vec<String> {
        self.inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .sorted()
            .collect()
    }

    pub fn config(&self) -> QuarryConfig {
        self.inner.quarry_config.clone()
    }
}

struct QuarryInner {
    collections: DashMap<String, QuarryCollection>,
    quarry_config: QuarryConfig,
}

fn validate_collection_name(name: &str) -> QuarryResult<()> {
    let problem = if name.is_empty() {
        Some("cannot be empty")
    } else if name.contains(' ') {
        Some("cannot contain space")
    } else if name.contains(FIELD_SEPARATOR) {
        Some("cannot contain '.'")
    } else if name.starts_with(OPERATOR_PREFIX) {
        Some("cannot start with '$'")
    } else {
        None
    };

    match problem {
        Some(problem) => {
            log::error!("Collection name '{}' {}", name, problem);
            Err(QuarryError::new(
                &format!("Collection name '{}' {}", name, problem),
                ErrorKind::ValidationError,
            ))
        }
        None => Ok(()),
    }
}
