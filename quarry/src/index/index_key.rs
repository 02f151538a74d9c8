use itertools::Itertools;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt::Display;

use crate::collection::Document;
use crate::common::{SortOrder, Value};

use super::IndexDescriptor;

/// One component of an [IndexKey], ordered in its field's direction.
#[derive(Clone, Debug)]
pub struct KeyPart {
    value: Value,
    order: SortOrder,
}

impl KeyPart {
    pub fn new(value: Value, order: SortOrder) -> Self {
        KeyPart { value, order }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        let ordering = self.value.cmp(&other.value);
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// The tuple of field values a document is filed under in an index.
///
/// Keys compare part by part, so a key made of the first `n` parts of
/// another key sorts immediately before every key sharing that prefix.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct IndexKey {
    parts: SmallVec<[KeyPart; 2]>,
}

impl IndexKey {
    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn starts_with(&self, prefix: &IndexKey) -> bool {
        self.parts.len() >= prefix.parts.len()
            && self.parts.iter().zip(prefix.parts.iter()).all(|(a, b)| a == b)
    }

    pub(crate) fn extended(&self, part: KeyPart) -> IndexKey {
        let mut parts = self.parts.clone();
        parts.push(part);
        IndexKey { parts }
    }
}

impl FromIterator<KeyPart> for IndexKey {
    fn from_iter<T: IntoIterator<Item = KeyPart>>(iter: T) -> Self {
        IndexKey {
            parts: iter.into_iter().collect(),
        }
    }
}

impl Display for IndexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part.value)?;
        }
        write!(f, "]")
    }
}

/// Values a single field contributes to the index.
///
/// A missing field is filed under `null`. An array is filed under each of
/// its elements and under the whole array, matching how filters treat
/// arrays.
fn field_key_values(document: &Document, field_name: &str) -> Vec<Value> {
    match document.get(field_name) {
        None => vec![Value::Null],
        Some(Value::Array(items)) => {
            let mut values: Vec<Value> = items.clone();
            values.push(Value::Array(items.clone()));
            values
        }
        Some(value) => vec![value.clone()],
    }
}

/// Computes every key under which `document` is filed, sorted and without
/// duplicates. Compound indexes take the cartesian product of the per-field
/// values.
pub(crate) fn index_keys(descriptor: &IndexDescriptor, document: &Document) -> Vec<IndexKey> {
    let mut keys: Vec<IndexKey> = descriptor
        .fields()
        .iter()
        .map(|(name, order)| {
            field_key_values(document, name)
                .into_iter()
                .map(|value| KeyPart::new(value, *order))
                .collect::<Vec<_>>()
        })
        .multi_cartesian_product()
        .map(|parts| parts.into_iter().collect::<IndexKey>())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}
