use crate::collection::RecordId;
use crate::common::{write_escaped, Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, QuarryError, QuarryResult};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};

/// A schema-less record: an insertion-ordered mapping from field name to
/// [Value].
///
/// Field order is significant. It is preserved on every read, it decides
/// the field order of projected output, and it takes part in equality and
/// ordering of documents (`{a: 1, b: 2}` and `{b: 2, a: 1}` are different
/// documents).
///
/// Nested values are reached with `.` separated paths. A numeric path
/// segment indexes into an array, so `"tags.0"` is the first tag.
///
/// The `_id` field holds the record identity and is assigned by the
/// collection on insert.
///
/// # Examples
///
/// ```rust
/// use quarry::doc;
/// use quarry::common::Value;
///
/// let book = doc! {
///     title: "Dune",
///     author: { name: "Frank Herbert" },
///     tags: ["sf", "classic"],
/// };
///
/// assert_eq!(book.get("author.name"), Some(&Value::from("Frank Herbert")));
/// assert_eq!(book.get("tags.1"), Some(&Value::from("classic")));
/// assert_eq!(book.get("price"), None);
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top level fields.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Sets a top level field, keeping its position if it already exists.
    ///
    /// The key is taken literally; separators in it are not interpreted.
    /// Specification documents rely on this for keys such as
    /// `"author.name"` or `"$gt"`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Associates a value with a field path, creating intermediate
    /// documents as needed.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidOperation] if the path or one of its
    /// segments is empty, or if an intermediate value exists but is not a
    /// document.
    pub fn put(&mut self, path: &str, value: impl Into<Value>) -> QuarryResult<()> {
        if path.is_empty() || path.split(FIELD_SEPARATOR).any(|segment| segment.is_empty()) {
            log::error!("Invalid field path '{}'", path);
            return Err(QuarryError::new(
                &format!("Invalid field path '{}'", path),
                ErrorKind::InvalidOperation,
            ));
        }

        match path.split_once(FIELD_SEPARATOR) {
            None => {
                self.data.insert(path.to_string(), value.into());
                Ok(())
            }
            Some((head, rest)) => {
                let entry = self
                    .data
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Document(Document::new()));
                match entry {
                    Value::Document(nested) => nested.put(rest, value),
                    Value::Null => {
                        let mut nested = Document::new();
                        nested.put(rest, value)?;
                        *entry = Value::Document(nested);
                        Ok(())
                    }
                    other => {
                        log::error!(
                            "Cannot set '{}': '{}' holds a {} value",
                            path,
                            head,
                            other.type_name()
                        );
                        Err(QuarryError::new(
                            &format!("Cannot set '{}': '{}' is not a document", path, head),
                            ErrorKind::InvalidOperation,
                        ))
                    }
                }
            }
        }
    }

    /// Resolves a field path.
    ///
    /// A literal top level key wins over path interpretation. Returns
    /// `None` when any segment is missing, which is distinct from a field
    /// that is present and holds [Value::Null].
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(path) {
            return Some(value);
        }

        let (head, rest) = path.split_once(FIELD_SEPARATOR)?;
        let mut current = self.data.get(head)?;
        for segment in rest.split(FIELD_SEPARATOR) {
            current = match current {
                Value::Document(doc) => doc.data.get(segment)?,
                Value::Array(array) => {
                    let index = segment.parse::<usize>().ok()?;
                    array.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Resolves a field path, reading a missing field as [Value::Null].
    pub fn get_or_null(&self, path: &str) -> Value {
        self.get(path).cloned().unwrap_or(Value::Null)
    }

    /// Removes the value at a field path and returns it.
    ///
    /// Field order of the remaining fields is preserved.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        if self.data.contains_key(path) {
            return self.data.shift_remove(path);
        }

        let (head, rest) = path.split_once(FIELD_SEPARATOR)?;
        match self.data.get_mut(head)? {
            Value::Document(nested) => nested.remove(rest),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn contains_field(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Returns the record identity, if one has been assigned.
    pub fn id(&self) -> Option<RecordId> {
        match self.data.get(DOC_ID) {
            Some(Value::Id(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Returns a copy of this document with `_id` set to `id` as its first
    /// field.
    pub(crate) fn with_id(&self, id: RecordId) -> Document {
        let mut data = IndexMap::with_capacity(self.data.len() + 1);
        data.insert(DOC_ID.to_string(), Value::Id(id));
        for (key, value) in self.data.iter() {
            if key != DOC_ID {
                data.insert(key.clone(), value.clone());
            }
        }
        Document { data }
    }

    /// Merges `other` into this document. Nested documents are merged
    /// recursively; any other value replaces the existing one.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(existing)), Value::Document(incoming)) => {
                    existing.merge(incoming);
                }
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Top level field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// All leaf field paths in order, descending into nested documents.
    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        self.collect_fields("", &mut fields);
        fields
    }

    fn collect_fields(&self, prefix: &str, fields: &mut Vec<String>) {
        for (key, value) in self.data.iter() {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };
            match value {
                Value::Document(nested) if !nested.is_empty() => {
                    nested.collect_fields(&path, fields)
                }
                _ => fields.push(path),
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a == b)
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.iter().cmp(other.data.iter())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_escaped(f, key)?;
            write!(f, ": {}", value)?;
        }
        write!(f, "}}")
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Document {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys may be bare identifiers or string literals (needed for `$`
/// operators and dotted paths). Keys are stored literally. Values may be
/// literals, nested `{ .. }` documents, `[ .. ]` arrays, negative numeric
/// literals, `null`, or any parenthesized expression convertible into a
/// [Value].
///
/// # Examples
///
/// ```rust
/// use quarry::doc;
///
/// let empty = doc! {};
/// assert!(empty.is_empty());
///
/// let filter = doc! { price: { "$gt": 10 } };
/// let sort = doc! { price: -1, title: 1 };
/// let year = 1965;
/// let book = doc! { title: "Dune", published_year: (year), tags: ["sf"], isbn: null };
/// assert_eq!(book.size(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($tokens:tt)+) => {
        {
            #[allow(unused_mut)]
            let mut doc = $crate::collection::Document::new();
            $crate::doc_entries!(doc; $($tokens)+);
            doc
        }
    };
}

/// Munches `key: value` pairs for [doc!].
#[doc(hidden)]
#[macro_export]
macro_rules! doc_entries {
    ($doc:ident;) => {};

    // negative numeric literal
    ($doc:ident; $key:tt : - $value:literal $(, $($rest:tt)*)?) => {
        $doc.insert($crate::collection::normalize(stringify!($key)), $crate::common::Value::from(-$value));
        $( $crate::doc_entries!($doc; $($rest)*); )?
    };

    ($doc:ident; $key:tt : $value:tt $(, $($rest:tt)*)?) => {
        $doc.insert($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value));
        $( $crate::doc_entries!($doc; $($rest)*); )?
    };
}

/// Converts a single token tree into a [Value] for [doc!].
#[doc(hidden)]
#[macro_export]
macro_rules! doc_value {
    (null) => {
        $crate::common::Value::Null
    };

    // nested document
    ({ $($tokens:tt)* }) => {
        $crate::common::Value::Document($crate::doc!{ $($tokens)* })
    };

    // array of values
    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
