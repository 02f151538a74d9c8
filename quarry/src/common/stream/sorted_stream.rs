use crate::{
    collection::Document,
    common::{SortOrder, Value, DOC_ID},
    errors::{QuarryError, QuarryResult},
};
use icu_collator::CollatorBorrowed;
use std::cmp::Ordering;

use super::DocumentStream;

static NULL: Value = Value::Null;

/// Compares two documents by the given sort keys.
///
/// A missing field compares as `null`, the lowest value. Two strings are
/// compared with the collator when one is supplied.
pub(crate) fn compare_documents(
    a: &Document,
    b: &Document,
    sort_order: &[(String, SortOrder)],
    collator: Option<&CollatorBorrowed<'static>>,
) -> Ordering {
    for (field, order) in sort_order {
        let a_value = a.get(field).unwrap_or(&NULL);
        let b_value = b.get(field).unwrap_or(&NULL);

        let cmp = match (a_value, b_value, collator) {
            (Value::String(a), Value::String(b), Some(collator)) => collator.compare(a, b),
            _ => a_value.cmp(b_value),
        };

        if cmp != Ordering::Equal {
            return match order {
                SortOrder::Ascending => cmp,
                SortOrder::Descending => cmp.reverse(),
            };
        }
    }
    Ordering::Equal
}

/// Orders two stored documents by identity. Anything else, such as the
/// group keys a `$group` stage writes to `_id`, keeps its input order.
fn compare_record_ids(a: &Document, b: &Document) -> Ordering {
    match (a.get(DOC_ID), b.get(DOC_ID)) {
        (Some(Value::Id(a)), Some(Value::Id(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Materializes its input on first read and replays it sorted.
///
/// Ties after every sort key are broken by record identity, which is
/// insertion order, so the output does not depend on the access path that
/// produced the input. Documents without a record identity keep their
/// input order. The first input error is reported instead of any output.
pub(crate) struct SortedStream {
    raw_stream: Option<DocumentStream>,
    sort_order: Vec<(String, SortOrder)>,
    collator: Option<CollatorBorrowed<'static>>,
    sorted: std::vec::IntoIter<Document>,
    error: Option<QuarryError>,
}

impl SortedStream {
    pub fn new(
        raw_stream: DocumentStream,
        sort_order: Vec<(String, SortOrder)>,
        collator: Option<CollatorBorrowed<'static>>,
    ) -> Self {
        SortedStream {
            raw_stream: Some(raw_stream),
            sort_order,
            collator,
            sorted: Vec::new().into_iter(),
            error: None,
        }
    }

    fn materialize(&mut self, raw_stream: DocumentStream) {
        let mut documents = Vec::new();
        for item in raw_stream {
            match item {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    self.error = Some(e);
                    return;
                }
            }
        }

        let sort_order = &self.sort_order;
        let collator = self.collator.as_ref();
        documents.sort_by(|a, b| {
            compare_documents(a, b, sort_order, collator).then_with(|| compare_record_ids(a, b))
        });
        self.sorted = documents.into_iter();
    }
}

impl Iterator for SortedStream {
    type Item = QuarryResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(raw_stream) = self.raw_stream.take() {
            self.materialize(raw_stream);
        }

        // fail fast if the input failed
        if let Some(error) = self.error.take() {
            return Some(Err(error));
        }
        self.sorted.next().map(Ok)
    }
}
