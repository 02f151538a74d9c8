use crate::collection::RecordId;

/// The identities of the records a write touched, in identity order.
///
/// A write that matched nothing produces an empty result rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResult {
    record_ids: Vec<RecordId>,
}

impl WriteResult {
    pub fn new(record_ids: Vec<RecordId>) -> Self {
        Self { record_ids }
    }

    pub fn affected_record_ids(&self) -> &[RecordId] {
        &self.record_ids
    }

    pub fn affected_count(&self) -> usize {
        self.record_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_ids.is_empty()
    }
}

impl IntoIterator for WriteResult {
    type Item = RecordId;
    type IntoIter = std::vec::IntoIter<RecordId>;

    fn into_iter(self) -> Self::IntoIter {
        self.record_ids.into_iter()
    }
}
