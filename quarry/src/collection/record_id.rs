use crate::errors::{ErrorKind, QuarryError, QuarryResult};
use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicU64, Ordering};

/// The implicit identity of a stored record.
///
/// A `RecordId` is assigned when a document is inserted into a collection and
/// stored under the `_id` field. Identities are drawn from a per-collection
/// monotonic counter, so comparing two identities of the same collection
/// compares their insertion order.
///
/// # Examples
///
/// ```rust
/// use quarry::collection::RecordId;
///
/// let first = RecordId::from_raw(1).unwrap();
/// let second = RecordId::from_raw(2).unwrap();
/// assert!(first < second);
/// assert_eq!(first.to_string(), "1");
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordId {
    id_value: u64,
}

impl RecordId {
    /// Rebuilds an identity from its raw value. Zero is reserved.
    pub fn from_raw(id_value: u64) -> QuarryResult<RecordId> {
        if id_value == 0 {
            log::error!("Record id 0 is reserved");
            return Err(QuarryError::new(
                "Record id must be greater than zero",
                ErrorKind::InvalidId,
            ));
        }
        Ok(RecordId { id_value })
    }

    pub fn id_value(&self) -> u64 {
        self.id_value
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id_value)
    }
}

impl Debug for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecordId({})", self.id_value)
    }
}

/// Hands out increasing [RecordId]s for one collection.
pub(crate) struct RecordIdGenerator {
    next: AtomicU64,
}

impl RecordIdGenerator {
    pub(crate) fn new() -> Self {
        RecordIdGenerator {
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_id(&self) -> RecordId {
        RecordId {
            id_value: self.next.fetch_add(1, Ordering::Relaxed),
        }
    }
}
