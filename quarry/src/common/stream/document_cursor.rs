use crate::collection::{Document, FindPlan};
use crate::errors::QuarryResult;

use super::{DocumentStream, ExecutionStats, StatsRecorder};

/// A lazily evaluated stream of query results.
///
/// Nothing is read until the cursor is iterated. The cursor reads from the
/// snapshot taken when the query started, so writes that happen while it
/// is being consumed are not visible through it.
///
/// An error item (for example an interrupted scan) ends the stream.
pub struct DocumentCursor {
    underlying: DocumentStream,
    find_plan: FindPlan,
    stats: StatsRecorder,
}

impl DocumentCursor {
    pub(crate) fn new(underlying: DocumentStream, find_plan: FindPlan, stats: StatsRecorder) -> Self {
        DocumentCursor {
            underlying,
            find_plan,
            stats,
        }
    }

    /// The plan this cursor executes.
    pub fn find_plan(&self) -> &FindPlan {
        &self.find_plan
    }

    /// Counters of the work done so far.
    pub fn execution_stats(&self) -> ExecutionStats {
        self.stats.snapshot()
    }

    /// Reads the remaining results, failing on the first error.
    pub fn to_vec(&mut self) -> QuarryResult<Vec<Document>> {
        self.by_ref().collect()
    }

    /// Reads the next result, if any.
    pub fn first(&mut self) -> QuarryResult<Option<Document>> {
        self.next().transpose()
    }

    /// Counts the remaining results.
    pub fn size(&mut self) -> QuarryResult<usize> {
        let mut count = 0;
        for item in self.by_ref() {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

impl Iterator for DocumentCursor {
    type Item = QuarryResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.underlying.next()?;
        if item.is_ok() {
            self.stats.doc_returned();
        }
        Some(item)
    }
}
