mod document_cursor;
mod execution_stats;
pub(crate) mod filtered_stream;
pub(crate) mod indexed_stream;
pub(crate) mod paged_stream;
pub(crate) mod projected_stream;
pub(crate) mod scan_stream;
pub(crate) mod sorted_stream;

pub use document_cursor::*;
pub use execution_stats::ExecutionStats;
pub(crate) use execution_stats::StatsRecorder;
pub(crate) use filtered_stream::FilteredStream;
pub(crate) use indexed_stream::IndexedStream;
pub(crate) use paged_stream::PagedStream;
pub(crate) use projected_stream::ProjectedStream;
pub(crate) use scan_stream::{check_interrupt, ScanStream};
pub(crate) use sorted_stream::{compare_documents, SortedStream};

use crate::collection::Document;
use crate::errors::QuarryResult;

pub(crate) type DocumentStream = Box<dyn Iterator<Item = QuarryResult<Document>>>;
