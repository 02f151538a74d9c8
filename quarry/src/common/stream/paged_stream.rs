use crate::collection::Document;
use crate::errors::QuarryResult;

use super::DocumentStream;

/// Applies skip and limit to a stream.
///
/// Errors are never skipped or counted against the limit. Once the limit is
/// reached the input is not read any further.
pub(crate) struct PagedStream {
    raw_stream: DocumentStream,
    skip: u64,
    remaining: Option<u64>,
}

impl PagedStream {
    pub fn new(raw_stream: DocumentStream, skip: Option<u64>, limit: Option<u64>) -> Self {
        PagedStream {
            raw_stream,
            skip: skip.unwrap_or(0),
            remaining: limit,
        }
    }
}

impl Iterator for PagedStream {
    type Item = QuarryResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }

        loop {
            match self.raw_stream.next()? {
                Err(e) => return Some(Err(e)),
                Ok(_) if self.skip > 0 => self.skip -= 1,
                Ok(doc) => {
                    if let Some(remaining) = self.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    return Some(Ok(doc));
                }
            }
        }
    }
}
