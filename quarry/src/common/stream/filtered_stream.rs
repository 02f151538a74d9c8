use crate::{collection::Document, errors::QuarryResult, filter::Filter};

use super::DocumentStream;

pub(crate) struct FilteredStream {
    raw_stream: DocumentStream,
    filter: Filter,
}

impl FilteredStream {
    pub fn new(raw_stream: DocumentStream, filter: Filter) -> Self {
        FilteredStream { raw_stream, filter }
    }
}

impl Iterator for FilteredStream {
    type Item = QuarryResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.raw_stream.next()? {
                Ok(doc) if self.filter.apply(&doc) => return Some(Ok(doc)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
