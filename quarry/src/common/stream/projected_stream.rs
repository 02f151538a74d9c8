use crate::collection::{Document, Projection};
use crate::errors::QuarryResult;

use super::DocumentStream;

pub(crate) struct ProjectedStream {
    raw_stream: DocumentStream,
    projection: Projection,
}

impl ProjectedStream {
    pub fn new(raw_stream: DocumentStream, projection: Projection) -> Self {
        ProjectedStream {
            raw_stream,
            projection,
        }
    }
}

impl Iterator for ProjectedStream {
    type Item = QuarryResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.raw_stream
            .next()
            .map(|item| item.map(|doc| self.projection.apply(&doc)))
    }
}
