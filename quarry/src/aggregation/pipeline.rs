use std::fmt::{Display, Formatter};

use crate::collection::Document;
use crate::common::stream::DocumentStream;
use crate::common::Value;
use crate::errors::{invalid_spec, QuarryResult};
use crate::filter::Filter;

use super::Stage;

/// An ordered list of validated stages.
///
/// Each stage consumes the output of the one before it. Streaming stages
/// (`$match`, `$addFields`, `$project`, `$skip`, `$limit`, `$unwind`) pass
/// documents through one at a time; `$group`, `$sort` and `$count` read their
/// entire input first.
///
/// # Examples
///
/// ```rust
/// use quarry::aggregation::Pipeline;
/// use quarry::doc;
///
/// let pipeline = Pipeline::from_stages(&[
///     doc! { "$group": { _id: "$genre", count: { "$sum": 1 } } },
///     doc! { "$sort": { count: -1 } },
/// ])
/// .unwrap();
///
/// let out = pipeline
///     .execute(vec![
///         doc! { genre: "Fiction" },
///         doc! { genre: "Sci-Fi" },
///         doc! { genre: "Sci-Fi" },
///     ])
///     .unwrap();
/// assert_eq!(out[0], doc! { _id: "Sci-Fi", count: 2 });
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> QuarryResult<Pipeline> {
        for stage in &stages {
            stage.validate()?;
        }
        Ok(Pipeline { stages })
    }

    /// Parses one stage per document, failing on the first invalid one.
    pub fn from_stages(specs: &[Document]) -> QuarryResult<Pipeline> {
        let stages = specs
            .iter()
            .map(Stage::from_spec)
            .collect::<QuarryResult<Vec<Stage>>>()?;
        Ok(Pipeline { stages })
    }

    /// Parses an array value of stage documents.
    pub fn from_value(spec: &Value) -> QuarryResult<Pipeline> {
        let items = spec
            .as_array()
            .ok_or_else(|| invalid_spec(&format!("A pipeline must be an array, found {}", spec)))?;

        let mut stages = Vec::with_capacity(items.len());
        for item in items {
            let stage_spec = item.as_document().ok_or_else(|| {
                invalid_spec(&format!("A pipeline stage must be a document, found {}", item))
            })?;
            stages.push(Stage::from_spec(stage_spec)?);
        }
        Ok(Pipeline { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs the pipeline over an in-memory sequence. Input order is
    /// preserved until a stage reorders it.
    pub fn execute<I>(&self, input: I) -> QuarryResult<Vec<Document>>
    where
        I: IntoIterator<Item = Document>,
        I::IntoIter: 'static,
    {
        let stream: DocumentStream = Box::new(input.into_iter().map(Ok));
        self.run(stream, 0).collect()
    }

    /// Chains the stages after the first `skip_stages` onto `input`.
    pub(crate) fn run(&self, input: DocumentStream, skip_stages: usize) -> DocumentStream {
        self.stages
            .iter()
            .skip(skip_stages)
            .fold(input, |stream, stage| stage.apply(stream))
    }

    /// The filter of a leading `$match`, which a collection can answer with
    /// its query planner instead of a scan.
    pub(crate) fn leading_match(&self) -> Option<&Filter> {
        match self.stages.first() {
            Some(Stage::Match(filter)) => Some(filter),
            _ => None,
        }
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
