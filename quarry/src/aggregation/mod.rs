//! Aggregation pipelines.
//!
//! A [Pipeline] is a sequence of [Stage]s parsed from specification documents
//! such as `{$group: {_id: "$genre", count: {$sum: 1}}}`. It runs over any
//! sequence of documents with [Pipeline::execute], or over a collection with
//! [QuarryCollection::aggregate](crate::collection::QuarryCollection::aggregate).

mod accumulator;
mod expression;
mod pipeline;
mod stage;

pub use accumulator::{Accumulator, AccumulatorKind};
pub use expression::Expression;
pub use pipeline::Pipeline;
pub use stage::{GroupStage, Stage, UnwindStage};
