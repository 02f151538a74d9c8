//! Document predicates.
//!
//! A [Filter] tests one document at a time. Filters come from two sources
//! that produce identical trees: [Filter::from_spec] parses the
//! specification documents a shell would accept, and the fluent helpers
//! ([field], [and], [or], [nor], [not], [all]) build them in code.

mod filter;
mod fluent;
mod spec;

mod basic_filters;
mod logical_filters;
mod pattern_filters;
mod range_filters;

pub(crate) use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub(crate) use logical_filters::*;
pub(crate) use pattern_filters::*;
pub use range_filters::ComparisonMode;
pub(crate) use range_filters::ComparisonFilter;
