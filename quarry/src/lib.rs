//! # Quarry - embedded document query engine
//!
//! Quarry stores schema-less documents in named, in-memory collections and
//! answers the statements a document-database shell accepts: filters,
//! projections, sort/skip/limit pagination, `$set`-style updates, deletes,
//! index creation, `explain` and aggregation pipelines.
//!
//! ## Quick Start
//!
//! ```rust
//! use quarry::collection::FindOptions;
//! use quarry::doc;
//! use quarry::filter::Filter;
//! use quarry::Quarry;
//!
//! # fn main() -> quarry::errors::QuarryResult<()> {
//! let db = Quarry::builder().open()?;
//! let books = db.collection("books")?;
//!
//! books.insert_many(vec![
//!     doc! { title: "Dune", author: "Herbert", price: 20 },
//!     doc! { title: "Emma", author: "Austen", price: 8 },
//! ])?;
//! books.create_index_from_spec(&doc! { author: 1 })?;
//!
//! let filter = Filter::from_spec(&doc! { price: { "$gt": 10 } })?;
//! let options = FindOptions::new().project(&doc! { _id: 0, title: 1 })?;
//! let found = books.find_with_options(filter, &options)?.to_vec()?;
//! assert_eq!(found, vec![doc! { title: "Dune" }]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`aggregation`] - Pipelines, stages, expressions and accumulators
//! - [`collection`] - Documents, collections and find/update options
//! - [`common`] - Values, sort orders, result cursors
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Document predicates
//! - [`index`] - Ordered secondary indexes
//! - [`store`] - Persistent record storage
//! - [`quarry`] - The collection registry
//! - [`quarry_builder`] / [`quarry_config`] - Configuration

pub mod aggregation;
pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod index;
pub mod quarry;
pub mod quarry_builder;
pub mod quarry_config;
pub mod store;

pub use crate::quarry::Quarry;
pub use quarry_builder::QuarryBuilder;
pub use quarry_config::QuarryConfig;
