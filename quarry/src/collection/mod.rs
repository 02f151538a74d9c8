//! Collections, documents and the operations on them.
//!
//! A [QuarryCollection] holds schema-less [Document]s under implicit
//! [RecordId]s and answers queries over them.
//!
//! ```rust
//! use quarry::collection::FindOptions;
//! use quarry::common::SortOrder;
//! use quarry::doc;
//! use quarry::filter::field;
//! use quarry::Quarry;
//!
//! # fn main() -> quarry::errors::QuarryResult<()> {
//! let db = Quarry::builder().open()?;
//! let books = db.collection("books")?;
//!
//! books.insert(doc! { title: "Dune", year: 1965 })?;
//! books.insert(doc! { title: "Emma", year: 1815 })?;
//!
//! let options = FindOptions::new().sort_by("year", SortOrder::Ascending);
//! let titles: Vec<_> = books
//!     .find_with_options(field("year").gt(1800), &options)?
//!     .to_vec()?
//!     .into_iter()
//!     .map(|doc| doc.get("title").cloned())
//!     .collect();
//! assert_eq!(titles.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Record identity
//!
//! Every stored document carries an `_id` field holding its [RecordId], set
//! on insert and never changed afterwards. Callers cannot supply `_id` on
//! insert nor touch it through an update.

mod document;
mod explanation;
mod find_options;
mod find_plan;
pub(crate) mod operation;
mod projection;
mod quarry_collection;
mod record_id;
mod update;
mod update_options;

pub use document::*;
pub use explanation::QueryExplanation;
pub use find_options::*;
pub use find_plan::*;
pub use operation::WriteResult;
pub use projection::*;
pub use quarry_collection::QuarryCollection;
pub(crate) use record_id::RecordIdGenerator;
pub use record_id::RecordId;
pub use update::UpdateSpec;
pub use update_options::*;
