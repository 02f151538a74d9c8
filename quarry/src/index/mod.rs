//! Ordered secondary indexes.

mod descriptor;
mod index_key;
mod index_scan;
mod ordered_index;

pub use descriptor::*;
pub use index_key::{IndexKey, KeyPart};
pub(crate) use index_key::index_keys;
pub use index_scan::*;
pub use ordered_index::*;
