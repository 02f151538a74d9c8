//! In-memory record storage.

mod record_store;

pub use record_store::*;
