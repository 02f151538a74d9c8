pub(crate) mod collection_state;
pub(crate) mod find_optimizer;
mod index_operations;
mod read_operations;
mod write_operations;
mod write_result;

pub(crate) use collection_state::SharedState;
pub(crate) use find_optimizer::FindOptimizer;
pub(crate) use index_operations::IndexOperations;
pub(crate) use read_operations::ReadOperations;
pub(crate) use write_operations::WriteOperations;
pub use write_result::*;
