mod constants;
mod fields;
mod interrupt;
mod sort_order;
pub mod stream;
mod value;

pub use constants::*;
pub use fields::*;
pub use interrupt::*;
pub use sort_order::*;
pub use stream::{DocumentCursor, ExecutionStats};
pub(crate) use value::write_escaped;
pub use value::Value;
