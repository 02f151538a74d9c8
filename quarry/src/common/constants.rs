pub const QUARRY_VERSION: &str = env!("CARGO_PKG_VERSION");

// doc constants
pub const DOC_ID: &str = "_id";
pub const FIELD_SEPARATOR: char = '.';
pub const OPERATOR_PREFIX: char = '$';

// config constants
pub const DEFAULT_PLAN_CACHE_LIMIT: usize = 100;
pub const MAX_PLAN_CACHE_LIMIT: usize = 1 << 20;

// explain constants
pub const COLLECTION_SCAN: &str = "COLLSCAN";
pub const INDEX_SCAN: &str = "IXSCAN";
