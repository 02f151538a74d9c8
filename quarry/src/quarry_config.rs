//! Configuration of a [Quarry](crate::Quarry) instance.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::common::{DEFAULT_PLAN_CACHE_LIMIT, MAX_PLAN_CACHE_LIMIT};
use crate::errors::{ErrorKind, QuarryError, QuarryResult};

/// Settings shared by every collection of a [Quarry](crate::Quarry).
///
/// A configuration is frozen once the instance is opened; later changes
/// fail with `InvalidOperation`.
///
/// ```rust
/// use quarry::Quarry;
///
/// let db = Quarry::builder().plan_cache_limit(10).open().unwrap();
/// assert_eq!(db.config().plan_cache_limit(), 10);
/// ```
#[derive(Clone)]
pub struct QuarryConfig {
    inner: Arc<QuarryConfigInner>,
}

impl Default for QuarryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl QuarryConfig {
    pub fn new() -> Self {
        QuarryConfig {
            inner: Arc::new(QuarryConfigInner::new()),
        }
    }

    /// Maximum number of cached query plans per collection. Zero disables
    /// plan caching.
    pub fn plan_cache_limit(&self) -> usize {
        self.inner.plan_cache_limit.load(Ordering::Relaxed)
    }

    pub fn set_plan_cache_limit(&self, limit: usize) -> QuarryResult<()> {
        self.inner.set_plan_cache_limit(limit)
    }

    pub(crate) fn initialize(&self) {
        self.inner.configured.store(true, Ordering::Relaxed);
    }
}

struct QuarryConfigInner {
    configured: AtomicBool,
    plan_cache_limit: AtomicUsize,
}

impl QuarryConfigInner {
    fn new() -> Self {
        QuarryConfigInner {
            configured: AtomicBool::from(false),
            plan_cache_limit: AtomicUsize::new(DEFAULT_PLAN_CACHE_LIMIT),
        }
    }

    fn set_plan_cache_limit(&self, limit: usize) -> QuarryResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("Plan cache limit cannot be changed after initialization");
            return Err(QuarryError::new(
                "Plan cache limit cannot be changed after initialization",
                ErrorKind::InvalidOperation,
            ));
        }

        if limit > MAX_PLAN_CACHE_LIMIT {
            log::error!("Plan cache limit {} exceeds {}", limit, MAX_PLAN_CACHE_LIMIT);
            return Err(QuarryError::new(
                &format!(
                    "Plan cache limit must be at most {}, found {}",
                    MAX_PLAN_CACHE_LIMIT, limit
                ),
                ErrorKind::ValidationError,
            ));
        }

        self.plan_cache_limit.store(limit, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(QuarryConfig::new().plan_cache_limit(), DEFAULT_PLAN_CACHE_LIMIT);
    }

    #[test]
    fn clones_share_settings() {
        let config = QuarryConfig::new();
        let clone = config.clone();
        config.set_plan_cache_limit(0).unwrap();
        assert_eq!(clone.plan_cache_limit(), 0);
    }

    #[test]
    fn rejects_oversized_limit() {
        let err = QuarryConfig::new()
            .set_plan_cache_limit(MAX_PLAN_CACHE_LIMIT + 1)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn frozen_after_initialization() {
        let config = QuarryConfig::new();
        config.initialize();
        let err = config.set_plan_cache_limit(5).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(config.plan_cache_limit(), DEFAULT_PLAN_CACHE_LIMIT);
    }
}
