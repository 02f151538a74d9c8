use crate::errors::{QuarryError, QuarryResult};
use crate::quarry::Quarry;
use crate::quarry_config::QuarryConfig;

/// Fluent configuration of a [Quarry] instance.
///
/// A setting that fails is remembered and reported by [open](Self::open);
/// settings after the first failure are ignored.
///
/// ```rust
/// use quarry::Quarry;
///
/// let db = Quarry::builder().plan_cache_limit(0).open().unwrap();
/// assert_eq!(db.config().plan_cache_limit(), 0);
///
/// assert!(Quarry::builder().plan_cache_limit(usize::MAX).open().is_err());
/// ```
#[derive(Default)]
pub struct QuarryBuilder {
    error: Option<QuarryError>,
    quarry_config: QuarryConfig,
}

impl QuarryBuilder {
    pub fn new() -> Self {
        QuarryBuilder {
            error: None,
            quarry_config: QuarryConfig::new(),
        }
    }

    /// Sets the maximum number of cached query plans per collection.
    pub fn plan_cache_limit(mut self, limit: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.quarry_config.set_plan_cache_limit(limit) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn open(self) -> QuarryResult<Quarry> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.quarry_config.initialize();
        log::debug!(
            "Opened quarry with plan cache limit {}",
            self.quarry_config.plan_cache_limit()
        );
        Ok(Quarry::new(self.quarry_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DEFAULT_PLAN_CACHE_LIMIT, MAX_PLAN_CACHE_LIMIT};
    use crate::errors::ErrorKind;

    #[test]
    fn open_with_defaults() {
        let db = QuarryBuilder::new().open().unwrap();
        assert_eq!(db.config().plan_cache_limit(), DEFAULT_PLAN_CACHE_LIMIT);
    }

    #[test]
    fn captured_error_is_returned_by_open() {
        let result = QuarryBuilder::new()
            .plan_cache_limit(MAX_PLAN_CACHE_LIMIT + 1)
            .plan_cache_limit(5)
            .open();
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn last_valid_setting_wins() {
        let db = QuarryBuilder::new().plan_cache_limit(5).plan_cache_limit(7).open().unwrap();
        assert_eq!(db.config().plan_cache_limit(), 7);
    }

    #[test]
    fn opened_config_is_frozen() {
        let db = QuarryBuilder::new().open().unwrap();
        assert!(db.config().set_plan_cache_limit(1).is_err());
    }
}
