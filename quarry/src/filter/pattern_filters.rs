use regex::Regex;
use std::{any::Any, fmt::Display};

use crate::{collection::Document, errors::QuarryResult};

use super::{basic_filters::matches_value, FilterProvider};

/// Matches string values against a regular expression. Non-string values
/// never match.
pub(crate) struct RegexFilter {
    field_name: String,
    pattern: Regex,
}

impl RegexFilter {
    /// Compiles the pattern up front so an invalid expression is reported
    /// before any document is read.
    #[inline]
    pub(crate) fn new(field_name: String, pattern: &str) -> QuarryResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            log::error!("Invalid regex pattern '{}': {}", pattern, e);
            e
        })?;
        Ok(RegexFilter { field_name, pattern })
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} =~ {})", self.field_name, self.pattern.as_str())
    }
}

impl FilterProvider for RegexFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        matches_value(entry, &self.field_name, |value| {
            value.as_str().is_some_and(|text| self.pattern.is_match(text))
        })
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
