use std::{any::Any, fmt::Display};

use crate::collection::Document;

use super::{Filter, FilterProvider};

fn write_joined(f: &mut std::fmt::Formatter<'_>, filters: &[Filter], separator: &str) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", separator)?;
        }
        write!(f, "{}", filter)?;
    }
    write!(f, ")")
}

/// Matches when every child matches. An empty conjunction matches.
pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_joined(f, &self.filters, "&&")
    }
}

impl FilterProvider for AndFilter {
    fn apply(&self, entry: &Document) -> bool {
        self.filters.iter().all(|filter| filter.apply(entry))
    }

    fn logical_filters(&self) -> Option<&[Filter]> {
        Some(&self.filters)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches when at least one child matches.
pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_joined(f, &self.filters, "||")
    }
}

impl FilterProvider for OrFilter {
    fn apply(&self, entry: &Document) -> bool {
        self.filters.iter().any(|filter| filter.apply(entry))
    }

    fn logical_filters(&self) -> Option<&[Filter]> {
        Some(&self.filters)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches when no child matches.
pub(crate) struct NorFilter {
    filters: Vec<Filter>,
}

impl NorFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        NorFilter { filters }
    }
}

impl Display for NorFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!")?;
        write_joined(f, &self.filters, "||")
    }
}

impl FilterProvider for NorFilter {
    fn apply(&self, entry: &Document) -> bool {
        !self.filters.iter().any(|filter| filter.apply(entry))
    }

    fn logical_filters(&self) -> Option<&[Filter]> {
        Some(&self.filters)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotFilter {
    filter: Filter,
}

impl NotFilter {
    pub(crate) fn new(filter: Filter) -> Self {
        NotFilter { filter }
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!{}", self.filter)
    }
}

impl FilterProvider for NotFilter {
    fn apply(&self, entry: &Document) -> bool {
        !self.filter.apply(entry)
    }

    fn field_name(&self) -> Option<&str> {
        self.filter.field_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
