use std::{any::Any, cmp::Ordering, fmt::Display};

use crate::{collection::Document, common::Value};

use super::{basic_filters::matches_value, FilterProvider};

/// The relation tested by a range comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    /// Whether `value` stands in this relation to `bound`.
    ///
    /// Values of different type families never match.
    #[inline]
    pub fn test(&self, value: &Value, bound: &Value) -> bool {
        match value.compare_same_kind(bound) {
            Some(ordering) => self.accepts(ordering),
            None => false,
        }
    }

    #[inline]
    pub(crate) fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }

    /// Whether matching values lie above the bound.
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, ComparisonMode::Greater | ComparisonMode::GreaterEqual)
    }

    pub fn operator(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => "$gt",
            ComparisonMode::GreaterEqual => "$gte",
            ComparisonMode::Lesser => "$lt",
            ComparisonMode::LesserEqual => "$lte",
        }
    }
}

impl Display for ComparisonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonMode::Greater => write!(f, ">"),
            ComparisonMode::GreaterEqual => write!(f, ">="),
            ComparisonMode::Lesser => write!(f, "<"),
            ComparisonMode::LesserEqual => write!(f, "<="),
        }
    }
}

pub(crate) struct ComparisonFilter {
    field_name: String,
    field_value: Value,
    comparison_mode: ComparisonMode,
}

impl ComparisonFilter {
    pub(crate) fn new(field_name: String, field_value: Value, comparison_mode: ComparisonMode) -> Self {
        ComparisonFilter {
            field_name,
            field_value,
            comparison_mode,
        }
    }
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.field_name, self.comparison_mode, self.field_value)
    }
}

impl FilterProvider for ComparisonFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        matches_value(entry, &self.field_name, |value| {
            self.comparison_mode.test(value, &self.field_value)
        })
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn range_term(&self) -> Option<(&str, ComparisonMode, &Value)> {
        Some((&self.field_name, self.comparison_mode, &self.field_value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
