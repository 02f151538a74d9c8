use crate::common::Value;
use crate::errors::QuarryResult;

use super::{
    ComparisonFilter, ComparisonMode, EqualsFilter, ExistsFilter, Filter, InFilter,
    NotEqualsFilter, NotInFilter, RegexFilter,
};

/// Starts a fluent filter on a field path.
///
/// ```rust
/// use quarry::filter::field;
///
/// let filter = field("published_year").gte(1950).and(field("genre").eq("sf"));
/// assert_eq!(filter.to_string(), "((published_year >= 1950) && (genre == \"sf\"))");
/// ```
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(EqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(NotEqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Greater)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::GreaterEqual)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Lesser)
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::LesserEqual)
    }

    pub fn compare(self, value: Value, mode: ComparisonMode) -> Filter {
        Filter::new(ComparisonFilter::new(self.field_name, value, mode))
    }

    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        Filter::new(InFilter::new(self.field_name, values))
    }

    pub fn not_in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        Filter::new(NotInFilter::new(self.field_name, values))
    }

    pub fn exists(self, exists: bool) -> Filter {
        Filter::new(ExistsFilter::new(self.field_name, exists))
    }

    /// Fails with [crate::errors::ErrorKind::InvalidSpecification] when the
    /// pattern does not compile.
    pub fn regex(self, pattern: &str) -> QuarryResult<Filter> {
        Ok(Filter::new(RegexFilter::new(self.field_name, pattern)?))
    }
}
