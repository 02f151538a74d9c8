use std::{any::Any, fmt::Display};

use crate::{collection::Document, common::Value};

use super::FilterProvider;

/// Evaluates `predicate` against the value at `field`.
///
/// A missing field is evaluated as `null`. An array is matched as a whole
/// and element by element, so a scalar operand matches when any element
/// matches it.
#[inline]
pub(crate) fn matches_value(entry: &Document, field: &str, predicate: impl Fn(&Value) -> bool) -> bool {
    match entry.get(field) {
        None => predicate(&Value::Null),
        Some(array @ Value::Array(items)) => predicate(array) || items.iter().any(&predicate),
        Some(value) => predicate(value),
    }
}

fn write_values(f: &mut std::fmt::Formatter<'_>, values: &[Value]) -> std::fmt::Result {
    write!(f, "[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", value)?;
    }
    write!(f, "]")
}

pub(crate) struct AllFilter;

impl FilterProvider for AllFilter {
    fn apply(&self, _entry: &Document) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

pub(crate) struct EqualsFilter {
    field_name: String,
    field_value: Value,
}

impl EqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        matches_value(entry, &self.field_name, |value| *value == self.field_value)
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn equality_term(&self) -> Option<(&str, &Value)> {
        Some((&self.field_name, &self.field_value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotEqualsFilter {
    field_name: String,
    field_value: Value,
}

impl NotEqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        NotEqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for NotEqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        !matches_value(entry, &self.field_name, |value| *value == self.field_value)
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct ExistsFilter {
    field_name: String,
    exists: bool,
}

impl ExistsFilter {
    pub(crate) fn new(field_name: String, exists: bool) -> Self {
        ExistsFilter { field_name, exists }
    }
}

impl Display for ExistsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} exists {})", self.field_name, self.exists)
    }
}

impl FilterProvider for ExistsFilter {
    fn apply(&self, entry: &Document) -> bool {
        entry.contains_field(&self.field_name) == self.exists
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct InFilter {
    field_name: String,
    field_values: Vec<Value>,
}

impl InFilter {
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        InFilter {
            field_name,
            field_values,
        }
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} in ", self.field_name)?;
        write_values(f, &self.field_values)?;
        write!(f, ")")
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, entry: &Document) -> bool {
        matches_value(entry, &self.field_name, |value| {
            self.field_values.iter().any(|candidate| candidate == value)
        })
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotInFilter {
    field_name: String,
    field_values: Vec<Value>,
}

impl NotInFilter {
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        NotInFilter {
            field_name,
            field_values,
        }
    }
}

impl Display for NotInFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} not in ", self.field_name)?;
        write_values(f, &self.field_values)?;
        write!(f, ")")
    }
}

impl FilterProvider for NotInFilter {
    fn apply(&self, entry: &Document) -> bool {
        !matches_value(entry, &self.field_name, |value| {
            self.field_values.iter().any(|candidate| candidate == value)
        })
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
