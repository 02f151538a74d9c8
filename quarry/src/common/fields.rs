use crate::collection::Document;
use crate::common::SortOrder;
use crate::errors::{invalid_spec, QuarryResult};
use std::fmt::Display;

/// Ordered `(field, direction)` pairs of a sort specification.
///
/// Earlier pairs take precedence; later pairs only break ties.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SortableFields {
    sorting_order: Vec<(String, SortOrder)>,
}

impl SortableFields {
    pub fn new() -> SortableFields {
        SortableFields {
            sorting_order: Vec::new(),
        }
    }

    /// Parses a sort specification such as `{price: -1, title: 1}`.
    pub fn from_spec(spec: &Document) -> QuarryResult<SortableFields> {
        if spec.is_empty() {
            return Err(invalid_spec("Sort specification cannot be empty"));
        }

        let mut fields = SortableFields::new();
        for (field_name, direction) in spec.iter() {
            if field_name.is_empty() {
                return Err(invalid_spec("Sort field name cannot be empty"));
            }
            let sort_order = SortOrder::from_direction(field_name, direction)?;
            fields = fields.add_sorted_field(field_name.clone(), sort_order);
        }
        Ok(fields)
    }

    #[inline]
    pub fn add_field(self, field_name: String) -> SortableFields {
        self.add_sorted_field(field_name, SortOrder::Ascending)
    }

    /// Appends a sort key. A field that is already present keeps its first
    /// position and direction.
    #[inline]
    pub fn add_sorted_field(mut self, field_name: String, sort_order: SortOrder) -> SortableFields {
        if !self.sorting_order.iter().any(|(name, _)| *name == field_name) {
            self.sorting_order.push((field_name, sort_order));
        }
        self
    }

    pub fn field_names(&self) -> Vec<String> {
        self.sorting_order.iter().map(|(name, _)| name.clone()).collect()
    }

    #[inline]
    pub fn sorting_order(&self) -> &[(String, SortOrder)] {
        &self.sorting_order
    }

    pub fn is_empty(&self) -> bool {
        self.sorting_order.is_empty()
    }
}

impl Display for SortableFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, order)) in self.sorting_order.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, order)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::ErrorKind;

    #[test]
    fn from_spec_keeps_declared_order() {
        let fields = SortableFields::from_spec(&doc! { price: -1, title: 1 }).unwrap();
        assert_eq!(
            fields.sorting_order(),
            &[
                ("price".to_string(), SortOrder::Descending),
                ("title".to_string(), SortOrder::Ascending)
            ]
        );
        assert_eq!(fields.to_string(), "{price: -1, title: 1}");
    }

    #[test]
    fn from_spec_rejects_bad_specs() {
        assert_eq!(
            SortableFields::from_spec(&doc! {}).unwrap_err().kind(),
            &ErrorKind::InvalidSpecification
        );
        assert!(SortableFields::from_spec(&doc! { price: 0 }).is_err());
        assert!(SortableFields::from_spec(&doc! { price: "desc" }).is_err());
    }

    #[test]
    fn duplicate_field_keeps_first_direction() {
        let fields = SortableFields::new()
            .add_field("a".to_string())
            .add_sorted_field("a".to_string(), SortOrder::Descending);
        assert_eq!(fields.field_names(), vec!["a"]);
        assert_eq!(fields.sorting_order()[0].1, SortOrder::Ascending);
    }
}
