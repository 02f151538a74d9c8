use crate::common::Value;
use crate::errors::{invalid_spec, QuarryResult};
use std::fmt::Display;

/// Specifies the direction for sorting documents and for index fields.
///
/// In specification documents a direction is written `1` (ascending) or
/// `-1` (descending).
///
/// ```text
/// let options = order_by("price", SortOrder::Descending);
/// let cursor = collection.find_with_options(filter, &options)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

impl SortOrder {
    /// Parses a direction value of a sort or index specification.
    pub fn from_direction(field: &str, direction: &Value) -> QuarryResult<SortOrder> {
        match direction.as_i64() {
            Some(1) => Ok(SortOrder::Ascending),
            Some(-1) => Ok(SortOrder::Descending),
            _ => Err(invalid_spec(&format!(
                "Direction of '{}' must be 1 or -1, found {}",
                field, direction
            ))),
        }
    }

    pub fn direction(&self) -> i64 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::Descending)
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.direction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::val;

    #[test]
    fn parses_directions() {
        assert_eq!(SortOrder::from_direction("a", &val!(1)).unwrap(), SortOrder::Ascending);
        assert_eq!(SortOrder::from_direction("a", &val!(-1)).unwrap(), SortOrder::Descending);
        assert_eq!(SortOrder::from_direction("a", &val!(1.0)).unwrap(), SortOrder::Ascending);
    }

    #[test]
    fn rejects_other_directions() {
        for direction in [val!(0), val!(2), val!("asc"), val!(true)] {
            let err = SortOrder::from_direction("a", &direction).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidSpecification);
        }
    }

    #[test]
    fn displays_as_direction() {
        assert_eq!(SortOrder::Descending.to_string(), "-1");
        assert!(SortOrder::Descending.is_descending());
    }
}
