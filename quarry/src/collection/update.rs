use std::fmt::Display;

use crate::collection::Document;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR, OPERATOR_PREFIX};
use crate::errors::{invalid_spec, ErrorKind, QuarryError, QuarryResult};

#[derive(Debug, Clone, PartialEq)]
enum UpdateAction {
    Set(String, Value),
    Unset(String),
    Inc(String, Value),
}

impl UpdateAction {
    fn path(&self) -> &str {
        match self {
            UpdateAction::Set(path, _) => path,
            UpdateAction::Unset(path) => path,
            UpdateAction::Inc(path, _) => path,
        }
    }
}

/// A validated field-level update.
///
/// Parsed from an operator document such as
/// `{$set: {status: "sold"}, $inc: {stock: -1}, $unset: {draft: 1}}`. Fields
/// the update does not name keep their values.
///
/// Parsing fails with `InvalidSpecification` on an empty document, a bare
/// field (replacement documents are not supported), an unknown operator, a
/// non-numeric `$inc` operand, any path touching `_id`, or two operators
/// naming the same or overlapping paths.
///
/// # Examples
///
/// ```rust
/// use quarry::collection::UpdateSpec;
/// use quarry::doc;
///
/// let update = UpdateSpec::from_spec(&doc! { "$inc": { stock: -1 } }).unwrap();
/// assert_eq!(update.to_string(), "{$inc: {stock: -1}}");
/// assert!(UpdateSpec::from_spec(&doc! { stock: 0 }).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpec {
    actions: Vec<UpdateAction>,
}

impl UpdateSpec {
    pub fn from_spec(spec: &Document) -> QuarryResult<UpdateSpec> {
        if spec.is_empty() {
            return Err(invalid_spec("Update specification cannot be empty"));
        }

        let mut actions = Vec::new();
        for (operator, operand) in spec.iter() {
            if !operator.starts_with(OPERATOR_PREFIX) {
                return Err(invalid_spec(&format!(
                    "Update specification must use update operators, found field '{}'",
                    operator
                )));
            }

            let fields = operand.as_document().ok_or_else(|| {
                invalid_spec(&format!("{} expects a document, found {}", operator, operand))
            })?;

            for (path, value) in fields.iter() {
                validate_path(operator, path)?;
                let action = match operator.as_str() {
                    "$set" => UpdateAction::Set(path.clone(), value.clone()),
                    "$unset" => UpdateAction::Unset(path.clone()),
                    "$inc" => {
                        if !value.is_number() {
                            return Err(invalid_spec(&format!(
                                "$inc expects a numeric operand for '{}', found {}",
                                path, value
                            )));
                        }
                        UpdateAction::Inc(path.clone(), value.clone())
                    }
                    _ => {
                        return Err(invalid_spec(&format!(
                            "Unknown update operator {}",
                            operator
                        )))
                    }
                };
                actions.push(action);
            }
        }

        check_conflicts(&actions)?;
        Ok(UpdateSpec { actions })
    }

    /// Paths the update writes or removes, in declaration order.
    pub fn paths(&self) -> Vec<&str> {
        self.actions.iter().map(|action| action.path()).collect()
    }

    /// Applies the update to a copy of `document`.
    ///
    /// Fails with `InvalidOperation` when a path crosses a non-document
    /// value or `$inc` targets a non-numeric field.
    pub(crate) fn apply(&self, document: &Document) -> QuarryResult<Document> {
        let mut updated = document.clone();
        for action in &self.actions {
            match action {
                UpdateAction::Set(path, value) => updated.put(path, value.clone())?,
                UpdateAction::Unset(path) => {
                    updated.remove(path);
                }
                UpdateAction::Inc(path, amount) => {
                    let incremented = match updated.get(path) {
                        None => amount.clone(),
                        Some(current) => current.numeric_add(amount).ok_or_else(|| {
                            log::error!(
                                "Cannot apply $inc to '{}' holding a {} value",
                                path,
                                current.type_name()
                            );
                            QuarryError::new(
                                &format!("Cannot apply $inc to non-numeric field '{}'", path),
                                ErrorKind::InvalidOperation,
                            )
                        })?,
                    };
                    updated.put(path, incremented)?;
                }
            }
        }
        Ok(updated)
    }
}

fn validate_path(operator: &str, path: &str) -> QuarryResult<()> {
    if path.is_empty()
        || path
            .split(FIELD_SEPARATOR)
            .any(|segment| segment.is_empty() || segment.starts_with(OPERATOR_PREFIX))
    {
        return Err(invalid_spec(&format!(
            "Invalid field path '{}' in {}",
            path, operator
        )));
    }

    if path == DOC_ID || path.starts_with(&format!("{}{}", DOC_ID, FIELD_SEPARATOR)) {
        return Err(invalid_spec(&format!(
            "{} cannot modify the record identity field {}",
            operator, DOC_ID
        )));
    }
    Ok(())
}

fn check_conflicts(actions: &[UpdateAction]) -> QuarryResult<()> {
    for (i, action) in actions.iter().enumerate() {
        for other in &actions[i + 1..] {
            if overlaps(action.path(), other.path()) {
                return Err(invalid_spec(&format!(
                    "Update paths '{}' and '{}' conflict",
                    action.path(),
                    other.path()
                )));
            }
        }
    }
    Ok(())
}

fn overlaps(a: &str, b: &str) -> bool {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    longer == shorter
        || (longer.starts_with(shorter)
            && longer[shorter.len()..].starts_with(FIELD_SEPARATOR))
}

impl Display for UpdateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
        for action in &self.actions {
            let (operator, entry) = match action {
                UpdateAction::Set(path, value) => ("$set", format!("{}: {}", path, value)),
                UpdateAction::Unset(path) => ("$unset", format!("{}: 1", path)),
                UpdateAction::Inc(path, value) => ("$inc", format!("{}: {}", path, value)),
            };
            match groups.iter_mut().find(|(op, _)| *op == operator) {
                Some((_, entries)) => entries.push(entry),
                None => groups.push((operator, vec![entry])),
            }
        }

        write!(f, "{{")?;
        for (i, (operator, entries)) in groups.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {{{}}}", operator, entries.join(", "))?;
        }
        write!(f, "}}")
    }
}
