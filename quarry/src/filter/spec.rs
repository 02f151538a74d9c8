use crate::collection::Document;
use crate::common::{Value, OPERATOR_PREFIX};
use crate::errors::{invalid_spec, QuarryResult};

use super::{all, and, field, nor, not, or, ComparisonMode, Filter};

impl Filter {
    /// Parses a filter specification document.
    ///
    /// Each top level field maps either to a literal, which is an equality
    /// test, or to an operator document such as `{"$gt": 10, "$lt": 20}`.
    /// All top level entries must hold. `$and`, `$or` and `$nor` take an
    /// array of sub-specifications.
    ///
    /// Every problem is reported here, before any document is evaluated:
    /// unknown operators, operator documents mixing `$` keys with plain
    /// keys, non-array `$in`/`$nin`, non-boolean `$exists` and invalid
    /// regular expressions all fail with
    /// [crate::errors::ErrorKind::InvalidSpecification].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use quarry::doc;
    /// use quarry::filter::Filter;
    ///
    /// let filter = Filter::from_spec(&doc! {
    ///     "$or": [{ genre: "sf" }, { price: { "$lt": 5 } }],
    ///     published_year: { "$gte": 1950 },
    /// }).unwrap();
    ///
    /// assert!(filter.apply(&doc! { genre: "drama", price: 3, published_year: 1960 }));
    /// assert!(!filter.apply(&doc! { genre: "drama", price: 8, published_year: 1960 }));
    /// ```
    pub fn from_spec(spec: &Document) -> QuarryResult<Filter> {
        let mut filters = Vec::with_capacity(spec.size());
        for (key, value) in spec.iter() {
            if key.starts_with(OPERATOR_PREFIX) {
                let clauses = parse_clauses(key, value)?;
                let filter = match key.as_str() {
                    "$and" => and(clauses),
                    "$or" => or(clauses),
                    "$nor" => nor(clauses),
                    _ => return Err(invalid_spec(&format!("Unknown top level operator {}", key))),
                };
                filters.push(filter);
            } else {
                filters.extend(parse_field(key, value)?);
            }
        }

        Ok(match filters.len() {
            0 => all(),
            1 => filters.remove(0),
            _ => and(filters),
        })
    }
}

fn parse_clauses(operator: &str, value: &Value) -> QuarryResult<Vec<Filter>> {
    if !matches!(operator, "$and" | "$or" | "$nor") {
        return Err(invalid_spec(&format!("Unknown top level operator {}", operator)));
    }

    let clauses = match value {
        Value::Array(clauses) if !clauses.is_empty() => clauses,
        _ => {
            return Err(invalid_spec(&format!(
                "{} requires a non-empty array of filter documents",
                operator
            )))
        }
    };

    clauses
        .iter()
        .map(|clause| match clause {
            Value::Document(doc) => Filter::from_spec(doc),
            other => Err(invalid_spec(&format!(
                "{} clause must be a document, found {}",
                operator, other
            ))),
        })
        .collect()
}

fn is_operator_document(value: &Value) -> QuarryResult<bool> {
    let doc = match value {
        Value::Document(doc) if !doc.is_empty() => doc,
        _ => return Ok(false),
    };

    let operators = doc.keys().filter(|key| key.starts_with(OPERATOR_PREFIX)).count();
    if operators == 0 {
        Ok(false)
    } else if operators == doc.size() {
        Ok(true)
    } else {
        Err(invalid_spec(&format!(
            "Cannot mix operators and literal fields in {}",
            doc
        )))
    }
}

fn parse_field(field_name: &str, value: &Value) -> QuarryResult<Vec<Filter>> {
    if field_name.is_empty() {
        return Err(invalid_spec("Filter field name cannot be empty"));
    }

    if !is_operator_document(value)? {
        return Ok(vec![field(field_name).eq(value.clone())]);
    }

    let operators = match value.as_document() {
        Some(doc) => doc,
        None => return Ok(vec![]),
    };

    let mut filters = Vec::with_capacity(operators.size());
    for (operator, operand) in operators.iter() {
        let filter = match operator.as_str() {
            "$eq" => field(field_name).eq(operand.clone()),
            "$ne" => field(field_name).ne(operand.clone()),
            "$gt" => field(field_name).compare(operand.clone(), ComparisonMode::Greater),
            "$gte" => field(field_name).compare(operand.clone(), ComparisonMode::GreaterEqual),
            "$lt" => field(field_name).compare(operand.clone(), ComparisonMode::Lesser),
            "$lte" => field(field_name).compare(operand.clone(), ComparisonMode::LesserEqual),
            "$in" => field(field_name).in_array(array_operand(field_name, operator, operand)?),
            "$nin" => field(field_name).not_in_array(array_operand(field_name, operator, operand)?),
            "$exists" => match operand {
                Value::Bool(exists) => field(field_name).exists(*exists),
                other => {
                    return Err(invalid_spec(&format!(
                        "$exists on '{}' requires a boolean, found {}",
                        field_name, other
                    )))
                }
            },
            "$regex" => {
                let pattern = regex_pattern(field_name, operand, operators.get("$options"))?;
                field(field_name).regex(&pattern)?
            }
            // consumed by $regex
            "$options" => {
                if !operators.contains_key("$regex") {
                    return Err(invalid_spec(&format!(
                        "$options on '{}' requires $regex",
                        field_name
                    )));
                }
                continue;
            }
            "$not" => {
                if !is_operator_document(operand)? {
                    return Err(invalid_spec(&format!(
                        "$not on '{}' requires an operator document",
                        field_name
                    )));
                }
                let inner = parse_field(field_name, operand)?;
                match inner.len() {
                    1 => not(inner[0].clone()),
                    _ => not(and(inner)),
                }
            }
            _ => {
                return Err(invalid_spec(&format!(
                    "Unknown operator {} on '{}'",
                    operator, field_name
                )))
            }
        };
        filters.push(filter);
    }
    Ok(filters)
}

fn array_operand(field_name: &str, operator: &str, operand: &Value) -> QuarryResult<Vec<Value>> {
    match operand {
        Value::Array(values) => Ok(values.clone()),
        other => Err(invalid_spec(&format!(
            "{} on '{}' requires an array, found {}",
            operator, field_name, other
        ))),
    }
}

fn regex_pattern(field_name: &str, pattern: &Value, options: Option<&Value>) -> QuarryResult<String> {
    let pattern = match pattern {
        Value::String(pattern) => pattern,
        other => {
            return Err(invalid_spec(&format!(
                "$regex on '{}' requires a string, found {}",
                field_name, other
            )))
        }
    };

    match options {
        None => Ok(pattern.clone()),
        Some(Value::String(flags)) if flags.is_empty() => Ok(pattern.clone()),
        Some(Value::String(flags)) if flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x')) => {
            Ok(format!("(?{}){}", flags, pattern))
        }
        Some(other) => Err(invalid_spec(&format!(
            "Unsupported $options {} on '{}'",
            other, field_name
        ))),
    }
}
