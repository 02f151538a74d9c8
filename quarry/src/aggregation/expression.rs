use crate::collection::Document;
use crate::common::{Value, FIELD_SEPARATOR, OPERATOR_PREFIX};
use crate::errors::{invalid_spec, QuarryResult};

/// A computed value in `$addFields`, `$group` keys and accumulators.
///
/// Evaluation never fails. A field reference to a missing field yields
/// `null`, and so does arithmetic on non-numbers or division by zero.
///
/// # Examples
///
/// ```rust
/// use quarry::aggregation::Expression;
/// use quarry::common::Value;
/// use quarry::doc;
///
/// let decade = Expression::parse(&Value::from(doc! {
///     "$multiply": [{ "$floor": { "$divide": ["$year", 10] } }, 10]
/// }))
/// .unwrap();
/// assert_eq!(decade.evaluate(&doc! { year: 1955 }), Value::I64(1950));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    /// A field path, written `"$path"` in a specification.
    Field(String),
    Document(Vec<(String, Expression)>),
    Array(Vec<Expression>),
    Add(Vec<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Vec<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Mod(Box<Expression>, Box<Expression>),
    Floor(Box<Expression>),
    Ceil(Box<Expression>),
    Trunc(Box<Expression>),
    Abs(Box<Expression>),
    Concat(Vec<Expression>),
    ToUpper(Box<Expression>),
    ToLower(Box<Expression>),
    IfNull(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn field(path: &str) -> Expression {
        Expression::Field(path.to_string())
    }

    pub fn literal(value: impl Into<Value>) -> Expression {
        Expression::Literal(value.into())
    }

    pub fn parse(spec: &Value) -> QuarryResult<Expression> {
        match spec {
            Value::String(s) if s.starts_with(OPERATOR_PREFIX) => {
                let path = &s[1..];
                validate_path(path)?;
                Ok(Expression::Field(path.to_string()))
            }
            Value::Array(items) => Ok(Expression::Array(
                items.iter().map(Expression::parse).collect::<QuarryResult<_>>()?,
            )),
            Value::Document(doc) => parse_document(doc),
            other => Ok(Expression::Literal(other.clone())),
        }
    }

    pub fn evaluate(&self, document: &Document) -> Value {
        match self {
            Expression::Literal(value) => value.clone(),
            Expression::Field(path) => document.get(path).cloned().unwrap_or_default(),
            Expression::Document(fields) => Value::Document(
                fields
                    .iter()
                    .map(|(key, expr)| (key.clone(), expr.evaluate(document)))
                    .collect(),
            ),
            Expression::Array(items) => {
                Value::Array(items.iter().map(|expr| expr.evaluate(document)).collect())
            }
            Expression::Add(operands) => {
                fold_numbers(operands, document, Value::I64(0), |acc, v| acc.numeric_add(v))
            }
            Expression::Multiply(operands) => {
                fold_numbers(operands, document, Value::I64(1), multiply)
            }
            Expression::Subtract(a, b) => subtract(&a.evaluate(document), &b.evaluate(document)),
            Expression::Divide(a, b) => divide(&a.evaluate(document), &b.evaluate(document)),
            Expression::Mod(a, b) => modulo(&a.evaluate(document), &b.evaluate(document)),
            Expression::Floor(a) => round_with(&a.evaluate(document), f64::floor),
            Expression::Ceil(a) => round_with(&a.evaluate(document), f64::ceil),
            Expression::Trunc(a) => round_with(&a.evaluate(document), f64::trunc),
            Expression::Abs(a) => match a.evaluate(document) {
                Value::I64(i) => i
                    .checked_abs()
                    .map(Value::I64)
                    .unwrap_or(Value::F64((i as f64).abs())),
                Value::F64(f) => Value::F64(f.abs()),
                _ => Value::Null,
            },
            Expression::Concat(operands) => {
                let mut result = String::new();
                for operand in operands {
                    match operand.evaluate(document) {
                        Value::String(s) => result.push_str(&s),
                        _ => return Value::Null,
                    }
                }
                Value::String(result)
            }
            Expression::ToUpper(a) => map_string(&a.evaluate(document), str::to_uppercase),
            Expression::ToLower(a) => map_string(&a.evaluate(document), str::to_lowercase),
            Expression::IfNull(a, b) => match a.evaluate(document) {
                Value::Null => b.evaluate(document),
                value => value,
            },
        }
    }
}

fn validate_path(path: &str) -> QuarryResult<()> {
    if path.is_empty()
        || path
            .split(FIELD_SEPARATOR)
            .any(|segment| segment.is_empty() || segment.starts_with(OPERATOR_PREFIX))
    {
        return Err(invalid_spec(&format!("Invalid field reference '${}'", path)));
    }
    Ok(())
}

fn parse_document(doc: &Document) -> QuarryResult<Expression> {
    let operators = doc.keys().filter(|k| k.starts_with(OPERATOR_PREFIX)).count();
    if operators == 0 {
        let mut fields = Vec::with_capacity(doc.size());
        for (key, value) in doc.iter() {
            fields.push((key.clone(), Expression::parse(value)?));
        }
        return Ok(Expression::Document(fields));
    }

    if doc.size() != 1 {
        return Err(invalid_spec(&format!(
            "An operator expression must have exactly one key, found {}",
            doc
        )));
    }

    let Some((operator, operand)) = doc.iter().next() else {
        return Err(invalid_spec("Empty operator expression"));
    };

    if operator == "$literal" {
        return Ok(Expression::Literal(operand.clone()));
    }

    let expression = match operator.as_str() {
        "$add" => Expression::Add(operands(operator, operand)?),
        "$multiply" => Expression::Multiply(operands(operator, operand)?),
        "$concat" => Expression::Concat(operands(operator, operand)?),
        "$subtract" => {
            let (a, b) = binary(operator, operand)?;
            Expression::Subtract(a, b)
        }
        "$divide" => {
            let (a, b) = binary(operator, operand)?;
            Expression::Divide(a, b)
        }
        "$mod" => {
            let (a, b) = binary(operator, operand)?;
            Expression::Mod(a, b)
        }
        "$ifNull" => {
            let (a, b) = binary(operator, operand)?;
            Expression::IfNull(a, b)
        }
        "$floor" => Expression::Floor(unary(operator, operand)?),
        "$ceil" => Expression::Ceil(unary(operator, operand)?),
        "$trunc" => Expression::Trunc(unary(operator, operand)?),
        "$abs" => Expression::Abs(unary(operator, operand)?),
        "$toUpper" => Expression::ToUpper(unary(operator, operand)?),
        "$toLower" => Expression::ToLower(unary(operator, operand)?),
        _ => {
            return Err(invalid_spec(&format!(
                "Unknown expression operator {}",
                operator
            )))
        }
    };
    Ok(expression)
}

fn operands(operator: &str, operand: &Value) -> QuarryResult<Vec<Expression>> {
    match operand {
        Value::Array(items) => items.iter().map(Expression::parse).collect(),
        _ => Err(invalid_spec(&format!(
            "{} expects an array of operands, found {}",
            operator, operand
        ))),
    }
}

fn binary(operator: &str, operand: &Value) -> QuarryResult<(Box<Expression>, Box<Expression>)> {
    match operand {
        Value::Array(items) if items.len() == 2 => Ok((
            Box::new(Expression::parse(&items[0])?),
            Box::new(Expression::parse(&items[1])?),
        )),
        _ => Err(invalid_spec(&format!(
            "{} expects an array of exactly two operands, found {}",
            operator, operand
        ))),
    }
}

fn unary(operator: &str, operand: &Value) -> QuarryResult<Box<Expression>> {
    match operand {
        Value::Array(items) if items.len() == 1 => Ok(Box::new(Expression::parse(&items[0])?)),
        Value::Array(_) => Err(invalid_spec(&format!(
            "{} expects a single operand, found {}",
            operator, operand
        ))),
        _ => Ok(Box::new(Expression::parse(operand)?)),
    }
}

fn fold_numbers(
    operands: &[Expression],
    document: &Document,
    initial: Value,
    op: impl Fn(&Value, &Value) -> Option<Value>,
) -> Value {
    let mut acc = initial;
    for operand in operands {
        match op(&acc, &operand.evaluate(document)) {
            Some(value) => acc = value,
            None => return Value::Null,
        }
    }
    acc
}

fn multiply(a: &Value, b: &Value) -> Option<Value> {
    match (a, b) {
        (Value::I64(x), Value::I64(y)) => Some(match x.checked_mul(*y) {
            Some(product) => Value::I64(product),
            None => Value::F64(*x as f64 * *y as f64),
        }),
        _ => Some(Value::F64(a.as_f64()? * b.as_f64()?)),
    }
}

fn subtract(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::I64(x), Value::I64(y)) => match x.checked_sub(*y) {
            Some(difference) => Value::I64(difference),
            None => Value::F64(*x as f64 - *y as f64),
        },
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Value::F64(x - y),
            _ => Value::Null,
        },
    }
}

fn divide(a: &Value, b: &Value) -> Value {
    match (a.as_f64(), b.as_f64()) {
        (Some(_), Some(y)) if y == 0.0 => {
            log::warn!("Division by zero evaluates to null");
            Value::Null
        }
        (Some(x), Some(y)) => Value::F64(x / y),
        _ => Value::Null,
    }
}

fn modulo(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (_, divisor) if divisor.as_f64() == Some(0.0) => {
            log::warn!("Modulo by zero evaluates to null");
            Value::Null
        }
        (Value::I64(x), Value::I64(y)) => x.checked_rem(*y).map(Value::I64).unwrap_or(Value::I64(0)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Value::F64(x % y),
            _ => Value::Null,
        },
    }
}

/// Rounds a number, returning an integer when the result fits in one.
fn round_with(value: &Value, round: fn(f64) -> f64) -> Value {
    match value {
        Value::I64(i) => Value::I64(*i),
        Value::F64(f) => {
            let rounded = round(*f);
            if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
                Value::I64(rounded as i64)
            } else {
                Value::F64(rounded)
            }
        }
        _ => Value::Null,
    }
}

fn map_string(value: &Value, f: fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        Value::Null => Value::String(String::new()),
        _ => Value::Null,
    }
}
