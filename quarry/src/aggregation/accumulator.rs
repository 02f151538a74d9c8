use crate::collection::Document;
use crate::common::{Value, OPERATOR_PREFIX};
use crate::errors::{invalid_spec, QuarryResult};

use super::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorKind {
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
    AddToSet,
    Count,
}

/// A per-group aggregate of a `$group` stage.
///
/// `$sum` adds the numeric values and ignores the rest, so `{$sum: 1}`
/// counts. `$min` and `$max` ignore `null`. `$avg` over no numeric values is
/// `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    kind: AccumulatorKind,
    expression: Expression,
}

impl Accumulator {
    pub fn new(kind: AccumulatorKind, expression: Expression) -> Self {
        Accumulator { kind, expression }
    }

    pub fn sum(expression: Expression) -> Self {
        Accumulator::new(AccumulatorKind::Sum, expression)
    }

    pub fn avg(expression: Expression) -> Self {
        Accumulator::new(AccumulatorKind::Avg, expression)
    }

    pub fn min(expression: Expression) -> Self {
        Accumulator::new(AccumulatorKind::Min, expression)
    }

    pub fn max(expression: Expression) -> Self {
        Accumulator::new(AccumulatorKind::Max, expression)
    }

    pub fn count() -> Self {
        Accumulator::new(AccumulatorKind::Count, Expression::Literal(Value::Null))
    }

    pub fn kind(&self) -> AccumulatorKind {
        self.kind
    }

    /// Parses `{$op: expression}`.
    pub fn parse(spec: &Value) -> QuarryResult<Accumulator> {
        let doc = spec
            .as_document()
            .filter(|doc| doc.size() == 1)
            .ok_or_else(|| {
                invalid_spec(&format!(
                    "An accumulator must be a document with exactly one operator, found {}",
                    spec
                ))
            })?;

        let Some((operator, operand)) = doc.iter().next() else {
            return Err(invalid_spec("Empty accumulator"));
        };

        let kind = match operator.as_str() {
            "$sum" => AccumulatorKind::Sum,
            "$avg" => AccumulatorKind::Avg,
            "$min" => AccumulatorKind::Min,
            "$max" => AccumulatorKind::Max,
            "$first" => AccumulatorKind::First,
            "$last" => AccumulatorKind::Last,
            "$push" => AccumulatorKind::Push,
            "$addToSet" => AccumulatorKind::AddToSet,
            "$count" => {
                if operand.as_document().map_or(true, |d| !d.is_empty()) {
                    return Err(invalid_spec("$count accumulator takes an empty document"));
                }
                return Ok(Accumulator::count());
            }
            other if other.starts_with(OPERATOR_PREFIX) => {
                return Err(invalid_spec(&format!("Unknown accumulator {}", other)))
            }
            other => {
                return Err(invalid_spec(&format!(
                    "Expected an accumulator operator, found field '{}'",
                    other
                )))
            }
        };
        Ok(Accumulator::new(kind, Expression::parse(operand)?))
    }

    pub(crate) fn start(&self) -> AccumulatorState {
        match self.kind {
            AccumulatorKind::Sum => AccumulatorState::Sum(Value::I64(0)),
            AccumulatorKind::Avg => AccumulatorState::Avg { sum: 0.0, count: 0 },
            AccumulatorKind::Min => AccumulatorState::Min(None),
            AccumulatorKind::Max => AccumulatorState::Max(None),
            AccumulatorKind::First => AccumulatorState::First(None),
            AccumulatorKind::Last => AccumulatorState::Last(Value::Null),
            AccumulatorKind::Push => AccumulatorState::Push(Vec::new()),
            AccumulatorKind::AddToSet => AccumulatorState::AddToSet(Vec::new()),
            AccumulatorKind::Count => AccumulatorState::Count(0),
        }
    }

    pub(crate) fn accumulate(&self, state: &mut AccumulatorState, document: &Document) {
        if let AccumulatorState::Count(count) = state {
            *count += 1;
            return;
        }

        let value = self.expression.evaluate(document);
        match state {
            AccumulatorState::Sum(sum) => {
                if let Some(total) = sum.numeric_add(&value) {
                    *sum = total;
                }
            }
            AccumulatorState::Avg { sum, count } => {
                if let Some(n) = value.as_f64() {
                    *sum += n;
                    *count += 1;
                }
            }
            AccumulatorState::Min(current) => {
                if !value.is_null() && current.as_ref().map_or(true, |c| value < *c) {
                    *current = Some(value);
                }
            }
            AccumulatorState::Max(current) => {
                if !value.is_null() && current.as_ref().map_or(true, |c| value > *c) {
                    *current = Some(value);
                }
            }
            AccumulatorState::First(first) => {
                if first.is_none() {
                    *first = Some(value);
                }
            }
            AccumulatorState::Last(last) => *last = value,
            AccumulatorState::Push(values) => values.push(value),
            AccumulatorState::AddToSet(values) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            AccumulatorState::Count(_) => {}
        }
    }
}

/// Running state of one accumulator within one group.
#[derive(Debug, Clone)]
pub(crate) enum AccumulatorState {
    Sum(Value),
    Avg { sum: f64, count: usize },
    Min(Option<Value>),
    Max(Option<Value>),
    First(Option<Value>),
    Last(Value),
    Push(Vec<Value>),
    AddToSet(Vec<Value>),
    Count(i64),
}

impl AccumulatorState {
    pub(crate) fn finish(self) -> Value {
        match self {
            AccumulatorState::Sum(sum) => sum,
            AccumulatorState::Avg { count: 0, .. } => Value::Null,
            AccumulatorState::Avg { sum, count } => Value::F64(sum / count as f64),
            AccumulatorState::Min(value) | AccumulatorState::Max(value) | AccumulatorState::First(value) => {
                value.unwrap_or_default()
            }
            AccumulatorState::Last(value) => value,
            AccumulatorState::Push(values) | AccumulatorState::AddToSet(values) => Value::Array(values),
            AccumulatorState::Count(count) => Value::I64(count),
        }
    }
}
