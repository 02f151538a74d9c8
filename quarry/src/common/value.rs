use crate::collection::{Document, RecordId};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// Compare two floats for equality with proper NaN handling.
#[inline]
fn num_eq_float(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a == b
    }
}

/// Compare two floats with NaN treated as greater than all other values.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compare an integer with a float exactly, without rounding the integer
/// through `f64`. NaN is greater than every integer.
fn num_cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above i64::MAX
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() || f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }

    // in range, so the integral part converts to i64 exactly
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&f).unwrap_or(Ordering::Equal),
        ordering => ordering,
    }
}

/// A dynamically typed field value of a [Document].
///
/// Integers and floats are a single numeric family: `I64(3)` equals
/// `F64(3.0)` and the two interleave when sorted. Across families the total
/// order follows the type rank
///
/// `Null < numbers < String < Document < Array < Bool < Id`
///
/// which is the order used by sorting and by index keys. Predicates do not
/// use this cross-type order; they compare only values of the same family
/// (see [Value::compare_same_kind]).
///
/// # Examples
///
/// ```rust
/// use quarry::common::Value;
/// use quarry::val;
///
/// assert_eq!(val!(3), Value::F64(3.0));
/// assert!(Value::Null < val!(-100));
/// assert!(val!(1_000_000) < val!("a"));
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Document(Document),
    Array(Vec<Value>),
    Id(RecordId),
}

impl Value {
    /// Position of the value's family in the cross-type total order.
    pub(crate) fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::I64(_) | Value::F64(_) => 1,
            Value::String(_) => 2,
            Value::Document(_) => 3,
            Value::Array(_) => 4,
            Value::Bool(_) => 5,
            Value::Id(_) => 6,
        }
    }

    /// Short name of the value's type, used in log and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
            Value::Id(_) => "id",
        }
    }

    /// Compares two values of the same family.
    ///
    /// Returns `None` when the values belong to different families, which
    /// comparison predicates treat as "does not match".
    pub fn compare_same_kind(&self, other: &Value) -> Option<Ordering> {
        if self.type_rank() == other.type_rank() {
            Some(self.cmp(other))
        } else {
            None
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value. Floats are converted only when they are
    /// integral and within the `i64` range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            Value::F64(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    /// Returns any numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_record_id(&self) -> Option<&RecordId> {
        match self {
            Value::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Takes the value out, leaving [Value::Null] in its place.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    /// Adds two numbers. The sum of two integers stays integral unless it
    /// overflows, in which case it is promoted to a float. Returns `None`
    /// when either side is not a number.
    pub(crate) fn numeric_add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::I64(a), Value::I64(b)) => Some(match a.checked_add(*b) {
                Some(sum) => Value::I64(sum),
                None => Value::F64(*a as f64 + *b as f64),
            }),
            _ => Some(Value::F64(self.as_f64()? + other.as_f64()?)),
        }
    }

    fn write_json(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(v) => write!(f, "{:?}", v),
            Value::String(s) => write_escaped(f, s),
            Value::Document(doc) => write!(f, "{}", doc),
            Value::Array(array) => {
                write!(f, "[")?;
                for (i, value) in array.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    value.write_json(f)?;
                }
                write!(f, "]")
            }
            Value::Id(id) => write!(f, "Id({})", id),
        }
    }
}

/// Writes a JSON string literal, escaping quotes, backslashes and control
/// characters.
pub(crate) fn write_escaped(f: &mut Formatter<'_>, s: &str) -> std::fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_json(f)
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "bool({})", b),
            Value::I64(i) => write!(f, "i64({})", i),
            Value::F64(v) => write!(f, "f64({:?})", v),
            Value::String(s) => write!(f, "string({:?})", s),
            Value::Document(doc) => write!(f, "document({})", doc),
            Value::Array(array) => write!(f, "array({:?})", array),
            Value::Id(id) => write!(f, "{:?}", id),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::I64(a), Value::F64(b)) | (Value::F64(b), Value::I64(a)) => {
                num_cmp_int_float(*a, *b) == Ordering::Equal
            }
            (Value::F64(a), Value::F64(b)) => num_eq_float(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Id(a), Value::Id(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::I64(a), Value::F64(b)) => num_cmp_int_float(*a, *b),
            (Value::F64(a), Value::I64(b)) => num_cmp_int_float(*b, *a).reverse(),
            (Value::F64(a), Value::F64(b)) => num_cmp_float(*a, *b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Id(a), Value::Id(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::I64(value as i64)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<RecordId> for Value {
    fn from(value: RecordId) -> Self {
        Value::Id(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Creates a [Value] from any expression convertible with `From`.
///
/// ```rust
/// use quarry::common::Value;
/// use quarry::val;
///
/// assert_eq!(val!(42), Value::I64(42));
/// assert_eq!(val!("hello"), Value::String("hello".to_string()));
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
