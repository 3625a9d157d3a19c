//! Formula values
//!
//! [`Value`] is a closed set of variants. Coercion (`to_number`, `to_text`,
//! `to_bool`) and comparison (`equal`, `less`) are exhaustive matches, so an
//! unsupported combination is a match arm rather than a runtime check.
//!
//! Coercions fail with the [`CellError`] a spreadsheet would show. Comparing
//! values of different variants is a structural [`FormulaError::Incompatible`],
//! which the evaluator turns into `#VALUE!`.

mod array;
mod object;

pub use array::Array;
pub use object::Object;

use std::fmt;

use chrono::{DateTime, Utc};
use tabula_core::{format_number, parse_number, CellError, CellValue};

use crate::error::{FormulaError, FormulaResult};
use crate::function::Function;

/// A formula value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Empty cell
    #[default]
    Blank,
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// In-band spreadsheet error (`#DIV/0!`, `#N/A`, ...)
    Error(CellError),
    Array(Array),
    Object(Object),
    Function(Function),
}

/// Coarse classification of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    Array,
    Object,
    Function,
    Error,
}

impl Value {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Blank
            | Value::Number(_)
            | Value::Text(_)
            | Value::Boolean(_)
            | Value::Date(_) => ValueKind::Scalar,
            Value::Error(_) => ValueKind::Error,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Function(_) => ValueKind::Function,
        }
    }

    /// Type name used by TYPEOF and in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Blank => "blank",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::Error(_) => "error",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The error code, if this is an error value
    pub fn as_error(&self) -> Option<CellError> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    // === Coercion ===

    /// Numeric coercion
    ///
    /// Blank is 0, booleans are 0/1, text must parse as a number (`#N/A`
    /// otherwise) and dates are seconds since the Unix epoch.
    pub fn to_number(&self) -> Result<f64, CellError> {
        match self {
            Value::Blank => Ok(0.0),
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => parse_number(s).ok_or(CellError::Na),
            Value::Date(d) => Ok(d.timestamp() as f64),
            Value::Error(e) => Err(*e),
            Value::Array(a) => single(a)?.to_number(),
            Value::Object(_) | Value::Function(_) => Err(CellError::Value),
        }
    }

    /// Text coercion: the canonical display string of a scalar
    pub fn to_text(&self) -> Result<String, CellError> {
        match self {
            Value::Error(e) => Err(*e),
            Value::Array(a) => single(a)?.to_text(),
            Value::Object(_) | Value::Function(_) => Err(CellError::Value),
            scalar => Ok(scalar.to_string()),
        }
    }

    /// Boolean coercion: numbers are nonzero, text is nonempty
    pub fn to_bool(&self) -> Result<bool, CellError> {
        match self {
            Value::Blank => Ok(false),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Text(s) => Ok(!s.is_empty()),
            Value::Boolean(b) => Ok(*b),
            Value::Date(d) => Ok(d.timestamp() != 0 || d.timestamp_subsec_nanos() != 0),
            Value::Error(e) => Err(*e),
            Value::Array(a) => single(a)?.to_bool(),
            Value::Object(_) | Value::Function(_) => Err(CellError::Value),
        }
    }

    // === Comparison ===

    /// Equality within one variant; text compares case-insensitively
    ///
    /// Blank is a variant of its own: it equals Blank and is incompatible
    /// with everything else, exactly as for [`Value::less`].
    pub fn equal(&self, other: &Value) -> FormulaResult<bool> {
        match (self, other) {
            (Value::Blank, Value::Blank) => Ok(true),
            (Value::Number(a), Value::Number(b)) => Ok(a == b),
            (Value::Text(a), Value::Text(b)) => Ok(a.to_lowercase() == b.to_lowercase()),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
            (Value::Date(a), Value::Date(b)) => Ok(a == b),
            (Value::Error(a), Value::Error(b)) => Ok(a == b),
            _ => Err(self.incompatible(other)),
        }
    }

    /// Strict ordering within one variant; `FALSE < TRUE`
    pub fn less(&self, other: &Value) -> FormulaResult<bool> {
        match (self, other) {
            (Value::Blank, Value::Blank) => Ok(false),
            (Value::Number(a), Value::Number(b)) => Ok(a < b),
            (Value::Text(a), Value::Text(b)) => Ok(a.to_lowercase() < b.to_lowercase()),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(!*a && *b),
            (Value::Date(a), Value::Date(b)) => Ok(a < b),
            _ => Err(self.incompatible(other)),
        }
    }

    fn incompatible(&self, other: &Value) -> FormulaError {
        FormulaError::Incompatible {
            left: self.type_name(),
            right: other.type_name(),
        }
    }

    /// Collapse to a storable cell value
    ///
    /// Arrays store their top-left element; objects and functions cannot be
    /// stored and become `#VALUE!`.
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            Value::Blank => CellValue::Blank,
            Value::Number(n) => CellValue::Number(*n),
            Value::Text(s) => CellValue::Text(s.clone()),
            Value::Boolean(b) => CellValue::Boolean(*b),
            Value::Date(d) => CellValue::Date(*d),
            Value::Error(e) => CellValue::Error(*e),
            Value::Array(a) => a.first().map(Value::to_cell_value).unwrap_or_default(),
            Value::Object(_) | Value::Function(_) => CellValue::Error(CellError::Value),
        }
    }
}

/// The only element of a 1x1 array
fn single(array: &Array) -> Result<&Value, CellError> {
    match (array.dimensions(), array.first()) {
        ((1, 1), Some(value)) => Ok(value),
        _ => Err(CellError::Value),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Blank => Ok(()),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Value::Error(e) => write!(f, "{}", e),
            Value::Array(a) => write!(f, "{}", a),
            Value::Object(o) => write!(f, "{}", o),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
        }
    }
}

impl From<CellValue> for Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Blank => Value::Blank,
            CellValue::Number(n) => Value::Number(n),
            CellValue::Text(s) => Value::Text(s),
            CellValue::Boolean(b) => Value::Boolean(b),
            CellValue::Date(d) => Value::Date(d),
            CellValue::Error(e) => Value::Error(e),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<CellError> for Value {
    fn from(e: CellError) -> Self {
        Value::Error(e)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_and_type_name() {
        assert_eq!(Value::Number(1.0).kind(), ValueKind::Scalar);
        assert_eq!(Value::Error(CellError::Na).kind(), ValueKind::Error);
        assert_eq!(Value::Array(Array::new(1, 1)).kind(), ValueKind::Array);
        assert_eq!(Value::Blank.type_name(), "blank");
        assert_eq!(Value::from("x").type_name(), "text");
        assert_eq!(Value::Object(Object::new("o")).type_name(), "object");
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::Blank.to_number(), Ok(0.0));
        assert_eq!(Value::Boolean(true).to_number(), Ok(1.0));
        assert_eq!(Value::from(" 2.5 ").to_number(), Ok(2.5));
        assert_eq!(Value::from("abc").to_number(), Err(CellError::Na));
        assert_eq!(Value::Error(CellError::Ref).to_number(), Err(CellError::Ref));
        assert_eq!(
            Value::Object(Object::new("o")).to_number(),
            Err(CellError::Value)
        );

        let epoch_plus_minute = Utc.with_ymd_and_hms(1970, 1, 1, 0, 1, 0).unwrap();
        assert_eq!(Value::Date(epoch_plus_minute).to_number(), Ok(60.0));
    }

    #[test]
    fn test_to_number_single_element_array() {
        assert_eq!(
            Value::Array(Array::scalar(Value::Number(7.0))).to_number(),
            Ok(7.0)
        );
        assert_eq!(
            Value::Array(Array::new(2, 1)).to_number(),
            Err(CellError::Value)
        );
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Number(2.0).to_text(), Ok("2".to_string()));
        assert_eq!(Value::Number(0.25).to_text(), Ok("0.25".to_string()));
        assert_eq!(Value::Boolean(false).to_text(), Ok("FALSE".to_string()));
        assert_eq!(Value::Blank.to_text(), Ok(String::new()));
        assert_eq!(Value::Error(CellError::Div0).to_text(), Err(CellError::Div0));
    }

    #[test]
    fn test_to_bool() {
        assert_eq!(Value::Number(0.0).to_bool(), Ok(false));
        assert_eq!(Value::Number(-3.0).to_bool(), Ok(true));
        assert_eq!(Value::from("").to_bool(), Ok(false));
        assert_eq!(Value::from("no").to_bool(), Ok(true));
        assert_eq!(Value::Date(Utc.timestamp_opt(0, 0).unwrap()).to_bool(), Ok(false));
    }

    #[test]
    fn test_equal_same_variant() {
        assert_eq!(Value::from("Foo").equal(&Value::from("foo")), Ok(true));
        assert_eq!(Value::Number(1.0).equal(&Value::Number(2.0)), Ok(false));
        assert_eq!(Value::Blank.equal(&Value::Blank), Ok(true));
        assert_eq!(Value::Blank.less(&Value::Blank), Ok(false));
    }

    #[test]
    fn test_cross_variant_is_incompatible() {
        assert_eq!(
            Value::Number(1.0).equal(&Value::from("1")),
            Err(FormulaError::Incompatible {
                left: "number",
                right: "text"
            })
        );
        assert!(Value::Boolean(true).less(&Value::Number(1.0)).is_err());
        assert!(Value::Blank.less(&Value::Number(1.0)).is_err());
    }

    #[test]
    fn test_blank_against_other_variants() {
        for other in [Value::Number(0.0), Value::from(""), Value::Boolean(false)] {
            assert!(Value::Blank.equal(&other).is_err());
            assert!(other.equal(&Value::Blank).is_err());
            assert!(Value::Blank.less(&other).is_err());
            assert!(other.less(&Value::Blank).is_err());
        }
    }

    #[test]
    fn test_less() {
        assert_eq!(Value::Number(1.0).less(&Value::Number(2.0)), Ok(true));
        assert_eq!(Value::from("apple").less(&Value::from("Banana")), Ok(true));
        assert_eq!(Value::Boolean(false).less(&Value::Boolean(true)), Ok(true));
        assert_eq!(Value::Boolean(true).less(&Value::Boolean(true)), Ok(false));
    }

    #[test]
    fn test_to_cell_value() {
        assert_eq!(Value::Number(1.0).to_cell_value(), CellValue::Number(1.0));
        assert_eq!(
            Value::Array(Array::scalar(Value::from("x"))).to_cell_value(),
            CellValue::text("x")
        );
        assert_eq!(
            Value::Object(Object::new("o")).to_cell_value(),
            CellValue::Error(CellError::Value)
        );
    }
}
