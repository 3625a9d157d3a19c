//! Information functions
//!
//! The IS* functions inspect their argument, so an error value is an answer
//! here rather than something to propagate.

use tabula_core::CellError;

use super::text_arg;
use crate::error::FormulaResult;
use crate::value::Value;

fn first(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Blank)
}

/// TYPEOF(value): the value's type name
pub fn fn_typeof(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::from(first(args).type_name()))
}

pub fn fn_isblank(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Boolean(first(args).is_blank()))
}

pub fn fn_isnumber(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Boolean(matches!(first(args), Value::Number(_))))
}

pub fn fn_istext(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Boolean(matches!(first(args), Value::Text(_))))
}

pub fn fn_iserror(args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Boolean(first(args).is_error()))
}

/// NA(): the `#N/A` error
pub fn fn_na(_args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Error(CellError::Na))
}

/// ROWS(value): 1 for a scalar
pub fn fn_rows(args: &[Value]) -> FormulaResult<Value> {
    dimension(first(args), |(rows, _)| rows)
}

/// COLUMNS(value): 1 for a scalar
pub fn fn_columns(args: &[Value]) -> FormulaResult<Value> {
    dimension(first(args), |(_, columns)| columns)
}

fn dimension(value: &Value, pick: fn((usize, usize)) -> usize) -> FormulaResult<Value> {
    match value {
        Value::Array(array) => Ok(Value::Number(pick(array.dimensions()) as f64)),
        Value::Error(e) => Ok(Value::Error(*e)),
        Value::Object(_) | Value::Function(_) => Ok(Value::Error(CellError::Value)),
        _ => Ok(Value::Number(1.0)),
    }
}

/// GET(object, property): `#N/A` for an unknown property
pub fn fn_get(args: &[Value]) -> FormulaResult<Value> {
    let object = match first(args) {
        Value::Object(object) => object,
        Value::Error(e) => return Ok(Value::Error(*e)),
        _ => return Ok(Value::Error(CellError::Value)),
    };
    let property = try_value!(text_arg(args, 1));

    Ok(object
        .get(&property)
        .cloned()
        .unwrap_or(Value::Error(CellError::Na)))
}
