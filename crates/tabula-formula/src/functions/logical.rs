//! Logical functions

use tabula_core::CellError;

use super::flatten;
use crate::context::Context;
use crate::error::FormulaResult;
use crate::function::Argument;
use crate::value::Value;

/// IF(condition, when_true, [when_false])
///
/// Only the chosen branch is evaluated. A missing `when_false` is FALSE.
pub fn fn_if(args: &[Argument<'_>], ctx: &dyn Context) -> FormulaResult<Value> {
    let Some(condition) = args.first() else {
        return Ok(Value::Error(CellError::Value));
    };

    let condition = condition.evaluate(ctx)?;
    if let Value::Error(e) = condition {
        return Ok(Value::Error(e));
    }

    let branch = if try_value!(condition.to_bool()) {
        args.get(1)
    } else {
        args.get(2)
    };

    match branch {
        Some(arg) => arg.evaluate(ctx),
        None => Ok(Value::Boolean(false)),
    }
}

/// IFERROR(value, fallback): `fallback` is evaluated only when `value` is an error
pub fn fn_iferror(args: &[Argument<'_>], ctx: &dyn Context) -> FormulaResult<Value> {
    let [value, fallback] = args else {
        return Ok(Value::Error(CellError::Value));
    };

    match value.evaluate(ctx)? {
        Value::Error(_) => fallback.evaluate(ctx),
        other => Ok(other),
    }
}

/// Booleans among the arguments; text and blanks are skipped
fn conditions(args: &[Value]) -> Result<Vec<bool>, CellError> {
    let mut result = Vec::new();
    for value in flatten(args) {
        match value {
            Value::Boolean(b) => result.push(*b),
            Value::Number(n) => result.push(*n != 0.0),
            Value::Error(e) => return Err(*e),
            _ => {}
        }
    }
    Ok(result)
}

/// AND(values...); `#VALUE!` when no argument is logical
pub fn fn_and(args: &[Value]) -> FormulaResult<Value> {
    let values = try_value!(conditions(args));
    if values.is_empty() {
        return Ok(Value::Error(CellError::Value));
    }
    Ok(Value::Boolean(values.iter().all(|b| *b)))
}

/// OR(values...); `#VALUE!` when no argument is logical
pub fn fn_or(args: &[Value]) -> FormulaResult<Value> {
    let values = try_value!(conditions(args));
    if values.is_empty() {
        return Ok(Value::Error(CellError::Value));
    }
    Ok(Value::Boolean(values.iter().any(|b| *b)))
}

pub fn fn_not(args: &[Value]) -> FormulaResult<Value> {
    let Some(value) = args.first() else {
        return Ok(Value::Error(CellError::Value));
    };
    Ok(Value::Boolean(!try_value!(value.to_bool())))
}
