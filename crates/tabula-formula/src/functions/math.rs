//! Math functions

use tabula_core::CellError;

use super::{number_arg, numbers};
use crate::ast::BinaryOperator;
use crate::error::FormulaResult;
use crate::evaluator::binary;
use crate::value::Value;

/// SUM(values...)
pub fn fn_sum(args: &[Value]) -> FormulaResult<Value> {
    let values = try_value!(numbers(args));
    Ok(Value::Number(values.iter().sum()))
}

/// AVERAGE(values...); `#DIV/0!` when nothing is numeric
pub fn fn_average(args: &[Value]) -> FormulaResult<Value> {
    let values = try_value!(numbers(args));
    if values.is_empty() {
        return Ok(Value::Error(CellError::Div0));
    }
    Ok(Value::Number(values.iter().sum::<f64>() / values.len() as f64))
}

/// MIN(values...); 0 when nothing is numeric
pub fn fn_min(args: &[Value]) -> FormulaResult<Value> {
    let values = try_value!(numbers(args));
    let min = values.into_iter().reduce(f64::min).unwrap_or(0.0);
    Ok(Value::Number(min))
}

/// MAX(values...); 0 when nothing is numeric
pub fn fn_max(args: &[Value]) -> FormulaResult<Value> {
    let values = try_value!(numbers(args));
    let max = values.into_iter().reduce(f64::max).unwrap_or(0.0);
    Ok(Value::Number(max))
}

/// COUNT(values...): how many are numbers; errors are not counted
pub fn fn_count(args: &[Value]) -> FormulaResult<Value> {
    let count = super::flatten(args)
        .filter(|v| matches!(v, Value::Number(_)))
        .count();
    Ok(Value::Number(count as f64))
}

/// COUNTA(values...): how many are not blank
pub fn fn_counta(args: &[Value]) -> FormulaResult<Value> {
    let count = super::flatten(args).filter(|v| !v.is_blank()).count();
    Ok(Value::Number(count as f64))
}

pub fn fn_abs(args: &[Value]) -> FormulaResult<Value> {
    let n = try_value!(number_arg(args, 0, 0.0));
    Ok(Value::Number(n.abs()))
}

/// ROUND(number, [digits]); halves round away from zero
pub fn fn_round(args: &[Value]) -> FormulaResult<Value> {
    let number = try_value!(number_arg(args, 0, 0.0));
    let digits = try_value!(number_arg(args, 1, 0.0)).trunc() as i32;

    // Negative digits round to the left of the decimal point
    let multiplier = 10_f64.powi(digits);
    let result = if number >= 0.0 {
        (number * multiplier + 0.5).floor() / multiplier
    } else {
        (number * multiplier - 0.5).ceil() / multiplier
    };

    if result.is_finite() {
        Ok(Value::Number(result))
    } else {
        Ok(Value::Error(CellError::Num))
    }
}

/// INT(number): round down to an integer
pub fn fn_int(args: &[Value]) -> FormulaResult<Value> {
    let n = try_value!(number_arg(args, 0, 0.0));
    Ok(Value::Number(n.floor()))
}

/// MOD(number, divisor); the result has the divisor's sign
pub fn fn_mod(args: &[Value]) -> FormulaResult<Value> {
    let n = try_value!(number_arg(args, 0, 0.0));
    let d = try_value!(number_arg(args, 1, 0.0));
    if d == 0.0 {
        return Ok(Value::Error(CellError::Div0));
    }
    Ok(Value::Number(n - d * (n / d).floor()))
}

pub fn fn_sqrt(args: &[Value]) -> FormulaResult<Value> {
    let n = try_value!(number_arg(args, 0, 0.0));
    if n < 0.0 {
        return Ok(Value::Error(CellError::Num));
    }
    Ok(Value::Number(n.sqrt()))
}

/// POWER(base, exponent), same as `base ^ exponent`
pub fn fn_power(args: &[Value]) -> FormulaResult<Value> {
    match args {
        [base, exponent] => binary(BinaryOperator::Power, base, exponent),
        _ => Ok(Value::Error(CellError::Value)),
    }
}

/// RAND(): uniform in `[0, 1)`
pub fn fn_rand(_args: &[Value]) -> FormulaResult<Value> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    Ok(Value::Number(rng.gen::<f64>()))
}
