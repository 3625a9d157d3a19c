//! Conditional aggregates
//!
//! Each reducer receives a predicate and a source value. They accept either
//! a comparison over the source (`COUNTIF(A1:A9 > 2)`) or a source and a
//! criteria value (`COUNTIF(A1:A9, ">2")`).

use tabula_core::CellError;

use super::flatten;
use crate::error::FormulaResult;
use crate::predicate::Predicate;
use crate::value::Value;

fn matching<'v>(predicate: &'v Predicate, source: &'v Value) -> impl Iterator<Item = &'v Value> {
    flatten(std::slice::from_ref(source)).filter(move |value| predicate.matches(value))
}

/// Numbers among the matching entries; an error entry that matches wins
fn matching_numbers(predicate: &Predicate, source: &Value) -> Result<Vec<f64>, CellError> {
    let mut result = Vec::new();
    for value in matching(predicate, source) {
        match value {
            Value::Number(n) => result.push(*n),
            Value::Error(e) => return Err(*e),
            _ => {}
        }
    }
    Ok(result)
}

/// COUNTIF: how many entries match
pub fn fn_countif(predicate: &Predicate, source: &Value) -> FormulaResult<Value> {
    Ok(Value::Number(matching(predicate, source).count() as f64))
}

/// SUMIF: total of the matching numbers
pub fn fn_sumif(predicate: &Predicate, source: &Value) -> FormulaResult<Value> {
    let values = try_value!(matching_numbers(predicate, source));
    Ok(Value::Number(values.iter().sum()))
}

/// AVERAGEIF: mean of the matching numbers, `#DIV/0!` when there are none
pub fn fn_averageif(predicate: &Predicate, source: &Value) -> FormulaResult<Value> {
    let values = try_value!(matching_numbers(predicate, source));
    if values.is_empty() {
        return Ok(Value::Error(CellError::Div0));
    }
    Ok(Value::Number(values.iter().sum::<f64>() / values.len() as f64))
}
