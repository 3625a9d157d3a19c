//! Builtin function library
//!
//! [`register_builtins`] binds every builtin into an [`Environment`] under its
//! upper-case name. Most builtins are eager: their arguments are evaluated
//! first and errors pass through as values. IF and IFERROR are lazy and see
//! the raw argument thunks. COUNTIF, SUMIF and AVERAGEIF are reducers.

/// Unwrap a coercion result, returning the error as a value on failure
macro_rules! try_value {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => return Ok($crate::value::Value::Error(e)),
        }
    };
}

pub mod criteria;
pub mod date;
pub mod info;
pub mod logical;
pub mod math;
pub mod reduce;
pub mod text;

use tabula_core::CellError;

use crate::context::{Context, Environment};
use crate::error::FormulaResult;
use crate::function::{Argument, Function};
use crate::value::Value;

/// Builtin taking evaluated arguments
pub type EagerImpl = fn(&[Value]) -> FormulaResult<Value>;

/// Builtin taking argument thunks
pub type LazyImpl = fn(&[Argument<'_>], &dyn Context) -> FormulaResult<Value>;

/// Bind the whole builtin library
pub fn register_builtins(env: &mut Environment<'_>) {
    register_math_functions(env);
    register_logical_functions(env);
    register_text_functions(env);
    register_info_functions(env);
    register_date_functions(env);
    register_reducers(env);
}

fn register_math_functions(env: &mut Environment<'_>) {
    env.define(eager("SUM", 1, None, math::fn_sum));
    env.define(eager("AVERAGE", 1, None, math::fn_average));
    env.define(eager("MIN", 1, None, math::fn_min));
    env.define(eager("MAX", 1, None, math::fn_max));
    env.define(eager("COUNT", 1, None, math::fn_count));
    env.define(eager("COUNTA", 1, None, math::fn_counta));
    env.define(eager("ABS", 1, Some(1), math::fn_abs));
    env.define(eager("ROUND", 1, Some(2), math::fn_round));
    env.define(eager("INT", 1, Some(1), math::fn_int));
    env.define(eager("MOD", 2, Some(2), math::fn_mod));
    env.define(eager("SQRT", 1, Some(1), math::fn_sqrt));
    env.define(eager("POWER", 2, Some(2), math::fn_power));
    env.define(eager("RAND", 0, Some(0), math::fn_rand));
}

fn register_logical_functions(env: &mut Environment<'_>) {
    env.define(lazy("IF", 2, Some(3), logical::fn_if));
    env.define(eager("AND", 1, None, logical::fn_and));
    env.define(eager("OR", 1, None, logical::fn_or));
    env.define(eager("NOT", 1, Some(1), logical::fn_not));
    env.define(lazy("IFERROR", 2, Some(2), logical::fn_iferror));
    env.set("TRUE", Value::Boolean(true));
    env.set("FALSE", Value::Boolean(false));
}

fn register_text_functions(env: &mut Environment<'_>) {
    env.define(eager("CONCAT", 1, None, text::fn_concat));
    env.define(eager("LEN", 1, Some(1), text::fn_len));
    env.define(eager("UPPER", 1, Some(1), text::fn_upper));
    env.define(eager("LOWER", 1, Some(1), text::fn_lower));
    env.define(eager("LEFT", 1, Some(2), text::fn_left));
    env.define(eager("RIGHT", 1, Some(2), text::fn_right));
    env.define(eager("TRIM", 1, Some(1), text::fn_trim));
}

fn register_info_functions(env: &mut Environment<'_>) {
    env.define(eager("TYPEOF", 1, Some(1), info::fn_typeof));
    env.define(eager("ISBLANK", 1, Some(1), info::fn_isblank));
    env.define(eager("ISNUMBER", 1, Some(1), info::fn_isnumber));
    env.define(eager("ISTEXT", 1, Some(1), info::fn_istext));
    env.define(eager("ISERROR", 1, Some(1), info::fn_iserror));
    env.define(eager("NA", 0, Some(0), info::fn_na));
    env.define(eager("ROWS", 1, Some(1), info::fn_rows));
    env.define(eager("COLUMNS", 1, Some(1), info::fn_columns));
    env.define(eager("GET", 2, Some(2), info::fn_get));
}

fn register_date_functions(env: &mut Environment<'_>) {
    env.define(eager("DATE", 3, Some(3), date::fn_date));
    env.define(eager("NOW", 0, Some(0), date::fn_now));
}

fn register_reducers(env: &mut Environment<'_>) {
    env.define(Function::reducer("COUNTIF", reduce::fn_countif));
    env.define(Function::reducer("SUMIF", reduce::fn_sumif));
    env.define(Function::reducer("AVERAGEIF", reduce::fn_averageif));
}

fn eager(
    name: &str,
    min_args: usize,
    max_args: Option<usize>,
    implementation: EagerImpl,
) -> Function {
    Function::new(name, min_args, max_args, move |args, ctx| {
        let values = evaluate_all(args, ctx)?;
        implementation(&values)
    })
}

fn lazy(
    name: &str,
    min_args: usize,
    max_args: Option<usize>,
    implementation: LazyImpl,
) -> Function {
    Function::new(name, min_args, max_args, implementation)
}

// === Argument helpers ===

/// Evaluate every argument in order
pub fn evaluate_all(args: &[Argument<'_>], ctx: &dyn Context) -> FormulaResult<Vec<Value>> {
    args.iter().map(|arg| arg.evaluate(ctx)).collect()
}

/// Arguments with arrays expanded into their elements
pub fn flatten(values: &[Value]) -> impl Iterator<Item = &Value> {
    values.iter().flat_map(elements)
}

fn elements(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(array) => Box::new(array.values()),
        other => Box::new(std::iter::once(other)),
    }
}

/// The numbers among the arguments; the first error wins, anything else is skipped
pub fn numbers(values: &[Value]) -> Result<Vec<f64>, CellError> {
    let mut result = Vec::new();
    for value in flatten(values) {
        match value {
            Value::Number(n) => result.push(*n),
            Value::Error(e) => return Err(*e),
            _ => {}
        }
    }
    Ok(result)
}

/// A single numeric argument, or `default` when it is absent
pub fn number_arg(values: &[Value], index: usize, default: f64) -> Result<f64, CellError> {
    match values.get(index) {
        Some(value) => value.to_number(),
        None => Ok(default),
    }
}

/// A single text argument
pub fn text_arg(values: &[Value], index: usize) -> Result<String, CellError> {
    match values.get(index) {
        Some(value) => value.to_text(),
        None => Err(CellError::Value),
    }
}
