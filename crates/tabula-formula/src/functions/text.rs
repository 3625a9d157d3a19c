//! Text functions

use tabula_core::CellError;

use super::{flatten, number_arg, text_arg};
use crate::error::FormulaResult;
use crate::value::Value;

/// CONCAT(values...): arrays contribute every element
pub fn fn_concat(args: &[Value]) -> FormulaResult<Value> {
    let mut result = String::new();
    for value in flatten(args) {
        result.push_str(&try_value!(value.to_text()));
    }
    Ok(Value::Text(result))
}

/// LEN(text): length in characters
pub fn fn_len(args: &[Value]) -> FormulaResult<Value> {
    let text = try_value!(text_arg(args, 0));
    Ok(Value::Number(text.chars().count() as f64))
}

pub fn fn_upper(args: &[Value]) -> FormulaResult<Value> {
    let text = try_value!(text_arg(args, 0));
    Ok(Value::Text(text.to_uppercase()))
}

pub fn fn_lower(args: &[Value]) -> FormulaResult<Value> {
    let text = try_value!(text_arg(args, 0));
    Ok(Value::Text(text.to_lowercase()))
}

/// LEFT(text, [count = 1])
pub fn fn_left(args: &[Value]) -> FormulaResult<Value> {
    let text = try_value!(text_arg(args, 0));
    let count = try_value!(char_count(args));
    Ok(Value::Text(text.chars().take(count).collect()))
}

/// RIGHT(text, [count = 1])
pub fn fn_right(args: &[Value]) -> FormulaResult<Value> {
    let text = try_value!(text_arg(args, 0));
    let count = try_value!(char_count(args));
    let skip = text.chars().count().saturating_sub(count);
    Ok(Value::Text(text.chars().skip(skip).collect()))
}

/// TRIM(text): strip the ends and collapse inner runs of whitespace
pub fn fn_trim(args: &[Value]) -> FormulaResult<Value> {
    let text = try_value!(text_arg(args, 0));
    Ok(Value::Text(text.split_whitespace().collect::<Vec<_>>().join(" ")))
}

fn char_count(args: &[Value]) -> Result<usize, CellError> {
    let count = number_arg(args, 1, 1.0)?;
    if count < 0.0 {
        return Err(CellError::Value);
    }
    Ok(count.trunc() as usize)
}

#[cfg(test)]
mod tests {
    use crate::context::Environment;
    use crate::evaluator::evaluate;
    use crate::parser::parse;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use tabula_core::CellError;

    fn eval(formula: &str) -> Value {
        let env = Environment::builtins();
        evaluate(&parse(formula).unwrap(), &env).unwrap()
    }

    #[test]
    fn test_concat() {
        assert_eq!(eval("CONCAT(\"a\", 1, TRUE)"), Value::from("a1TRUE"));
        assert_eq!(eval("CONCAT(\"a\", NA())"), Value::Error(CellError::Na));
    }

    #[test]
    fn test_len_case() {
        assert_eq!(eval("LEN(\"héllo\")"), Value::Number(5.0));
        assert_eq!(eval("LEN(123)"), Value::Number(3.0));
        assert_eq!(eval("UPPER(\"abc\")"), Value::from("ABC"));
        assert_eq!(eval("LOWER(\"ABC\")"), Value::from("abc"));
    }

    #[test]
    fn test_left_right() {
        assert_eq!(eval("LEFT(\"hello\", 2)"), Value::from("he"));
        assert_eq!(eval("LEFT(\"hello\")"), Value::from("h"));
        assert_eq!(eval("RIGHT(\"hello\", 3)"), Value::from("llo"));
        assert_eq!(eval("RIGHT(\"hi\", 10)"), Value::from("hi"));
        assert_eq!(eval("LEFT(\"hi\", -1)"), Value::Error(CellError::Value));
    }

    #[test]
    fn test_trim() {
        assert_eq!(eval("TRIM(\"  a   b  \")"), Value::from("a b"));
    }
}
