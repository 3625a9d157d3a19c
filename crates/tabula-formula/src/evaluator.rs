//! Tree-walking formula evaluator
//!
//! [`evaluate`] maps an [`Expr`] to a [`Value`] against a [`Context`]. Storage
//! is only reached through the context's `resolve`, `at` and `range`.
//!
//! Spreadsheet errors are values: an operand that evaluates to an error is
//! returned unchanged (leftmost first) before any coercion happens, and a
//! failed coercion becomes the corresponding error value. `Err` is reserved
//! for structural failures such as an unbound name.

use log::trace;
use tabula_core::{CellError, Range};

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::context::Context;
use crate::error::{FormulaError, FormulaResult};
use crate::function::Argument;
use crate::value::{Array, Value};

/// Evaluate an expression
pub fn evaluate(expr: &Expr, ctx: &dyn Context) -> FormulaResult<Value> {
    match expr {
        // === Literals ===
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),

        // === Names and references ===
        Expr::Identifier(name) => ctx.resolve(name),

        Expr::CellRef(position) => {
            if !position.is_set() {
                return Ok(Value::Error(CellError::Ref));
            }
            ctx.at(position)
        }

        Expr::RangeRef { start, end } => {
            let range = Range::new(start.clone(), end.clone());
            if range.is_empty() {
                return Ok(Value::Error(CellError::Ref));
            }
            ctx.range(&range)
        }

        // === Operators ===
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            unary(*op, &value)
        }

        Expr::Binary { op, left, right } => {
            let left = evaluate(left, ctx)?;
            if left.is_error() {
                return Ok(left);
            }
            let right = evaluate(right, ctx)?;
            binary(*op, &left, &right)
        }

        // === Calls ===
        Expr::Call { callee, args } => call(callee, args, ctx),
    }
}

/// Apply a unary operator; arrays are mapped elementwise
pub fn unary(op: UnaryOperator, value: &Value) -> FormulaResult<Value> {
    match value {
        Value::Array(array) => Ok(Value::Array(array.apply(|v| unary(op, v))?)),
        Value::Error(e) => Ok(Value::Error(*e)),
        Value::Number(n) => Ok(Value::Number(match op {
            UnaryOperator::Plus => *n,
            UnaryOperator::Negate => -n,
        })),
        _ => Ok(Value::Error(CellError::Value)),
    }
}

/// Apply a binary operator to evaluated operands
///
/// When either side is an array the operator is lifted elementwise, a
/// scalar acting as a 1x1 array broadcast over the other side.
pub fn binary(op: BinaryOperator, left: &Value, right: &Value) -> FormulaResult<Value> {
    if let Value::Error(e) = left {
        return Ok(Value::Error(*e));
    }

    match (left, right) {
        (Value::Array(l), Value::Array(r)) => Ok(Value::Array(
            l.apply_with(r, |a, b| binary(op, a, b))?,
        )),
        (Value::Array(l), scalar) => Ok(Value::Array(
            l.apply_with(&Array::scalar(scalar.clone()), |a, b| binary(op, a, b))?,
        )),
        (scalar, Value::Array(r)) => Ok(Value::Array(
            Array::scalar(scalar.clone()).apply_with(r, |a, b| binary(op, a, b))?,
        )),
        (_, Value::Error(e)) => Ok(Value::Error(*e)),
        _ => Ok(scalar_binary(op, left, right)),
    }
}

fn scalar_binary(op: BinaryOperator, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Power => arithmetic(op, left, right),
        BinaryOperator::Concat => concat(left, right),
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => compare(op, left, right),
    }
}

fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> Value {
    let (l, r) = match (left.to_number(), right.to_number()) {
        (Ok(l), Ok(r)) => (l, r),
        (Err(e), _) | (_, Err(e)) => return Value::Error(e),
    };

    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Value::Error(CellError::Div0);
            }
            l / r
        }
        BinaryOperator::Power => l.powf(r),
        _ => return Value::Error(CellError::Value),
    };

    if result.is_finite() {
        Value::Number(result)
    } else {
        Value::Error(CellError::Num)
    }
}

fn concat(left: &Value, right: &Value) -> Value {
    match (left.to_text(), right.to_text()) {
        (Ok(l), Ok(r)) => Value::Text(l + &r),
        (Err(e), _) | (_, Err(e)) => Value::Error(e),
    }
}

/// Compare two values with a comparison operator
///
/// Built from the two primitives `equal` and `less`; values of different
/// variants yield `#VALUE!`. Non-comparison operators also yield `#VALUE!`.
pub fn compare(op: BinaryOperator, left: &Value, right: &Value) -> Value {
    let result = match op {
        BinaryOperator::Equal => left.equal(right),
        BinaryOperator::NotEqual => left.equal(right).map(|eq| !eq),
        BinaryOperator::LessThan => left.less(right),
        BinaryOperator::LessEqual => match left.equal(right) {
            Ok(true) => Ok(true),
            Ok(false) => left.less(right),
            Err(e) => Err(e),
        },
        BinaryOperator::GreaterEqual => match left.equal(right) {
            Ok(true) => Ok(true),
            Ok(false) => left.less(right).map(|lt| !lt),
            Err(e) => Err(e),
        },
        BinaryOperator::GreaterThan => match left.equal(right) {
            Ok(true) => Ok(false),
            Ok(false) => left.less(right).map(|lt| !lt),
            Err(e) => Err(e),
        },
        _ => return Value::Error(CellError::Value),
    };

    match result {
        Ok(b) => Value::Boolean(b),
        Err(e) => {
            trace!("comparison {} failed: {}", op.symbol(), e);
            Value::Error(CellError::Value)
        }
    }
}

/// Resolve the callee and invoke it with unevaluated arguments
fn call(callee: &Expr, args: &[Expr], ctx: &dyn Context) -> FormulaResult<Value> {
    let target = match callee {
        Expr::Identifier(name) => match ctx.resolve(name) {
            Ok(value) => value,
            Err(FormulaError::UndefinedName(_)) => {
                trace!("unknown function {}", name);
                return Ok(Value::Error(CellError::Name));
            }
            Err(e) => return Err(e),
        },
        other => evaluate(other, ctx)?,
    };

    match target {
        Value::Function(function) => {
            let args: Vec<Argument<'_>> = args.iter().map(Argument::Expr).collect();
            function.call(&args, ctx)
        }
        Value::Error(e) => Ok(Value::Error(e)),
        _ => Err(FormulaError::NotCallable(callee.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Environment;
    use crate::function::Function;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use tabula_core::Position;

    fn eval_in(formula: &str, env: &Environment) -> FormulaResult<Value> {
        let expr = parse(formula)?;
        evaluate(&expr, env)
    }

    fn eval(formula: &str) -> FormulaResult<Value> {
        eval_in(formula, &Environment::builtins())
    }

    fn numbers(rows: &[&[f64]]) -> Value {
        Value::Array(Array::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|n| Value::Number(*n)).collect())
                .collect(),
        ))
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("=42").unwrap(), Value::Number(42.0));
        assert_eq!(eval("3.5").unwrap(), Value::Number(3.5));
        assert_eq!(eval("\"hi\"").unwrap(), Value::from("hi"));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("1+2").unwrap(), Value::Number(3.0));
        assert_eq!(eval("10-4").unwrap(), Value::Number(6.0));
        assert_eq!(eval("3*4").unwrap(), Value::Number(12.0));
        assert_eq!(eval("10/4").unwrap(), Value::Number(2.5));
        assert_eq!(eval("2^10").unwrap(), Value::Number(1024.0));
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval("1+1*2").unwrap(), Value::Number(3.0));
        assert_eq!(eval("(1+1)*2").unwrap(), Value::Number(4.0));
        assert_eq!(eval("2^3^2").unwrap(), Value::Number(512.0));
        assert_eq!(eval("1+2&3").unwrap(), Value::from("33"));
    }

    #[test]
    fn test_evaluate_unary() {
        assert_eq!(eval("-5").unwrap(), Value::Number(-5.0));
        assert_eq!(eval("+5").unwrap(), Value::Number(5.0));
        assert_eq!(eval("--5").unwrap(), Value::Number(5.0));
        assert_eq!(eval("-\"a\"").unwrap(), Value::Error(CellError::Value));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1/0").unwrap(), Value::Error(CellError::Div0));
        assert_eq!(eval("0/0").unwrap(), Value::Error(CellError::Div0));
    }

    #[test]
    fn test_power_overflow() {
        assert_eq!(eval("10^400").unwrap(), Value::Error(CellError::Num));
        assert_eq!(eval("(-8)^0.5").unwrap(), Value::Error(CellError::Num));
    }

    #[test]
    fn test_text_coercion_in_arithmetic() {
        assert_eq!(eval("\"2\"+3").unwrap(), Value::Number(5.0));
        assert_eq!(eval("\"two\"+3").unwrap(), Value::Error(CellError::Na));
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(eval("\"a\"&\"b\"").unwrap(), Value::from("ab"));
        assert_eq!(eval("\"n=\"&1.5").unwrap(), Value::from("n=1.5"));
        assert_eq!(eval("1&2").unwrap(), Value::from("12"));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("1<2").unwrap(), Value::Boolean(true));
        assert_eq!(eval("2<=2").unwrap(), Value::Boolean(true));
        assert_eq!(eval("3>2").unwrap(), Value::Boolean(true));
        assert_eq!(eval("2>2").unwrap(), Value::Boolean(false));
        assert_eq!(eval("2>=3").unwrap(), Value::Boolean(false));
        assert_eq!(eval("1=1").unwrap(), Value::Boolean(true));
        assert_eq!(eval("1<>1").unwrap(), Value::Boolean(false));
        assert_eq!(eval("\"abc\"=\"ABC\"").unwrap(), Value::Boolean(true));
        assert_eq!(eval("\"a\"<\"b\"").unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_comparison_across_variants_is_value_error() {
        assert_eq!(eval("1=\"1\"").unwrap(), Value::Error(CellError::Value));
        assert_eq!(eval("1<\"a\"").unwrap(), Value::Error(CellError::Value));
    }

    #[test]
    fn test_error_operand_short_circuits() {
        // The right operand is never evaluated once the left is an error
        assert_eq!(eval("NA()+missing").unwrap(), Value::Error(CellError::Na));
        assert_eq!(eval("1/0&\"x\"").unwrap(), Value::Error(CellError::Div0));

        // Leftmost error wins
        assert_eq!(eval("NA()+1/0").unwrap(), Value::Error(CellError::Na));
        assert_eq!(eval("1+NA()").unwrap(), Value::Error(CellError::Na));
        assert_eq!(eval("(1/0)=NA()").unwrap(), Value::Error(CellError::Div0));
    }

    #[test]
    fn test_unbound_identifier() {
        assert_eq!(
            eval("nothing + 1"),
            Err(FormulaError::UndefinedName("nothing".into()))
        );
    }

    #[test]
    fn test_unknown_function_is_name_error() {
        assert_eq!(eval("NOPE(1)").unwrap(), Value::Error(CellError::Name));
    }

    #[test]
    fn test_not_callable() {
        let mut env = Environment::new();
        env.set("x", Value::Number(1.0));
        assert_eq!(
            eval_in("x(1)", &env),
            Err(FormulaError::NotCallable("x".into()))
        );

        env.set("broken", Value::Error(CellError::Ref));
        assert_eq!(
            eval_in("broken(1)", &env).unwrap(),
            Value::Error(CellError::Ref)
        );
    }

    #[test]
    fn test_argument_count() {
        let result = eval("ABS(1, 2)");
        assert!(matches!(result, Err(FormulaError::ArgumentCount { .. })));
    }

    #[test]
    fn test_user_function() {
        let mut env = Environment::builtins();
        env.define(Function::new("TWICE", 1, Some(1), |args, ctx| {
            let value = args[0].evaluate(ctx)?;
            binary(BinaryOperator::Multiply, &value, &Value::Number(2.0))
        }));
        assert_eq!(eval_in("TWICE(3)+1", &env).unwrap(), Value::Number(7.0));
    }

    #[test]
    fn test_references_need_a_cell_context() {
        assert!(matches!(eval("A1"), Err(FormulaError::NotAvailable(_))));
        assert!(matches!(eval("A1:B2"), Err(FormulaError::NotAvailable(_))));
    }

    #[test]
    fn test_unset_reference_is_ref_error() {
        let env = Environment::new();
        let expr = Expr::CellRef(Position::default());
        assert_eq!(evaluate(&expr, &env).unwrap(), Value::Error(CellError::Ref));

        let shifted = parse("A1+1").unwrap().offset(-1, 0);
        assert_eq!(evaluate(&shifted, &env).unwrap(), Value::Error(CellError::Ref));
    }

    #[test]
    fn test_array_lifting() {
        let mut env = Environment::new();
        env.set("xs", numbers(&[&[1.0, 2.0], &[3.0, 4.0]]));
        env.set("col", numbers(&[&[10.0], &[20.0]]));

        assert_eq!(
            eval_in("xs*2", &env).unwrap(),
            numbers(&[&[2.0, 4.0], &[6.0, 8.0]])
        );
        assert_eq!(
            eval_in("-xs", &env).unwrap(),
            numbers(&[&[-1.0, -2.0], &[-3.0, -4.0]])
        );
        assert_eq!(
            eval_in("xs+col", &env).unwrap(),
            numbers(&[&[11.0, 12.0], &[23.0, 24.0]])
        );

        let Value::Array(flags) = eval_in("xs>2", &env).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(flags.get(0, 0), Some(&Value::Boolean(false)));
        assert_eq!(flags.get(1, 1), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_array_elements_keep_their_errors() {
        let mut env = Environment::new();
        env.set("xs", numbers(&[&[1.0, 0.0]]));

        let Value::Array(result) = eval_in("1/xs", &env).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(result.get(0, 0), Some(&Value::Number(1.0)));
        assert_eq!(result.get(0, 1), Some(&Value::Error(CellError::Div0)));
    }

    #[test]
    fn test_compare_primitives() {
        let one = Value::Number(1.0);
        let two = Value::Number(2.0);
        assert_eq!(
            compare(BinaryOperator::GreaterEqual, &two, &one),
            Value::Boolean(true)
        );
        assert_eq!(
            compare(BinaryOperator::LessEqual, &two, &one),
            Value::Boolean(false)
        );
        // Blank against a number is #VALUE! for every comparison operator
        for op in [
            BinaryOperator::Equal,
            BinaryOperator::NotEqual,
            BinaryOperator::LessThan,
            BinaryOperator::LessEqual,
            BinaryOperator::GreaterThan,
            BinaryOperator::GreaterEqual,
        ] {
            assert_eq!(
                compare(op, &Value::Blank, &one),
                Value::Error(CellError::Value)
            );
        }
        assert_eq!(
            compare(BinaryOperator::Equal, &Value::Blank, &Value::Blank),
            Value::Boolean(true)
        );
        assert_eq!(
            compare(BinaryOperator::Add, &one, &two),
            Value::Error(CellError::Value)
        );
    }
}
