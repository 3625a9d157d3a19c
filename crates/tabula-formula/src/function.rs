//! Function values and call arguments
//!
//! A [`Function`] is an ordinary [`Value`]: builtins are bound by name in an
//! [`crate::Environment`] and embedders can bind their own. Arguments arrive
//! unevaluated as [`Argument`] thunks, so a function decides what to evaluate
//! (IF evaluates one branch, reducers read a comparison as a predicate).

use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::ast::Expr;
use crate::context::Context;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::evaluate;
use crate::predicate::Predicate;
use crate::value::Value;

/// Signature of a function that receives its arguments as thunks
pub type DirectFn = dyn Fn(&[Argument<'_>], &dyn Context) -> FormulaResult<Value>;

/// Signature of a reducer: aggregate the entries of a source value matching a predicate
pub type ReducerFn = dyn Fn(&Predicate, &Value) -> FormulaResult<Value>;

/// How a function is invoked
#[derive(Clone)]
pub enum Callable {
    Direct(Arc<DirectFn>),
    /// Called as `F(source <op> operand)`, `F(source)` or `F(source, criteria)`
    Reducer(Arc<ReducerFn>),
}

/// A callable value
#[derive(Clone)]
pub struct Function {
    name: String,
    min_args: usize,
    max_args: Option<usize>,
    callable: Callable,
}

impl Function {
    /// A function taking `min_args..=max_args` arguments (`None` = unlimited)
    pub fn new<S, F>(name: S, min_args: usize, max_args: Option<usize>, f: F) -> Self
    where
        S: Into<String>,
        F: Fn(&[Argument<'_>], &dyn Context) -> FormulaResult<Value> + 'static,
    {
        Self {
            name: name.into(),
            min_args,
            max_args,
            callable: Callable::Direct(Arc::new(f)),
        }
    }

    /// A reducer taking one or two arguments
    pub fn reducer<S, F>(name: S, f: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Predicate, &Value) -> FormulaResult<Value> + 'static,
    {
        Self {
            name: name.into(),
            min_args: 1,
            max_args: Some(2),
            callable: Callable::Reducer(Arc::new(f)),
        }
    }

    /// A zero-argument function returning a fixed value
    pub fn constant<S: Into<String>>(name: S, value: Value) -> Self {
        Self::new(name, 0, Some(0), move |_, _| Ok(value.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_args(&self) -> usize {
        self.min_args
    }

    pub fn max_args(&self) -> Option<usize> {
        self.max_args
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn is_reducer(&self) -> bool {
        matches!(self.callable, Callable::Reducer(_))
    }

    /// Fail with [`FormulaError::ArgumentCount`] unless `actual` is accepted
    pub fn check_arity(&self, actual: usize) -> FormulaResult<()> {
        let too_many = self.max_args.map_or(false, |max| actual > max);
        if actual < self.min_args || too_many {
            return Err(FormulaError::ArgumentCount {
                function: self.name.clone(),
                expected: self.expected_args(),
                actual,
            });
        }
        Ok(())
    }

    fn expected_args(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }

    /// Invoke with unevaluated arguments
    pub fn call(&self, args: &[Argument<'_>], ctx: &dyn Context) -> FormulaResult<Value> {
        self.check_arity(args.len())?;
        trace!("calling {} with {} argument(s)", self.name, args.len());

        match &self.callable {
            Callable::Direct(f) => f(args, ctx),
            Callable::Reducer(f) => self.reduce(&**f, args, ctx),
        }
    }

    fn reduce(
        &self,
        f: &ReducerFn,
        args: &[Argument<'_>],
        ctx: &dyn Context,
    ) -> FormulaResult<Value> {
        match args {
            [single] => match single.try_as_predicate(ctx)? {
                Some((predicate, source)) => {
                    if let Value::Error(e) = source {
                        return Ok(Value::Error(e));
                    }
                    if let Predicate::Compare {
                        operand: Value::Error(e),
                        ..
                    } = predicate
                    {
                        return Ok(Value::Error(e));
                    }
                    f(&predicate, &source)
                }
                None => match single.evaluate(ctx)? {
                    Value::Error(e) => Ok(Value::Error(e)),
                    source => f(&Predicate::Any, &source),
                },
            },
            [source, criteria] => {
                let source = source.evaluate(ctx)?;
                if let Value::Error(e) = source {
                    return Ok(Value::Error(e));
                }
                let criteria = criteria.evaluate(ctx)?;
                if let Value::Error(e) = criteria {
                    return Ok(Value::Error(e));
                }
                f(&Predicate::from_criteria(&criteria), &source)
            }
            _ => Err(FormulaError::ArgumentCount {
                function: self.name.clone(),
                expected: self.expected_args(),
                actual: args.len(),
            }),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("reducer", &self.is_reducer())
            .finish()
    }
}

/// Functions are equal when they share a name and an implementation
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        let same_impl = match (&self.callable, &other.callable) {
            (Callable::Direct(a), Callable::Direct(b)) => Arc::ptr_eq(a, b),
            (Callable::Reducer(a), Callable::Reducer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_impl && self.name == other.name
    }
}

/// A call argument: an expression still to be evaluated, or a ready value
#[derive(Debug, Clone)]
pub enum Argument<'a> {
    Expr(&'a Expr),
    Value(Value),
}

impl<'a> Argument<'a> {
    /// Evaluate the argument against a context
    pub fn evaluate(&self, ctx: &dyn Context) -> FormulaResult<Value> {
        match self {
            Argument::Expr(expr) => evaluate(expr, ctx),
            Argument::Value(value) => Ok(value.clone()),
        }
    }

    /// The unevaluated expression, if any
    pub fn expr(&self) -> Option<&'a Expr> {
        match self {
            Argument::Expr(expr) => Some(*expr),
            Argument::Value(_) => None,
        }
    }

    /// Read a comparison argument (`A1:A9 > 2`) as a predicate over its left side
    ///
    /// Returns the predicate and the evaluated left operand, or `None` when
    /// the argument is not a comparison. When the left operand is an error
    /// value the right one is not evaluated and the predicate compares
    /// against that same error.
    pub fn try_as_predicate(
        &self,
        ctx: &dyn Context,
    ) -> FormulaResult<Option<(Predicate, Value)>> {
        let Some(Expr::Binary { op, left, right }) = self.expr() else {
            return Ok(None);
        };
        if !op.is_comparison() {
            return Ok(None);
        }

        let source = evaluate(left, ctx)?;
        let operand = if source.is_error() {
            source.clone()
        } else {
            evaluate(right, ctx)?
        };
        Ok(Some((Predicate::Compare { op: *op, operand }, source)))
    }
}

impl From<Value> for Argument<'_> {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

impl<'a> From<&'a Expr> for Argument<'a> {
    fn from(expr: &'a Expr) -> Self {
        Argument::Expr(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Environment;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use tabula_core::CellError;

    #[test]
    fn test_arity() {
        let f = Function::new("F", 1, Some(2), |_, _| Ok(Value::Blank));
        assert!(f.check_arity(1).is_ok());
        assert!(f.check_arity(2).is_ok());
        assert_eq!(
            f.check_arity(3),
            Err(FormulaError::ArgumentCount {
                function: "F".into(),
                expected: "1 to 2".into(),
                actual: 3,
            })
        );

        let g = Function::new("G", 1, None, |_, _| Ok(Value::Blank));
        assert!(g.check_arity(10).is_ok());
        assert!(g.check_arity(0).is_err());
    }

    #[test]
    fn test_constant() {
        let env = Environment::new();
        let one = Function::constant("one", Value::Number(1.0));
        assert_eq!(one.call(&[], &env).unwrap(), Value::Number(1.0));
        assert!(one.call(&[Argument::Value(Value::Blank)], &env).is_err());
    }

    #[test]
    fn test_arguments_are_lazy() {
        let env = Environment::new();
        let first = Function::new("FIRST", 1, None, |args, ctx| args[0].evaluate(ctx));

        // The second argument would fail to resolve if it were evaluated
        let expr = parse("FIRST(1, missing)").unwrap();
        let Expr::Call { args, .. } = &expr else {
            panic!("expected a call");
        };
        let args: Vec<Argument> = args.iter().map(Argument::from).collect();
        assert_eq!(first.call(&args, &env).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_try_as_predicate() {
        let env = Environment::new();
        let expr = parse("3 > 2").unwrap();
        let (predicate, source) = Argument::Expr(&expr)
            .try_as_predicate(&env)
            .unwrap()
            .unwrap();
        assert_eq!(source, Value::Number(3.0));
        assert!(predicate.matches(&Value::Number(5.0)));
        assert!(!predicate.matches(&Value::Number(1.0)));

        let plain = parse("3 + 2").unwrap();
        assert!(Argument::Expr(&plain).try_as_predicate(&env).unwrap().is_none());
        assert!(Argument::Value(Value::Number(1.0))
            .try_as_predicate(&env)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_reducer_forms() {
        let env = Environment::new();
        let count = Function::reducer("COUNTMATCH", |predicate, source| {
            let Value::Array(array) = source else {
                return Ok(Value::Error(CellError::Value));
            };
            Ok(Value::Number(
                array.values().filter(|v| predicate.matches(v)).count() as f64,
            ))
        });

        let values = Value::Array(crate::value::Array::from_rows(vec![vec![
            Value::Number(1.0),
            Value::Number(5.0),
            Value::from("a"),
        ]]));

        // Plain source: everything matches
        let args = [Argument::Value(values.clone())];
        assert_eq!(count.call(&args, &env).unwrap(), Value::Number(3.0));

        // Criteria form
        let args = [Argument::Value(values), Argument::Value(Value::from(">2"))];
        assert_eq!(count.call(&args, &env).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_function_equality() {
        let a = Function::constant("one", Value::Number(1.0));
        let b = Function::constant("one", Value::Number(1.0));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
