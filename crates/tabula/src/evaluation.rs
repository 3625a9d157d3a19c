//! Workbook-level formula evaluation
//!
//! # Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_value("A1", 10.0).unwrap();
//! sheet.set_value("A2", 20.0).unwrap();
//! sheet.set_formula("A3", "=A1+A2").unwrap();
//!
//! assert_eq!(workbook.evaluate_cell("A3").unwrap(), Value::Number(30.0));
//! assert_eq!(
//!     workbook.evaluate_formula("=A3/A1").unwrap(),
//!     Value::Number(3.0)
//! );
//! ```

use tabula_core::{Book, Position};
use tabula_formula::{evaluate, parse, Context, Environment, FormulaResult, Value, WorkbookScope};

/// Extension trait evaluating formulas against a [`Book`] with the builtin library
pub trait WorkbookEvaluationExt {
    /// Parse and evaluate formula text; unqualified references use the active sheet
    fn evaluate_formula(&self, formula: &str) -> FormulaResult<Value>;

    /// Evaluate formula text with extra bindings layered over the builtins
    fn evaluate_formula_with(
        &self,
        formula: &str,
        bindings: &Environment<'_>,
    ) -> FormulaResult<Value>;

    /// The value of one cell (`A1` or `Sheet!A1`), evaluating it if it holds a formula
    fn evaluate_cell(&self, address: &str) -> FormulaResult<Value>;
}

impl<B: Book> WorkbookEvaluationExt for B {
    fn evaluate_formula(&self, formula: &str) -> FormulaResult<Value> {
        let expr = parse(formula)?;
        let builtins = Environment::builtins();
        let scope = WorkbookScope::with_parent(self, &builtins);
        evaluate(&expr, &scope)
    }

    fn evaluate_formula_with(
        &self,
        formula: &str,
        bindings: &Environment<'_>,
    ) -> FormulaResult<Value> {
        let expr = parse(formula)?;
        let builtins = Environment::builtins();
        let layered = Layered {
            bindings,
            fallback: &builtins,
        };
        let scope = WorkbookScope::with_parent(self, &layered);
        evaluate(&expr, &scope)
    }

    fn evaluate_cell(&self, address: &str) -> FormulaResult<Value> {
        let position = Position::parse(address)?;
        let builtins = Environment::builtins();
        let scope = WorkbookScope::with_parent(self, &builtins);
        scope.at(&position)
    }
}

/// Names from `bindings` first, then `fallback`
struct Layered<'a, 'p> {
    bindings: &'a Environment<'p>,
    fallback: &'a Environment<'a>,
}

impl Context for Layered<'_, '_> {
    fn resolve(&self, name: &str) -> FormulaResult<Value> {
        match self.bindings.get(name) {
            Some(value) => Ok(value.clone()),
            None => self.fallback.resolve(name),
        }
    }

    fn at(&self, position: &Position) -> FormulaResult<Value> {
        self.bindings.at(position)
    }

    fn range(&self, range: &tabula_core::Range) -> FormulaResult<Value> {
        self.bindings.range(range)
    }
}
