//! # tabula-formula
//!
//! Formula language front end and evaluator for tabula.
//!
//! This crate provides:
//! - Lexing and Pratt parsing (text → [`Expr`])
//! - Evaluation against a resolution [`Context`] (`Expr` → [`Value`])
//! - Nested contexts: [`Environment`], [`SheetScope`], [`WorkbookScope`] and
//!   the push/pop [`ScopeStack`]
//! - A builtin function library bound by [`Environment::builtins`]
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::Workbook;
//! use tabula_formula::{evaluate, parse, Environment, Value, WorkbookScope};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_value("A1", 2).unwrap();
//! sheet.set_value("A2", 3).unwrap();
//!
//! let env = Environment::builtins();
//! let scope = WorkbookScope::with_parent(&workbook, &env);
//!
//! let expr = parse("=SUM(A1:A2) * 2").unwrap();
//! assert_eq!(evaluate(&expr, &scope).unwrap(), Value::Number(10.0));
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod predicate;
pub mod token;
pub mod value;

pub use ast::{BinaryOperator, Expr, Precedence, UnaryOperator};
pub use context::{
    assign, Context, Environment, ScopeGuard, ScopeStack, SheetScope, Visited, WorkbookScope,
};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::evaluate;
pub use function::{Argument, Callable, Function};
pub use lexer::{Lexer, LexerMode};
pub use parser::{parse, parse_with_options, ParseOptions, Parser};
pub use predicate::Predicate;
pub use token::{Token, TokenKind};
pub use value::{Array, Object, Value, ValueKind};
