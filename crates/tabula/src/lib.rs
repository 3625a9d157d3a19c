//! # tabula
//!
//! A spreadsheet formula language for Rust.
//!
//! Tabula parses formulas such as `=SUM(Data!A1:A9) / COUNT(Data!A1:A9)` and
//! evaluates them against any grid that implements the [`View`] and [`Book`]
//! traits.
//!
//! ## Features
//!
//! - A1 addressing with absolute markers and quoted sheet names
//! - Pratt parser with spreadsheet operator precedence
//! - Values with spreadsheet coercion and in-band errors (`#DIV/0!`, `#N/A`, ...)
//! - Nested resolution contexts: environments, sheets, workbooks and a scope stack
//! - Formula cells evaluated on lookup, with circular reference detection
//! - A builtin function library, including criteria reducers (COUNTIF, SUMIF)
//!
//! ## Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_value("A1", 3.0).unwrap();
//! sheet.set_value("A2", 4.0).unwrap();
//! sheet.set_formula("A3", "=SQRT(A1^2 + A2^2)").unwrap();
//!
//! let builtins = Environment::builtins();
//! let scope = WorkbookScope::with_parent(&workbook, &builtins);
//! let expr = parse("A3 * 2").unwrap();
//! assert_eq!(evaluate(&expr, &scope).unwrap(), Value::Number(10.0));
//! ```

pub mod evaluation;
pub mod prelude;

pub use evaluation::WorkbookEvaluationExt;

// Re-export core types
pub use tabula_core::{
    decode, encode, offset, quote_sheet_name, Book, Cell, CellError, CellValue, Error, Position,
    Range, Result, Sheet, View, ViewMut, Workbook, MAX_SHEET_NAME_LEN,
};

// Re-export formula types
pub use tabula_formula::{
    assign, evaluate, parse, parse_with_options, Argument, Array, BinaryOperator, Context,
    Environment, Expr, FormulaError, FormulaResult, Function, Lexer, LexerMode, Object,
    ParseOptions, Predicate, ScopeGuard, ScopeStack, SheetScope, Token, TokenKind,
    UnaryOperator, Value, ValueKind, WorkbookScope,
};

/// Formula crate modules, for lower-level access
pub mod formula {
    pub use tabula_formula::*;
}
