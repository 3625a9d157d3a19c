//! Prelude module - common imports for tabula users
//!
//! ```rust
//! use tabula::prelude::*;
//! ```

pub use crate::{
    // Formula evaluation
    evaluate,
    parse,
    // Cell types
    Book,
    CellError,
    CellValue,
    Context,
    Environment,
    // Error types
    Error,
    Expr,
    FormulaError,
    FormulaResult,
    Position,
    Range,
    Result,
    ScopeStack,
    Sheet,
    SheetScope,
    Value,
    View,
    Workbook,
    WorkbookEvaluationExt,
    WorkbookScope,
};
