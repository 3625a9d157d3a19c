//! # tabula-core
//!
//! Core data structures for the tabula formula engine.
//!
//! This crate provides the fundamental types shared by the formula front end
//! and any storage engine that hosts it:
//! - [`Position`] and [`Range`] - Cell addressing, with the A1 codec
//!   ([`decode`], [`encode`], [`offset`])
//! - [`CellValue`] and [`CellError`] - Scalar cell values and error codes
//! - [`View`], [`ViewMut`] and [`Book`] - The addressable-view boundary
//! - [`Sheet`] and [`Workbook`] - An in-memory implementation of that boundary
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::{Book, CellValue, Position, View, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_value("A1", 42.0).unwrap();
//! sheet.set_formula("A2", "=A1*2").unwrap();
//!
//! let view = workbook.active_sheet().unwrap();
//! let cell = view.cell(&Position::parse("A1").unwrap()).unwrap();
//! assert_eq!(cell.value, CellValue::Number(42.0));
//! ```

pub mod cell;
pub mod error;
pub mod sheet;
pub mod view;
pub mod workbook;

// Re-exports for convenience
pub use cell::{
    decode, encode, format_number, offset, parse_number, quote_sheet_name, CellError, CellValue,
    Position, Range, RangeCells,
};
pub use error::{Error, Result};
pub use sheet::Sheet;
pub use view::{Book, Cell, View, ViewMut};
pub use workbook::Workbook;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
