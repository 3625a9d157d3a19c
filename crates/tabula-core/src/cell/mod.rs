//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - A scalar cell value
//! - [`CellError`] - In-band spreadsheet error codes
//! - [`Position`] - A cell's location (e.g., "A1", "$B$2", "Sheet2!C3")
//! - [`Range`] - A rectangle of cells (e.g., "A1:B10")
//! - [`decode`], [`encode`] and [`offset`] - the A1 address codec

mod address;
mod value;

pub use address::{decode, encode, offset, quote_sheet_name, Position, Range, RangeCells};
pub use value::{format_number, parse_number, CellError, CellValue};
