//! The addressable-view boundary
//!
//! Formula evaluation never touches storage directly. A grid is consumed
//! through [`View`] (one sheet), [`ViewMut`] (write access escalated from a
//! view) and [`Book`] (a named collection of views).

use crate::cell::{CellValue, Position, Range};
use crate::error::Result;

/// A stored cell as seen through a [`View`]
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Display string of the cell
    pub display: String,
    /// Parsed scalar value
    pub value: CellValue,
    /// Formula text (without the leading `=`), if the cell holds one
    pub formula: Option<String>,
}

impl Cell {
    /// A plain value cell
    pub fn new(value: CellValue) -> Self {
        Self {
            display: value.to_string(),
            value,
            formula: None,
        }
    }

    /// A formula cell; its value is produced by evaluating `formula`
    pub fn with_formula<S: Into<String>>(formula: S) -> Self {
        let formula = formula.into();
        Self {
            display: format!("={}", formula),
            value: CellValue::Blank,
            formula: Some(formula),
        }
    }

    /// Check if the cell holds a formula
    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }
}

/// Read access to one sheet of cells
pub trait View {
    /// Name of the sheet behind this view
    fn name(&self) -> &str;

    /// Look up a cell; positions without stored data are `None`
    fn cell(&self, position: &Position) -> Option<Cell>;

    /// The occupied rectangle, `(0,0)-(0,0)` for an empty view
    fn bounds(&self) -> Range;

    /// Iterate the occupied rectangle row by row, missing cells as Blank
    fn rows(&self) -> Box<dyn Iterator<Item = Vec<CellValue>> + '_> {
        let bounds = self.bounds();
        if bounds.is_empty() {
            return Box::new(std::iter::empty());
        }

        let bounds = bounds.normalized();
        Box::new((bounds.start.row..=bounds.end.row).map(move |row| {
            (bounds.start.column..=bounds.end.column)
                .map(|column| {
                    self.cell(&Position::new(row, column))
                        .map(|cell| cell.value)
                        .unwrap_or_default()
                })
                .collect()
        }))
    }

    /// Escalate to write access; fails when the view is read-only
    fn mutable(&mut self) -> Result<&mut dyn ViewMut>;
}

/// Write access to one sheet of cells
pub trait ViewMut {
    /// Store a scalar value, replacing any formula
    fn set_value(&mut self, position: &Position, value: CellValue) -> Result<()>;

    /// Store formula text (a leading `=` is optional)
    fn set_formula(&mut self, position: &Position, formula: &str) -> Result<()>;

    /// Remove a cell
    fn clear(&mut self, position: &Position) -> Result<()>;
}

/// A collection of named views with one active sheet
pub trait Book {
    /// Look up a sheet by name (case-insensitive)
    fn sheet(&self, name: &str) -> Option<&dyn View>;

    /// Mutable lookup of a sheet by name (case-insensitive)
    fn sheet_mut(&mut self, name: &str) -> Option<&mut dyn View>;

    /// The sheet unqualified references resolve against
    fn active_sheet(&self) -> Option<&dyn View>;

    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;
}
