//! In-memory sheet

use std::collections::BTreeMap;

use crate::cell::{CellValue, Position, Range};
use crate::error::{Error, Result};
use crate::view::{Cell, View, ViewMut};

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    value: CellValue,
    formula: Option<String>,
}

/// A named grid of cells implementing [`View`]
///
/// Cells are keyed by `(row, column)`, so iteration is row-major.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    /// Sheet name
    name: String,
    /// Cell storage
    cells: BTreeMap<(u32, u32), Entry>,
    /// Writes are rejected when set
    read_only: bool,
}

impl Sheet {
    /// Create a new, empty sheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            read_only: false,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Check if the sheet rejects writes
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Protect (or unprotect) the sheet against writes
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cells are stored
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get a stored scalar by address string (formula cells report Blank)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let position = Position::parse(address)?;
        Ok(self
            .cells
            .get(&(position.row, position.column))
            .map(|entry| entry.value.clone())
            .unwrap_or_default())
    }

    /// Get the formula text of a cell by address string
    pub fn get_formula(&self, address: &str) -> Result<Option<String>> {
        let position = Position::parse(address)?;
        Ok(self
            .cells
            .get(&(position.row, position.column))
            .and_then(|entry| entry.formula.clone()))
    }

    /// Set a cell value by address string
    pub fn set_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let position = Position::parse(address)?;
        self.set_value_at(&position, value.into())
    }

    /// Set a cell formula by address string
    pub fn set_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let position = Position::parse(address)?;
        self.set_formula_at(&position, formula)
    }

    /// Store raw input: `=...` becomes a formula, anything else is inferred
    pub fn set_input(&mut self, address: &str, input: &str) -> Result<()> {
        let position = Position::parse(address)?;
        if input.trim_start().starts_with('=') {
            self.set_formula_at(&position, input)
        } else {
            self.set_value_at(&position, CellValue::infer(input))
        }
    }

    /// Set a cell value at a position
    pub fn set_value_at(&mut self, position: &Position, value: CellValue) -> Result<()> {
        let key = self.writable_key(position)?;
        if value.is_blank() {
            self.cells.remove(&key);
        } else {
            self.cells.insert(
                key,
                Entry {
                    value,
                    formula: None,
                },
            );
        }
        Ok(())
    }

    /// Set a cell formula at a position
    pub fn set_formula_at(&mut self, position: &Position, formula: &str) -> Result<()> {
        let key = self.writable_key(position)?;
        let formula = formula.trim();
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        self.cells.insert(
            key,
            Entry {
                value: CellValue::Blank,
                formula: Some(formula.to_string()),
            },
        );
        Ok(())
    }

    /// Remove a cell
    pub fn clear_at(&mut self, position: &Position) -> Result<()> {
        let key = self.writable_key(position)?;
        self.cells.remove(&key);
        Ok(())
    }

    fn writable_key(&self, position: &Position) -> Result<(u32, u32)> {
        if self.read_only {
            return Err(Error::ReadOnly(self.name.clone()));
        }
        if !position.is_set() {
            return Err(Error::InvalidAddress(position.to_a1_string()));
        }
        Ok((position.row, position.column))
    }
}

impl View for Sheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn cell(&self, position: &Position) -> Option<Cell> {
        let entry = self.cells.get(&(position.row, position.column))?;
        Some(match &entry.formula {
            Some(formula) => Cell::with_formula(formula.clone()),
            None => Cell::new(entry.value.clone()),
        })
    }

    fn bounds(&self) -> Range {
        let (Some(&(min_row, _)), Some(&(max_row, _))) =
            (self.cells.keys().next(), self.cells.keys().next_back())
        else {
            return Range::empty();
        };

        let mut min_column = u32::MAX;
        let mut max_column = 0;
        for &(_, column) in self.cells.keys() {
            min_column = min_column.min(column);
            max_column = max_column.max(column);
        }

        Range::new(
            Position::new(min_row, min_column),
            Position::new(max_row, max_column),
        )
    }

    fn mutable(&mut self) -> Result<&mut dyn ViewMut> {
        if self.read_only {
            return Err(Error::ReadOnly(self.name.clone()));
        }
        Ok(self)
    }
}

impl ViewMut for Sheet {
    fn set_value(&mut self, position: &Position, value: CellValue) -> Result<()> {
        self.set_value_at(position, value)
    }

    fn set_formula(&mut self, position: &Position, formula: &str) -> Result<()> {
        self.set_formula_at(position, formula)
    }

    fn clear(&mut self, position: &Position) -> Result<()> {
        self.clear_at(position)
    }
}
