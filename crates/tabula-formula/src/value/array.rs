//! Two-dimensional arrays of values

use std::fmt;

use tabula_core::CellError;

use super::Value;
use crate::error::FormulaResult;

/// A row-major grid of values, produced by range lookups and lifted operators
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    rows: usize,
    columns: usize,
    values: Vec<Value>,
}

impl Array {
    /// Create a `rows` x `columns` array of Blank values
    pub fn new(rows: usize, columns: usize) -> Self {
        Self::filled(rows, columns, Value::Blank)
    }

    /// Create an array with every element set to `value`
    pub fn filled(rows: usize, columns: usize, value: Value) -> Self {
        if rows == 0 || columns == 0 {
            return Self::default();
        }
        Self {
            rows,
            columns,
            values: vec![value; rows * columns],
        }
    }

    /// Build from nested rows; short rows are padded with Blank
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return Self::default();
        }

        let row_count = rows.len();
        let mut values = Vec::with_capacity(row_count * columns);
        for mut row in rows {
            row.resize(columns, Value::Blank);
            values.extend(row);
        }

        Self {
            rows: row_count,
            columns,
            values,
        }
    }

    /// A 1x1 array
    pub fn scalar(value: Value) -> Self {
        Self {
            rows: 1,
            columns: 1,
            values: vec![value],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element at zero-based `(row, column)`
    pub fn get(&self, row: usize, column: usize) -> Option<&Value> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.values.get(row * self.columns + column)
    }

    /// Replace the element at zero-based `(row, column)`
    pub fn set(&mut self, row: usize, column: usize, value: Value) -> Result<(), CellError> {
        if row >= self.rows || column >= self.columns {
            return Err(CellError::Ref);
        }
        self.values[row * self.columns + column] = value;
        Ok(())
    }

    /// Top-left element
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// All elements, row by row
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Rows as slices
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Value]> {
        self.values.chunks(self.columns.max(1))
    }

    /// Map every element; the first error aborts the traversal
    pub fn apply<F>(&self, mut f: F) -> FormulaResult<Array>
    where
        F: FnMut(&Value) -> FormulaResult<Value>,
    {
        let values = self
            .values
            .iter()
            .map(|value| f(value))
            .collect::<FormulaResult<Vec<_>>>()?;

        Ok(Self {
            rows: self.rows,
            columns: self.columns,
            values,
        })
    }

    /// Combine elementwise with another array
    ///
    /// The result takes the larger size on each axis; indexes wrap modulo each
    /// operand's own size, so a 1-wide operand is broadcast along that axis.
    pub fn apply_with<F>(&self, other: &Array, mut f: F) -> FormulaResult<Array>
    where
        F: FnMut(&Value, &Value) -> FormulaResult<Value>,
    {
        if self.is_empty() || other.is_empty() {
            return Ok(Self::default());
        }

        let rows = self.rows.max(other.rows);
        let columns = self.columns.max(other.columns);
        let mut values = Vec::with_capacity(rows * columns);

        for row in 0..rows {
            for column in 0..columns {
                let left = &self.values[(row % self.rows) * self.columns + column % self.columns];
                let right =
                    &other.values[(row % other.rows) * other.columns + column % other.columns];
                values.push(f(left, right)?);
            }
        }

        Ok(Self {
            rows,
            columns,
            values,
        })
    }
}

/// `{1,2;3,4}`: commas between columns, semicolons between rows
impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (r, row) in self.iter_rows().enumerate() {
            if r > 0 {
                write!(f, ";")?;
            }
            for (c, value) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, ",")?;
                }
                match value {
                    Value::Text(s) => write!(f, "\"{}\"", s)?,
                    other => write!(f, "{}", other)?,
                }
            }
        }
        write!(f, "}}")
    }
}
