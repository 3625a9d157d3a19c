//! Cell address and range types
//!
//! Rows and columns are 1-based; 0 means "unset". Column letters are bijective
//! base-26 (A=1 ... Z=26, AA=27), so there is no zero digit.

use crate::error::{Error, Result};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// A cell position (e.g., "A1", "$B$2", "Sheet2!C3")
///
/// The optional `$` prefix makes a component absolute: it is left untouched
/// when a formula is relocated with [`offset`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Optional sheet qualifier
    pub sheet: Option<String>,
    /// Column index (1-based, A=1; 0 = unset)
    pub column: u32,
    /// Row index (1-based; 0 = unset)
    pub row: u32,
    /// Whether the column reference is absolute ($)
    pub absolute_column: bool,
    /// Whether the row reference is absolute ($)
    pub absolute_row: bool,
}

impl Position {
    /// Create a new relative position
    pub fn new(row: u32, column: u32) -> Self {
        Self {
            sheet: None,
            column,
            row,
            absolute_column: false,
            absolute_row: false,
        }
    }

    /// Create a position with specified absolute/relative flags
    pub fn with_absolute(row: u32, column: u32, absolute_row: bool, absolute_column: bool) -> Self {
        Self {
            sheet: None,
            column,
            row,
            absolute_column,
            absolute_row,
        }
    }

    /// Create an absolute position ($A$1 style)
    pub fn absolute(row: u32, column: u32) -> Self {
        Self::with_absolute(row, column, true, true)
    }

    /// Qualify this position with a sheet name
    pub fn on_sheet<S: Into<String>>(mut self, sheet: S) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// The same position with the sheet qualifier removed
    pub fn without_sheet(&self) -> Self {
        Self {
            sheet: None,
            ..self.clone()
        }
    }

    /// Both row and column are set (non-zero)
    pub fn is_set(&self) -> bool {
        self.row > 0 && self.column > 0
    }

    /// Parse a position from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use tabula_core::Position;
    ///
    /// let pos = Position::parse("$B$2").unwrap();
    /// assert_eq!(pos.row, 2);
    /// assert_eq!(pos.column, 2);
    /// assert!(pos.absolute_row);
    /// assert!(pos.absolute_column);
    ///
    /// let pos = Position::parse("'My Sheet'!C3").unwrap();
    /// assert_eq!(pos.sheet.as_deref(), Some("My Sheet"));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        decode(s)
    }

    /// Shift the relative components of this position (see [`offset`])
    pub fn offset(&self, rows: i64, columns: i64) -> Self {
        offset(self, rows, columns)
    }

    /// Format as A1-style string (see [`encode`])
    pub fn to_a1_string(&self) -> String {
        encode(self)
    }

    /// Convert a column index to letters (1 = A, 26 = Z, 27 = AA; 0 renders empty)
    pub fn column_to_letters(column: u32) -> String {
        let mut letters = Vec::new();
        let mut n = column;

        while n > 0 {
            n -= 1;
            letters.push((n % 26) as u8 + b'A');
            n /= 26;
        }

        letters.reverse();
        letters.into_iter().map(char::from).collect()
    }

    /// Convert column letters to an index (A = 1, Z = 26, AA = 27)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut column: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            column = column
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| Error::InvalidAddress(format!("column too large: {}", letters)))?;
        }

        Ok(column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode(self))
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        decode(s)
    }
}

/// Decode `[Sheet!][$]COL[$]ROW` into a [`Position`]
///
/// Fails if the column run is empty, if no row digits follow, or if the row
/// does not fit an unsigned integer.
pub fn decode(text: &str) -> Result<Position> {
    let text = text.trim();
    let (sheet, address) = split_sheet(text)?;
    let mut position = decode_address(address)?;
    position.sheet = sheet;
    Ok(position)
}

/// Encode a [`Position`] as `[Sheet!][$]COL[$]ROW`
pub fn encode(position: &Position) -> String {
    let mut result = String::new();

    if let Some(sheet) = &position.sheet {
        result.push_str(&quote_sheet_name(sheet));
        result.push('!');
    }

    if position.absolute_column {
        result.push('$');
    }
    result.push_str(&Position::column_to_letters(position.column));

    if position.absolute_row {
        result.push('$');
    }
    result.push_str(&position.row.to_string());

    result
}

/// Shift the non-absolute components of a position by a row/column delta
///
/// Absolute components and unset (0) components are left unchanged. A
/// component pushed below 1 becomes 0, which evaluates to `#REF!`.
pub fn offset(position: &Position, rows: i64, columns: i64) -> Position {
    let mut shifted = position.clone();
    if !position.absolute_row {
        shifted.row = shift(position.row, rows);
    }
    if !position.absolute_column {
        shifted.column = shift(position.column, columns);
    }
    shifted
}

fn shift(value: u32, delta: i64) -> u32 {
    if value == 0 {
        return 0;
    }
    let moved = i64::from(value) + delta;
    if moved < 1 {
        0
    } else {
        u32::try_from(moved).unwrap_or(u32::MAX)
    }
}

/// Quote a sheet name when it is not a plain identifier (`'My Sheet'`)
pub fn quote_sheet_name(name: &str) -> Cow<'_, str> {
    let plain = name
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("'{}'", name.replace('\'', "''")))
    }
}

/// Split an optional `Sheet!` / `'Quoted Sheet'!` prefix from an address
fn split_sheet(text: &str) -> Result<(Option<String>, &str)> {
    if let Some(rest) = text.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = rest.char_indices();

        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                name.push(c);
                continue;
            }
            // Doubled quote is an escaped quote
            if rest[i + 1..].starts_with('\'') {
                name.push('\'');
                chars.next();
                continue;
            }
            return match rest[i + 1..].strip_prefix('!') {
                Some(address) => Ok((Some(name), address)),
                None => Err(Error::InvalidAddress(format!(
                    "expected '!' after sheet name in '{}'",
                    text
                ))),
            };
        }

        return Err(Error::InvalidAddress(format!(
            "unterminated sheet name in '{}'",
            text
        )));
    }

    match text.rfind('!') {
        Some(0) => Err(Error::InvalidAddress(format!("empty sheet name in '{}'", text))),
        Some(idx) => Ok((Some(text[..idx].to_string()), &text[idx + 1..])),
        None => Ok((None, text)),
    }
}

fn decode_address(s: &str) -> Result<Position> {
    if s.is_empty() {
        return Err(Error::InvalidAddress("empty address".into()));
    }

    let bytes = s.as_bytes();
    let mut pos = 0;

    // Check for column absolute marker
    let absolute_column = bytes.first() == Some(&b'$');
    if absolute_column {
        pos += 1;
    }

    // Parse column letters
    let col_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
        pos += 1;
    }

    if pos == col_start {
        return Err(Error::InvalidAddress(format!(
            "no column letters in '{}'",
            s
        )));
    }

    let column = Position::letters_to_column(&s[col_start..pos])?;

    // Check for row absolute marker
    let absolute_row = bytes.get(pos) == Some(&b'$');
    if absolute_row {
        pos += 1;
    }

    // Parse row number
    let row_str = &s[pos..];
    if row_str.is_empty() {
        return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
    }
    if !row_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAddress(format!(
            "invalid row number in '{}'",
            s
        )));
    }

    let row: u32 = row_str
        .parse()
        .map_err(|_| Error::InvalidAddress(format!("row number too large in '{}'", s)))?;

    Ok(Position {
        sheet: None,
        column,
        row,
        absolute_column,
        absolute_row,
    })
}

/// A rectangle of cells (e.g., "A1:B10")
///
/// The endpoints are kept in the order they were written so a range can be
/// re-rendered faithfully; use [`Range::normalized`] before iterating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    /// First endpoint
    pub start: Position,
    /// Second endpoint
    pub end: Position,
}

impl Range {
    /// Create a new range from two endpoints
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a single-cell range
    pub fn single(position: Position) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    /// The `(0,0)-(0,0)` range reported by an empty view
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if either endpoint is unset
    pub fn is_empty(&self) -> bool {
        !self.start.is_set() || !self.end.is_set()
    }

    /// Sheet qualifier of the range (taken from the start endpoint)
    pub fn sheet(&self) -> Option<&str> {
        self.start.sheet.as_deref()
    }

    /// Reorder endpoints so start is top-left and end is bottom-right
    pub fn normalized(&self) -> Self {
        let (top, bottom) = ordered(self.start.row, self.end.row);
        let (left, right) = ordered(self.start.column, self.end.column);

        Self {
            start: Position {
                sheet: self.start.sheet.clone(),
                column: left,
                row: top,
                absolute_column: self.start.absolute_column,
                absolute_row: self.start.absolute_row,
            },
            end: Position {
                sheet: self.start.sheet.clone(),
                column: right,
                row: bottom,
                absolute_column: self.end.absolute_column,
                absolute_row: self.end.absolute_row,
            },
        }
    }

    /// Parse a range from `[Sheet!]A1:B10` notation (a single cell is a 1x1 range)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (sheet, rest) = split_sheet(s)?;

        let (first, second) = rest.split_once(':').unwrap_or((rest, rest));
        let mut start = decode_address(first)
            .map_err(|e| Error::InvalidRange(format!("'{}': {}", s, e)))?;
        let mut end = decode_address(second)
            .map_err(|e| Error::InvalidRange(format!("'{}': {}", s, e)))?;

        start.sheet = sheet.clone();
        end.sheet = sheet;
        Ok(Self::new(start, end))
    }

    /// Number of rows covered, regardless of endpoint order
    pub fn row_count(&self) -> u32 {
        self.start.row.abs_diff(self.end.row) + 1
    }

    /// Number of columns covered, regardless of endpoint order
    pub fn column_count(&self) -> u32 {
        self.start.column.abs_diff(self.end.column) + 1
    }

    /// Check if a position (ignoring its sheet) lies within this range
    pub fn contains(&self, position: &Position) -> bool {
        let range = self.normalized();
        position.row >= range.start.row
            && position.row <= range.end.row
            && position.column >= range.start.column
            && position.column <= range.end.column
    }

    /// Shift both endpoints (see [`offset`])
    pub fn offset(&self, rows: i64, columns: i64) -> Self {
        Self {
            start: offset(&self.start, rows, columns),
            end: offset(&self.end, rows, columns),
        }
    }

    /// Iterate over all positions in the range, row by row
    pub fn cells(&self) -> RangeCells {
        let range = self.normalized();
        RangeCells {
            current_row: range.start.row,
            current_column: range.start.column,
            range,
        }
    }

    /// Format as `A1:B10`, with the sheet qualifier (if any) on the start only
    pub fn to_a1_string(&self) -> String {
        format!("{}:{}", encode(&self.start), encode(&self.end.without_sheet()))
    }
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for Range {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over positions in a range
pub struct RangeCells {
    range: Range,
    current_row: u32,
    current_column: u32,
}

impl Iterator for RangeCells {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.range.end.row {
            return None;
        }

        let position = Position::new(self.current_row, self.current_column);

        self.current_column += 1;
        if self.current_column > self.range.end.column {
            self.current_column = self.range.start.column;
            self.current_row += 1;
        }

        Some(position)
    }
}
