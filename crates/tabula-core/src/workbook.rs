//! Workbook type - an ordered collection of sheets

use crate::error::{Error, Result};
use crate::sheet::Sheet;
use crate::view::{Book, View};
use crate::MAX_SHEET_NAME_LEN;

/// An in-memory workbook implementing [`Book`]
#[derive(Debug, Clone)]
pub struct Workbook {
    /// Sheets in the workbook
    sheets: Vec<Sheet>,
    /// Active sheet index
    active_sheet: usize,
}

impl Workbook {
    /// Create a new workbook with one sheet named "Sheet1"
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new("Sheet1")],
            active_sheet: 0,
        }
    }

    /// Create an empty workbook with no sheets
    pub fn empty() -> Self {
        Self {
            sheets: Vec::new(),
            active_sheet: 0,
        }
    }

    /// Get the number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get a sheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Get a mutable sheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// Get a sheet by name (case-insensitive)
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheet_index(name).and_then(|i| self.sheets.get(i))
    }

    /// Get a mutable sheet by name (case-insensitive)
    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheet_index(name).and_then(move |i| self.sheets.get_mut(i))
    }

    /// Get the index of a sheet by name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.sheets
            .iter()
            .position(|sheet| sheet.name().to_lowercase() == name)
    }

    /// Iterate over all sheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    /// Add a sheet with a generated name ("SheetN")
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.generate_sheet_name();
        self.add_worksheet_with_name(&name)
    }

    /// Add a sheet with a specific name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name, None)?;
        self.sheets.push(Sheet::new(name));
        Ok(self.sheets.len() - 1)
    }

    /// Add an already populated sheet
    pub fn add_existing_worksheet(&mut self, sheet: Sheet) -> Result<usize> {
        self.validate_sheet_name(sheet.name(), None)?;
        self.sheets.push(sheet);
        Ok(self.sheets.len() - 1)
    }

    /// Remove a sheet by index
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Sheet> {
        if index >= self.sheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.sheets.len()));
        }

        let sheet = self.sheets.remove(index);
        if self.active_sheet >= self.sheets.len() && self.active_sheet > 0 {
            self.active_sheet = self.sheets.len().saturating_sub(1);
        }
        Ok(sheet)
    }

    /// Rename a sheet
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.sheets.len()));
        }
        self.validate_sheet_name(new_name, Some(index))?;
        self.sheets[index].set_name(new_name);
        Ok(())
    }

    /// Get the active sheet index
    pub fn active_sheet_index(&self) -> usize {
        self.active_sheet
    }

    /// Set the active sheet
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.sheets.len()));
        }
        self.active_sheet = index;
        Ok(())
    }

    /// Validate a sheet name, optionally excluding a sheet from the duplicate check
    fn validate_sheet_name(&self, name: &str, exclude_index: Option<usize>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']', '!'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        // Case-insensitive duplicate check
        if let Some(existing) = self.sheet_index(name) {
            if Some(existing) != exclude_index {
                return Err(Error::DuplicateSheetName(name.into()));
            }
        }

        Ok(())
    }

    fn generate_sheet_name(&self) -> String {
        let mut n = self.sheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.sheet_index(&name).is_none() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Book for Workbook {
    fn sheet(&self, name: &str) -> Option<&dyn View> {
        self.worksheet_by_name(name).map(|sheet| sheet as &dyn View)
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut dyn View> {
        self.worksheet_by_name_mut(name)
            .map(|sheet| sheet as &mut dyn View)
    }

    fn active_sheet(&self) -> Option<&dyn View> {
        self.sheets
            .get(self.active_sheet)
            .map(|sheet| sheet as &dyn View)
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name().to_string()).collect()
    }
}
