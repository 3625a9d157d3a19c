//! Named property bags for workbook and sheet introspection

use std::collections::BTreeMap;
use std::fmt;

use tabula_core::{Book, View};

use super::{Array, Value};

/// A value with named properties, read with `GET(object, "property")`
///
/// Property names are case-insensitive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    name: String,
    properties: BTreeMap<String, Value>,
}

impl Object {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property insert
    pub fn with<S: Into<String>, V: Into<Value>>(mut self, key: S, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<S: Into<String>, V: Into<Value>>(&mut self, key: S, value: V) -> Option<Value> {
        self.properties
            .insert(key.into().to_lowercase(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(&key.to_lowercase())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Describe one sheet: `name`, `bounds`, `rows`, `columns` and `values`
    pub fn from_view(view: &dyn View) -> Self {
        let bounds = view.bounds();
        let (bounds_text, rows, columns) = if bounds.is_empty() {
            (String::new(), 0, 0)
        } else {
            (
                bounds.normalized().to_a1_string(),
                bounds.row_count(),
                bounds.column_count(),
            )
        };

        let values = Array::from_rows(
            view.rows()
                .map(|row| row.into_iter().map(Value::from).collect())
                .collect(),
        );

        Object::new(view.name())
            .with("name", view.name())
            .with("bounds", bounds_text)
            .with("rows", rows as f64)
            .with("columns", columns as f64)
            .with("values", values)
    }

    /// Describe a workbook: `sheets`, `count`, `active`, plus one property per sheet
    pub fn from_book(book: &dyn Book) -> Self {
        let names = book.sheet_names();
        let sheets: Vec<Value> = names.iter().map(|n| Value::from(n.as_str())).collect();
        let sheets = Array::from_rows(vec![sheets]);

        let mut object = Object::new("workbook")
            .with("sheets", sheets)
            .with("count", names.len() as f64);

        if let Some(active) = book.active_sheet() {
            object.insert("active", active.name());
        }

        for name in &names {
            if let Some(view) = book.sheet(name) {
                object.insert(name.as_str(), Object::from_view(view));
            }
        }

        object
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<object {}>", self.name)
    }
}
