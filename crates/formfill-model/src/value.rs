//! Typed response values
//!
//! [`Value`] is a closed sum whose shape mirrors [`crate::FieldKind`]; the
//! conformance checker is the only arbiter of whether a value fits a field.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// State of a single checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Box is checked
    Checked,
    /// Box is unchecked
    Unchecked,
    /// Box is indeterminate (tri-state mode only)
    Indeterminate,
}

impl From<bool> for CheckState {
    fn from(b: bool) -> Self {
        if b {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }
}

/// A single typed table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Checkbox cell
    Checked(bool),
    /// Numeric cell
    Number(f64),
    /// Date cell
    Date(NaiveDate),
    /// Text cell
    Text(String),
}

impl Cell {
    /// Short kind name for messages
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Cell::Text(_) => "text",
            Cell::Number(_) => "number",
            Cell::Date(_) => "date",
            Cell::Checked(_) => "checkbox",
        }
    }
}

/// One table row: column id → typed cell, in column order
pub type Row = IndexMap<String, Cell>;

/// Typed field value — shape mirrors the owning field's kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Value {
    /// Free text
    Text(String),
    /// Floating point number
    Number(f64),
    /// Ordered list of text entries
    TextList(Vec<String>),
    /// Selected option id
    Choice(String),
    /// Selected option ids
    Choices(Vec<String>),
    /// Checkbox id → state
    Checkboxes(IndexMap<String, CheckState>),
    /// Single URL
    Url(String),
    /// Ordered list of URLs
    UrlList(Vec<String>),
    /// Calendar date
    Date(NaiveDate),
    /// Calendar year
    Year(i32),
    /// Ordered list of rows
    Table(Vec<Row>),
}

impl Value {
    /// Short kind name for messages
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::TextList(_) => "text_list",
            Value::Choice(_) => "single_choice",
            Value::Choices(_) => "multi_choice",
            Value::Checkboxes(_) => "checkbox_set",
            Value::Url(_) => "url",
            Value::UrlList(_) => "url_list",
            Value::Date(_) => "date",
            Value::Year(_) => "year",
            Value::Table(_) => "table",
        }
    }

    /// Item count for list-like values, if this value is list-like
    #[must_use]
    pub fn list_len(&self) -> Option<usize> {
        match self {
            Value::TextList(items) | Value::UrlList(items) => Some(items.len()),
            Value::Table(rows) => Some(rows.len()),
            _ => None,
        }
    }
}
