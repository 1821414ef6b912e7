//! Loose-JSON → typed-value coercion
//!
//! Fillers submit payloads as plain JSON. Where an unambiguous, lossless
//! interpretation toward the field's kind exists (boolean → checkbox state,
//! numeric string → number, scalar → one-element list), it is taken and a
//! warning recorded; anything else is a [`CoerceError`].

use crate::error::CoerceError;
use chrono::NaiveDate;
use formfill_model::{Cell, CheckState, ColumnDef, ColumnKind, Field, FieldKind, Row, Value};
use indexmap::IndexMap;
use serde_json::Value as Json;

/// Result of a successful coercion: the typed value plus any warnings
pub type Coerced<T> = (T, Vec<String>);

/// Coerce a full-replacement payload toward the field's kind
pub fn coerce_value(field: &Field, json: &Json) -> Result<Coerced<Value>, CoerceError> {
    let mut warnings = Vec::new();
    let value = match &field.kind {
        FieldKind::Text => Value::Text(expect_string(json, "text")?),
        FieldKind::Number => Value::Number(coerce_number(json, &mut warnings)?),
        FieldKind::TextList => Value::TextList(coerce_string_list(json, "text_list", &mut warnings)?),
        FieldKind::SingleChoice => Value::Choice(expect_string(json, "single_choice")?),
        FieldKind::MultiChoice => {
            Value::Choices(coerce_string_list(json, "multi_choice", &mut warnings)?)
        }
        FieldKind::CheckboxSet { .. } => Value::Checkboxes(coerce_checkboxes(json, &mut warnings)?),
        FieldKind::Url => Value::Url(expect_string(json, "url")?),
        FieldKind::UrlList => Value::UrlList(coerce_string_list(json, "url_list", &mut warnings)?),
        FieldKind::Date => Value::Date(coerce_date(json)?),
        FieldKind::Year => Value::Year(coerce_year(json, &mut warnings)?),
        FieldKind::Table { columns } => {
            let rows = match json {
                Json::Array(items) => items
                    .iter()
                    .map(|item| coerce_row(item, columns, &mut warnings))
                    .collect::<Result<Vec<Row>, _>>()?,
                other => {
                    return Err(CoerceError::Incompatible {
                        expected: "table",
                        found: json_type_name(other).to_string(),
                    })
                }
            };
            Value::Table(rows)
        }
    };
    Ok((value, warnings))
}

/// Coerce an append payload: one list item or one table row
pub fn coerce_item(field: &Field, json: &Json) -> Result<Coerced<AppendItem>, CoerceError> {
    let mut warnings = Vec::new();
    let item = match &field.kind {
        FieldKind::TextList => AppendItem::Entry(expect_string(json, "text_list item")?),
        FieldKind::UrlList => AppendItem::Entry(expect_string(json, "url_list item")?),
        FieldKind::Table { columns } => {
            AppendItem::Row(coerce_row(json, columns, &mut warnings)?)
        }
        kind => {
            return Err(CoerceError::Incompatible {
                expected: "list or table item",
                found: format!("append against {} field", kind.name()),
            })
        }
    };
    Ok((item, warnings))
}

/// One appendable item
#[derive(Debug, Clone, PartialEq)]
pub enum AppendItem {
    /// List entry (text or URL)
    Entry(String),
    /// Table row
    Row(Row),
}

/// Coerce one table row against the column schema
///
/// Cells for undeclared columns are coerced best-effort from the JSON
/// primitive so conformance can report the unknown column by name.
pub fn coerce_row(
    json: &Json,
    columns: &[ColumnDef],
    warnings: &mut Vec<String>,
) -> Result<Row, CoerceError> {
    let Json::Object(map) = json else {
        return Err(CoerceError::RowNotObject {
            found: json_type_name(json).to_string(),
        });
    };

    let mut row: Row = IndexMap::new();
    for (key, cell_json) in map {
        let cell = match columns.iter().find(|col| &col.id == key) {
            Some(col) => coerce_cell(cell_json, col.kind, key, warnings)?,
            None => loose_cell(cell_json)?,
        };
        row.insert(key.clone(), cell);
    }
    Ok(row)
}

fn coerce_cell(
    json: &Json,
    kind: ColumnKind,
    column: &str,
    warnings: &mut Vec<String>,
) -> Result<Cell, CoerceError> {
    Ok(match kind {
        ColumnKind::Text => Cell::Text(expect_string(json, "text cell")?),
        ColumnKind::Number => Cell::Number(coerce_number(json, warnings)?),
        ColumnKind::Date => Cell::Date(coerce_date(json)?),
        ColumnKind::Checkbox => match json {
            Json::Bool(b) => Cell::Checked(*b),
            other => {
                return Err(CoerceError::Incompatible {
                    expected: "checkbox cell",
                    found: format!("{} in column `{column}`", json_type_name(other)),
                })
            }
        },
    })
}

/// Best-effort cell from a primitive, for undeclared columns
fn loose_cell(json: &Json) -> Result<Cell, CoerceError> {
    Ok(match json {
        Json::String(s) => Cell::Text(s.clone()),
        Json::Number(n) => Cell::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::Bool(b) => Cell::Checked(*b),
        other => {
            return Err(CoerceError::Incompatible {
                expected: "cell",
                found: json_type_name(other).to_string(),
            })
        }
    })
}

fn expect_string(json: &Json, expected: &'static str) -> Result<String, CoerceError> {
    match json {
        Json::String(s) => Ok(s.clone()),
        other => Err(CoerceError::Incompatible {
            expected,
            found: json_type_name(other).to_string(),
        }),
    }
}

fn coerce_number(json: &Json, warnings: &mut Vec<String>) -> Result<f64, CoerceError> {
    match json {
        Json::Number(n) => n.as_f64().ok_or_else(|| CoerceError::Incompatible {
            expected: "number",
            found: n.to_string(),
        }),
        Json::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => {
                warnings.push(format!("parsed number from string `{s}`"));
                Ok(n)
            }
            Err(_) => Err(CoerceError::Incompatible {
                expected: "number",
                found: format!("string `{s}`"),
            }),
        },
        other => Err(CoerceError::Incompatible {
            expected: "number",
            found: json_type_name(other).to_string(),
        }),
    }
}

fn coerce_string_list(
    json: &Json,
    expected: &'static str,
    warnings: &mut Vec<String>,
) -> Result<Vec<String>, CoerceError> {
    match json {
        Json::Array(items) => items
            .iter()
            .map(|item| expect_string(item, expected))
            .collect(),
        Json::String(s) => {
            warnings.push("wrapped scalar into a one-element list".to_string());
            Ok(vec![s.clone()])
        }
        other => Err(CoerceError::Incompatible {
            expected,
            found: json_type_name(other).to_string(),
        }),
    }
}

fn coerce_checkboxes(
    json: &Json,
    warnings: &mut Vec<String>,
) -> Result<IndexMap<String, CheckState>, CoerceError> {
    let Json::Object(map) = json else {
        return Err(CoerceError::Incompatible {
            expected: "checkbox_set",
            found: json_type_name(json).to_string(),
        });
    };

    let mut states = IndexMap::new();
    for (id, state_json) in map {
        let state = match state_json {
            Json::Bool(b) => {
                warnings.push(format!("coerced boolean to checkbox state for `{id}`"));
                CheckState::from(*b)
            }
            Json::String(s) => match s.as_str() {
                "checked" => CheckState::Checked,
                "unchecked" => CheckState::Unchecked,
                "indeterminate" => CheckState::Indeterminate,
                other => {
                    return Err(CoerceError::InvalidCheckState {
                        text: other.to_string(),
                    })
                }
            },
            other => {
                return Err(CoerceError::Incompatible {
                    expected: "checkbox state",
                    found: json_type_name(other).to_string(),
                })
            }
        };
        states.insert(id.clone(), state);
    }
    Ok(states)
}

fn coerce_date(json: &Json) -> Result<NaiveDate, CoerceError> {
    match json {
        Json::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            CoerceError::InvalidDate {
                text: s.clone(),
            }
        }),
        other => Err(CoerceError::Incompatible {
            expected: "date",
            found: json_type_name(other).to_string(),
        }),
    }
}

fn coerce_year(json: &Json, warnings: &mut Vec<String>) -> Result<i32, CoerceError> {
    match json {
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_err(|_| CoerceError::InvalidYear { text: n.to_string() })
            } else {
                // Integral floats are fine, anything fractional is not.
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(&f) {
                    warnings.push(format!("coerced float {f} to year"));
                    Ok(f as i32)
                } else {
                    Err(CoerceError::InvalidYear { text: n.to_string() })
                }
            }
        }
        Json::String(s) => match s.trim().parse::<i32>() {
            Ok(y) => {
                warnings.push(format!("parsed year from string `{s}`"));
                Ok(y)
            }
            Err(_) => Err(CoerceError::InvalidYear { text: s.clone() }),
        },
        other => Err(CoerceError::Incompatible {
            expected: "year",
            found: json_type_name(other).to_string(),
        }),
    }
}

fn json_type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
