//! Structural conformance checking
//!
//! Given a field and a candidate value, decide whether the value's shape and
//! bounds fit the field's declared kind and constraints. Pure, never panics,
//! never fails with an error; callers consume the verdict.

use crate::field::{CheckboxMode, ColumnDef, ColumnKind, Field, FieldKind};
use crate::value::{Cell, CheckState, Row, Value};

/// A single conformance violation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    /// Value kind does not match the field kind
    #[error("expected {expected} value, got {found}")]
    KindMismatch {
        /// Field kind name
        expected: &'static str,
        /// Value kind name
        found: &'static str,
    },

    /// Length (characters or items) below minimum
    #[error("length {len} below minimum {min}")]
    TooShort {
        /// Observed length
        len: usize,
        /// Declared minimum
        min: usize,
    },

    /// Length (characters or items) above maximum
    #[error("length {len} above maximum {max}")]
    TooLong {
        /// Observed length
        len: usize,
        /// Declared maximum
        max: usize,
    },

    /// Numeric value below minimum
    #[error("value {value} below minimum {min}")]
    BelowMin {
        /// Observed value
        value: f64,
        /// Declared minimum
        min: f64,
    },

    /// Numeric value above maximum
    #[error("value {value} above maximum {max}")]
    AboveMax {
        /// Observed value
        value: f64,
        /// Declared maximum
        max: f64,
    },

    /// Text does not match the declared pattern in full
    #[error("value does not match pattern `{pattern}`")]
    PatternMismatch {
        /// Declared pattern
        pattern: String,
    },

    /// Declared pattern itself failed to compile
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Declared pattern
        pattern: String,
        /// Compile error
        message: String,
    },

    /// Not an http(s) URL
    #[error("not a valid URL: `{url}`")]
    InvalidUrl {
        /// Offending text
        url: String,
    },

    /// Selected option id not declared on the field
    #[error("unknown option id `{id}`")]
    UnknownOption {
        /// Offending option id
        id: String,
    },

    /// Same option selected more than once
    #[error("option `{id}` selected more than once")]
    DuplicateOption {
        /// Offending option id
        id: String,
    },

    /// Indeterminate state on a two-state checkbox set
    #[error("checkbox `{id}` cannot be indeterminate in two-state mode")]
    IndeterminateNotAllowed {
        /// Offending checkbox id
        id: String,
    },

    /// Table row count below minimum
    #[error("row count {rows} below minimum {min}")]
    TooFewRows {
        /// Observed row count
        rows: usize,
        /// Declared minimum
        min: usize,
    },

    /// Table row count above maximum
    #[error("row count {rows} above maximum {max}")]
    TooManyRows {
        /// Observed row count
        rows: usize,
        /// Declared maximum
        max: usize,
    },

    /// Row carries a cell for an undeclared column
    #[error("row {row}: unknown column `{column}`")]
    UnknownColumn {
        /// Zero-based row index
        row: usize,
        /// Offending column id
        column: String,
    },

    /// Row is missing a required column
    #[error("row {row}: missing required column `{column}`")]
    MissingColumn {
        /// Zero-based row index
        row: usize,
        /// Missing column id
        column: String,
    },

    /// Cell kind does not match the column's declared kind
    #[error("row {row}, column `{column}`: expected {expected} cell, got {found}")]
    CellKindMismatch {
        /// Zero-based row index
        row: usize,
        /// Column id
        column: String,
        /// Column kind name
        expected: &'static str,
        /// Cell kind name
        found: &'static str,
    },
}

/// Conformance verdict for one (field, value) pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conformance {
    /// Violations found; empty means conformant
    pub violations: Vec<Violation>,
}

impl Conformance {
    /// Conformant verdict
    #[inline]
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// Whether the value conforms
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable reasons, one per violation
    #[must_use]
    pub fn reasons(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }

    fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }
}

/// Check a candidate value against a field's kind and constraints
#[must_use]
pub fn check(field: &Field, value: &Value) -> Conformance {
    let mut verdict = Conformance::ok();
    let c = &field.constraints;

    match (&field.kind, value) {
        (FieldKind::Text, Value::Text(text)) => {
            check_len(&mut verdict, text.chars().count(), c.min_len, c.max_len);
            check_pattern(&mut verdict, c.pattern.as_deref(), text);
        }
        (FieldKind::Number, Value::Number(n)) => {
            check_range(&mut verdict, *n, c.min_value, c.max_value);
        }
        (FieldKind::TextList, Value::TextList(items)) => {
            check_len(&mut verdict, items.len(), c.min_len, c.max_len);
        }
        (FieldKind::SingleChoice, Value::Choice(id)) => {
            if !field.has_option(id) {
                verdict.push(Violation::UnknownOption { id: id.clone() });
            }
        }
        (FieldKind::MultiChoice, Value::Choices(ids)) => {
            check_len(&mut verdict, ids.len(), c.min_len, c.max_len);
            let mut seen = std::collections::HashSet::new();
            for id in ids {
                if !field.has_option(id) {
                    verdict.push(Violation::UnknownOption { id: id.clone() });
                }
                if !seen.insert(id.as_str()) {
                    verdict.push(Violation::DuplicateOption { id: id.clone() });
                }
            }
        }
        (FieldKind::CheckboxSet { mode }, Value::Checkboxes(states)) => {
            for (id, state) in states {
                if !field.has_option(id) {
                    verdict.push(Violation::UnknownOption { id: id.clone() });
                }
                if *mode == CheckboxMode::TwoState && *state == CheckState::Indeterminate {
                    verdict.push(Violation::IndeterminateNotAllowed { id: id.clone() });
                }
            }
        }
        (FieldKind::Url, Value::Url(url)) => {
            check_url(&mut verdict, url);
        }
        (FieldKind::UrlList, Value::UrlList(urls)) => {
            check_len(&mut verdict, urls.len(), c.min_len, c.max_len);
            for url in urls {
                check_url(&mut verdict, url);
            }
        }
        (FieldKind::Date, Value::Date(_)) => {}
        (FieldKind::Year, Value::Year(year)) => {
            check_range(&mut verdict, f64::from(*year), c.min_value, c.max_value);
        }
        (FieldKind::Table { columns }, Value::Table(rows)) => {
            check_rows(&mut verdict, rows.len(), c.min_rows, c.max_rows);
            for (i, row) in rows.iter().enumerate() {
                check_row(&mut verdict, i, row, columns);
            }
        }
        (kind, value) => {
            verdict.push(Violation::KindMismatch {
                expected: kind.name(),
                found: value.kind_name(),
            });
        }
    }

    verdict
}

/// Check one table row against the column schema
pub fn check_row(verdict: &mut Conformance, index: usize, row: &Row, columns: &[ColumnDef]) {
    for (column_id, cell) in row {
        match columns.iter().find(|col| &col.id == column_id) {
            Some(col) => {
                if !cell_matches(cell, col.kind) {
                    verdict.push(Violation::CellKindMismatch {
                        row: index,
                        column: column_id.clone(),
                        expected: column_kind_name(col.kind),
                        found: cell.kind_name(),
                    });
                }
            }
            None => verdict.push(Violation::UnknownColumn {
                row: index,
                column: column_id.clone(),
            }),
        }
    }
    for col in columns.iter().filter(|col| col.required) {
        if !row.contains_key(&col.id) {
            verdict.push(Violation::MissingColumn {
                row: index,
                column: col.id.clone(),
            });
        }
    }
}

fn cell_matches(cell: &Cell, kind: ColumnKind) -> bool {
    matches!(
        (cell, kind),
        (Cell::Text(_), ColumnKind::Text)
            | (Cell::Number(_), ColumnKind::Number)
            | (Cell::Date(_), ColumnKind::Date)
            | (Cell::Checked(_), ColumnKind::Checkbox)
    )
}

fn column_kind_name(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "text",
        ColumnKind::Number => "number",
        ColumnKind::Date => "date",
        ColumnKind::Checkbox => "checkbox",
    }
}

fn check_rows(verdict: &mut Conformance, rows: usize, min: Option<usize>, max: Option<usize>) {
    if let Some(min) = min {
        if rows < min {
            verdict.push(Violation::TooFewRows { rows, min });
        }
    }
    if let Some(max) = max {
        if rows > max {
            verdict.push(Violation::TooManyRows { rows, max });
        }
    }
}

fn check_len(verdict: &mut Conformance, len: usize, min: Option<usize>, max: Option<usize>) {
    if let Some(min) = min {
        if len < min {
            verdict.push(Violation::TooShort { len, min });
        }
    }
    if let Some(max) = max {
        if len > max {
            verdict.push(Violation::TooLong { len, max });
        }
    }
}

fn check_range(verdict: &mut Conformance, value: f64, min: Option<f64>, max: Option<f64>) {
    if let Some(min) = min {
        if value < min {
            verdict.push(Violation::BelowMin { value, min });
        }
    }
    if let Some(max) = max {
        if value > max {
            verdict.push(Violation::AboveMax { value, max });
        }
    }
}

fn check_pattern(verdict: &mut Conformance, pattern: Option<&str>, text: &str) {
    let Some(pattern) = pattern else { return };
    // Anchor so the pattern must match the whole value.
    match regex::Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => {
            if !re.is_match(text) {
                verdict.push(Violation::PatternMismatch {
                    pattern: pattern.to_string(),
                });
            }
        }
        Err(e) => verdict.push(Violation::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        }),
    }
}

fn check_url(verdict: &mut Conformance, url: &str) {
    let valid = (url.starts_with("http://") || url.starts_with("https://"))
        && url.len() > "https://".len()
        && !url.contains(char::is_whitespace);
    if !valid {
        verdict.push(Violation::InvalidUrl {
            url: url.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ColumnDef, Constraints, Field, FieldKind};
    use indexmap::IndexMap;

    #[test]
    fn text_min_length_rejected() {
        let field = Field::text("name").with_constraints(Constraints::new().with_len(Some(1), None));
        let verdict = check(&field, &Value::Text(String::new()));
        assert_eq!(
            verdict.violations,
            vec![Violation::TooShort { len: 0, min: 1 }]
        );
    }

    #[test]
    fn kind_mismatch_detected() {
        let field = Field::number("age");
        let verdict = check(&field, &Value::Text("old".into()));
        assert!(matches!(
            verdict.violations[0],
            Violation::KindMismatch {
                expected: "number",
                found: "text"
            }
        ));
    }

    #[test]
    fn pattern_must_match_full_value() {
        let field =
            Field::text("code").with_constraints(Constraints::new().with_pattern(r"[A-Z]{3}"));
        assert!(check(&field, &Value::Text("ABC".into())).is_ok());
        assert!(!check(&field, &Value::Text("ABCD".into())).is_ok());
    }

    #[test]
    fn invalid_pattern_is_a_violation_not_a_panic() {
        let field = Field::text("x").with_constraints(Constraints::new().with_pattern("("));
        let verdict = check(&field, &Value::Text("anything".into()));
        assert!(matches!(
            verdict.violations[0],
            Violation::InvalidPattern { .. }
        ));
    }

    #[test]
    fn number_range() {
        let field = Field::number("score")
            .with_constraints(Constraints::new().with_value_range(Some(0.0), Some(10.0)));
        assert!(check(&field, &Value::Number(5.0)).is_ok());
        assert!(!check(&field, &Value::Number(-1.0)).is_ok());
        assert!(!check(&field, &Value::Number(11.0)).is_ok());
    }

    #[test]
    fn choice_membership() {
        let field = Field::new("color", FieldKind::SingleChoice)
            .with_option("r", "Red")
            .with_option("g", "Green");
        assert!(check(&field, &Value::Choice("r".into())).is_ok());
        assert!(!check(&field, &Value::Choice("b".into())).is_ok());
    }

    #[test]
    fn multi_choice_duplicates_rejected() {
        let field = Field::new("tags", FieldKind::MultiChoice)
            .with_option("a", "A")
            .with_option("b", "B");
        let verdict = check(&field, &Value::Choices(vec!["a".into(), "a".into()]));
        assert!(verdict
            .violations
            .iter()
            .any(|v| matches!(v, Violation::DuplicateOption { .. })));
    }

    #[test]
    fn two_state_checkbox_rejects_indeterminate() {
        let field = Field::new(
            "flags",
            FieldKind::CheckboxSet {
                mode: CheckboxMode::TwoState,
            },
        )
        .with_option("x", "X");
        let states: IndexMap<String, CheckState> =
            [("x".to_string(), CheckState::Indeterminate)].into_iter().collect();
        let verdict = check(&field, &Value::Checkboxes(states));
        assert!(matches!(
            verdict.violations[0],
            Violation::IndeterminateNotAllowed { .. }
        ));
    }

    #[test]
    fn url_shape() {
        let field = Field::new("site", FieldKind::Url);
        assert!(check(&field, &Value::Url("https://example.com".into())).is_ok());
        assert!(!check(&field, &Value::Url("ftp://example.com".into())).is_ok());
        assert!(!check(&field, &Value::Url("https://a b".into())).is_ok());
    }

    #[test]
    fn table_rows_and_cells() {
        let field = Field::table(
            "rows",
            vec![
                ColumnDef::new("name", ColumnKind::Text).required(),
                ColumnDef::new("count", ColumnKind::Number),
            ],
        )
        .with_constraints(Constraints::new().with_rows(Some(1), Some(2)));

        // Empty table: too few rows.
        assert!(!check(&field, &Value::Table(vec![])).is_ok());

        // One good row.
        let good: Row = [("name".to_string(), Cell::Text("x".into()))].into_iter().collect();
        assert!(check(&field, &Value::Table(vec![good.clone()])).is_ok());

        // Missing required column.
        let bad: Row = [("count".to_string(), Cell::Number(1.0))].into_iter().collect();
        let verdict = check(&field, &Value::Table(vec![bad]));
        assert!(verdict
            .violations
            .iter()
            .any(|v| matches!(v, Violation::MissingColumn { .. })));

        // Wrong cell kind.
        let wrong: Row = [("name".to_string(), Cell::Number(2.0))].into_iter().collect();
        let verdict = check(&field, &Value::Table(vec![wrong]));
        assert!(verdict
            .violations
            .iter()
            .any(|v| matches!(v, Violation::CellKindMismatch { .. })));

        // Unknown column.
        let unknown: Row = [
            ("name".to_string(), Cell::Text("x".into())),
            ("oops".to_string(), Cell::Text("y".into())),
        ]
        .into_iter()
        .collect();
        let verdict = check(&field, &Value::Table(vec![unknown]));
        assert!(verdict
            .violations
            .iter()
            .any(|v| matches!(v, Violation::UnknownColumn { .. })));
    }

    #[test]
    fn year_range_via_value_bounds() {
        let field = Field::new("year", FieldKind::Year)
            .with_constraints(Constraints::new().with_value_range(Some(1900.0), Some(2100.0)));
        assert!(check(&field, &Value::Year(2024)).is_ok());
        assert!(!check(&field, &Value::Year(1800)).is_ok());
    }
}
