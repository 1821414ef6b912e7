//! Field definitions: kinds, constraints, and the immutable field schema
//!
//! A [`Field`] is a single typed, constrained slot in a form. Fields are
//! immutable after form construction; only their [`crate::Response`] changes.

use serde::{Deserialize, Serialize};

/// Unique field identifier (unique within a form)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Create new field ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FieldId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Checkbox set mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckboxMode {
    /// Each box is checked or unchecked
    TwoState,
    /// Each box may additionally be indeterminate
    TriState,
}

/// Column value kind for table fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Free text cell
    Text,
    /// Numeric cell
    Number,
    /// Calendar date cell
    Date,
    /// Checkbox cell
    Checkbox,
}

/// Typed column definition for table fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column identifier (unique within the table)
    pub id: String,
    /// Cell value kind
    pub kind: ColumnKind,
    /// Whether every row must carry a cell for this column
    #[serde(default)]
    pub required: bool,
}

impl ColumnDef {
    /// Create new column definition
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            id: id.into(),
            kind,
            required: false,
        }
    }

    /// Mark column as required in every row
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Field kind — closed sum over every supported field shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text
    Text,
    /// Floating point number
    Number,
    /// Ordered list of text entries
    TextList,
    /// Exactly one choice from the field's options
    SingleChoice,
    /// Zero or more choices from the field's options
    MultiChoice,
    /// Named checkboxes with a per-field state mode
    CheckboxSet {
        /// Two-state or tri-state boxes
        mode: CheckboxMode,
    },
    /// Single URL
    Url,
    /// Ordered list of URLs
    UrlList,
    /// Calendar date
    Date,
    /// Calendar year
    Year,
    /// Table with typed columns
    Table {
        /// Column schema, in declaration order
        columns: Vec<ColumnDef>,
    },
}

impl FieldKind {
    /// Short kind name for messages
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::TextList => "text_list",
            FieldKind::SingleChoice => "single_choice",
            FieldKind::MultiChoice => "multi_choice",
            FieldKind::CheckboxSet { .. } => "checkbox_set",
            FieldKind::Url => "url",
            FieldKind::UrlList => "url_list",
            FieldKind::Date => "date",
            FieldKind::Year => "year",
            FieldKind::Table { .. } => "table",
        }
    }

    /// Whether this kind holds an ordered list editable by append/delete
    #[inline]
    #[must_use]
    pub fn is_list_like(&self) -> bool {
        matches!(
            self,
            FieldKind::TextList | FieldKind::UrlList | FieldKind::Table { .. }
        )
    }
}

/// Constraint set attached to a field
///
/// `min_len`/`max_len` bound character counts for text-like kinds and item
/// counts for list kinds; `min_rows`/`max_rows` bound table row counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Field must end up answered (or explicitly skipped/aborted)
    #[serde(default)]
    pub required: bool,
    /// Minimum length (characters or items)
    pub min_len: Option<usize>,
    /// Maximum length (characters or items)
    pub max_len: Option<usize>,
    /// Minimum numeric value (numbers and years)
    pub min_value: Option<f64>,
    /// Maximum numeric value (numbers and years)
    pub max_value: Option<f64>,
    /// Regex the text value must match in full
    pub pattern: Option<String>,
    /// Minimum table row count
    pub min_rows: Option<usize>,
    /// Maximum table row count
    pub max_rows: Option<usize>,
}

impl Constraints {
    /// Create empty constraint set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// With length bounds
    #[inline]
    #[must_use]
    pub fn with_len(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_len = min;
        self.max_len = max;
        self
    }

    /// With numeric value bounds
    #[inline]
    #[must_use]
    pub fn with_value_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    /// With full-match regex pattern
    #[inline]
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// With table row bounds
    #[inline]
    #[must_use]
    pub fn with_rows(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_rows = min;
        self.max_rows = max;
        self
    }
}

/// Selectable option for choice and checkbox-set fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Option identifier
    pub id: String,
    /// Human-readable label
    pub label: String,
}

impl ChoiceOption {
    /// Create new option
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Reference to a registered custom validator, with field-scoped parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRef {
    /// Registry id of the validator
    pub id: String,
    /// Opaque parameters handed to the validator
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ValidatorRef {
    /// Create new validator reference
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: serde_json::Value::Null,
        }
    }

    /// With parameters
    #[inline]
    #[must_use]
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }
}

/// Immutable field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field identifier
    pub id: FieldId,
    /// Human-readable label
    pub label: String,
    /// Field kind
    pub kind: FieldKind,
    /// Constraint set
    #[serde(default)]
    pub constraints: Constraints,
    /// Role expected to fill this field
    pub role: Option<String>,
    /// Options for choice / checkbox-set kinds
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    /// Custom validator references
    #[serde(default)]
    pub validators: Vec<ValidatorRef>,
}

impl Field {
    /// Create new field of the given kind
    #[must_use]
    pub fn new(id: impl Into<FieldId>, kind: FieldKind) -> Self {
        let id = id.into();
        Self {
            label: id.as_str().to_string(),
            id,
            kind,
            constraints: Constraints::default(),
            role: None,
            options: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// Create text field
    #[inline]
    #[must_use]
    pub fn text(id: impl Into<FieldId>) -> Self {
        Self::new(id, FieldKind::Text)
    }

    /// Create number field
    #[inline]
    #[must_use]
    pub fn number(id: impl Into<FieldId>) -> Self {
        Self::new(id, FieldKind::Number)
    }

    /// Create table field with typed columns
    #[inline]
    #[must_use]
    pub fn table(id: impl Into<FieldId>, columns: Vec<ColumnDef>) -> Self {
        Self::new(id, FieldKind::Table { columns })
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Mark required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.constraints.required = true;
        self
    }

    /// With full constraint set
    #[inline]
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// With responsible role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// With selectable option
    #[inline]
    #[must_use]
    pub fn with_option(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(ChoiceOption::new(id, label));
        self
    }

    /// With custom validator reference
    #[inline]
    #[must_use]
    pub fn with_validator(mut self, validator: ValidatorRef) -> Self {
        self.validators.push(validator);
        self
    }

    /// Whether an option id is declared on this field
    #[inline]
    #[must_use]
    pub fn has_option(&self, id: &str) -> bool {
        self.options.iter().any(|o| o.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_id_roundtrip() {
        let id = FieldId::from("name");
        assert_eq!(id.as_str(), "name");
        assert_eq!(id.to_string(), "name");
    }

    #[test]
    fn field_builder() {
        let field = Field::text("email")
            .with_label("Email address")
            .required()
            .with_constraints(Constraints::new().required().with_pattern(r".+@.+"));

        assert_eq!(field.id.as_str(), "email");
        assert_eq!(field.label, "Email address");
        assert!(field.constraints.required);
        assert_eq!(field.constraints.pattern.as_deref(), Some(r".+@.+"));
    }

    #[test]
    fn field_options() {
        let field = Field::new("color", FieldKind::SingleChoice)
            .with_option("r", "Red")
            .with_option("g", "Green");

        assert!(field.has_option("r"));
        assert!(!field.has_option("b"));
    }

    #[test]
    fn kind_names() {
        assert_eq!(FieldKind::Text.name(), "text");
        assert_eq!(
            FieldKind::CheckboxSet {
                mode: CheckboxMode::TwoState
            }
            .name(),
            "checkbox_set"
        );
        assert!(FieldKind::TextList.is_list_like());
        assert!(!FieldKind::Number.is_list_like());
    }

    #[test]
    fn validator_ref_params() {
        let v = ValidatorRef::new("max_words").with_params(serde_json::json!({ "limit": 50 }));
        assert_eq!(v.id, "max_words");
        assert_eq!(v.params["limit"], 50);
    }
}
