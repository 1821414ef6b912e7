//! Groups and forms
//!
//! A [`Group`] is an ordered container of fields carrying a phase `order`
//! and an optional parallel batch id. A [`Form`] is an ordered list of
//! groups with an id→field index built at construction, so field lookup by
//! id is O(1).

use crate::field::{Field, FieldId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique group identifier (unique within a form)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Create new group ID
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

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique form identifier (unique per document instance)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(String);

impl FormId {
    /// Create new form ID
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

impl From<&str> for FormId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for FormId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered container of fields with a phase order and optional batch id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier
    pub id: GroupId,
    /// Human-readable title
    pub title: String,
    /// Phase number; groups are partitioned by this, ascending
    #[serde(default)]
    pub order: u32,
    /// Groups sharing a batch id within one phase fill concurrently
    pub parallel_batch: Option<String>,
    /// Fields in declaration order
    pub fields: Vec<Field>,
}

impl Group {
    /// Create new group
    #[must_use]
    pub fn new(id: impl Into<GroupId>) -> Self {
        let id = id.into();
        Self {
            title: id.as_str().to_string(),
            id,
            order: 0,
            parallel_batch: None,
            fields: Vec::new(),
        }
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With phase order
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// With parallel batch id
    #[inline]
    #[must_use]
    pub fn in_batch(mut self, batch: impl Into<String>) -> Self {
        self.parallel_batch = Some(batch.into());
        self
    }

    /// Append a field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the group has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Serialized form shape; the field index is rebuilt on the way in
#[derive(Serialize, Deserialize)]
struct FormData {
    id: FormId,
    groups: Vec<Group>,
}

/// Ordered list of groups with O(1) field lookup by id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "FormData", into = "FormData")]
pub struct Form {
    /// Form identifier
    id: FormId,
    /// Groups in declaration order
    groups: Vec<Group>,
    /// id → (group index, field index); first declaration wins on duplicates
    index: HashMap<FieldId, (usize, usize)>,
}

impl Form {
    /// Create new form, building the field index
    ///
    /// If two fields share an id, the first declaration wins in the index;
    /// use [`Form::try_new`] to reject duplicates outright.
    #[must_use]
    pub fn new(id: impl Into<FormId>, groups: Vec<Group>) -> Self {
        let mut index = HashMap::new();
        for (gi, group) in groups.iter().enumerate() {
            for (fi, field) in group.fields.iter().enumerate() {
                index.entry(field.id.clone()).or_insert((gi, fi));
            }
        }
        Self {
            id: id.into(),
            groups,
            index,
        }
    }

    /// Create new form, rejecting duplicate field ids
    pub fn try_new(
        id: impl Into<FormId>,
        groups: Vec<Group>,
    ) -> Result<Self, crate::error::ModelError> {
        let mut seen = HashMap::new();
        for (gi, group) in groups.iter().enumerate() {
            for (fi, field) in group.fields.iter().enumerate() {
                if seen.insert(field.id.clone(), (gi, fi)).is_some() {
                    return Err(crate::error::ModelError::DuplicateFieldId(field.id.clone()));
                }
            }
        }
        Ok(Self {
            id: id.into(),
            groups,
            index: seen,
        })
    }

    /// Form identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &FormId {
        &self.id
    }

    /// Groups in declaration order
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Look up a field by id
    #[inline]
    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        self.index
            .get(id)
            .map(|&(gi, fi)| &self.groups[gi].fields[fi])
    }

    /// Group containing the given field
    #[inline]
    #[must_use]
    pub fn group_of(&self, id: &FieldId) -> Option<&Group> {
        self.index.get(id).map(|&(gi, _)| &self.groups[gi])
    }

    /// Look up a group by id
    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == id)
    }

    /// All fields in group declaration order, then field declaration order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    /// Distinct phase orders, ascending
    #[must_use]
    pub fn phase_orders(&self) -> Vec<u32> {
        let mut orders: Vec<u32> = self.groups.iter().map(|g| g.order).collect();
        orders.sort_unstable();
        orders.dedup();
        orders
    }

    /// Total field count
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.index.len()
    }
}

impl PartialEq for Form {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.groups == other.groups
    }
}

impl From<FormData> for Form {
    fn from(data: FormData) -> Self {
        Form::new(data.id, data.groups)
    }
}

impl From<Form> for FormData {
    fn from(form: Form) -> Self {
        FormData {
            id: form.id,
            groups: form.groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    fn sample_form() -> Form {
        Form::new(
            "f1",
            vec![
                Group::new("basics")
                    .with_order(0)
                    .with_field(Field::text("name").required())
                    .with_field(Field::number("age")),
                Group::new("links")
                    .with_order(1)
                    .with_field(Field::new("site", crate::FieldKind::Url)),
            ],
        )
    }

    #[test]
    fn form_field_lookup() {
        let form = sample_form();
        assert!(form.field(&FieldId::from("name")).is_some());
        assert!(form.field(&FieldId::from("missing")).is_none());
        assert_eq!(form.field_count(), 3);
    }

    #[test]
    fn form_group_of() {
        let form = sample_form();
        let group = form.group_of(&FieldId::from("site")).unwrap();
        assert_eq!(group.id.as_str(), "links");
        assert_eq!(group.order, 1);
    }

    #[test]
    fn form_phase_orders_sorted_dedup() {
        let form = Form::new(
            "f2",
            vec![
                Group::new("a").with_order(2),
                Group::new("b").with_order(0),
                Group::new("c").with_order(2),
            ],
        );
        assert_eq!(form.phase_orders(), vec![0, 2]);
    }

    #[test]
    fn form_try_new_rejects_duplicates() {
        let result = Form::try_new(
            "f3",
            vec![Group::new("g")
                .with_field(Field::text("dup"))
                .with_field(Field::number("dup"))],
        );
        assert!(matches!(result, Err(ModelError::DuplicateFieldId(_))));
    }

    #[test]
    fn form_serde_rebuilds_index() {
        let form = sample_form();
        let json = serde_json::to_string(&form).unwrap();
        let back: Form = serde_json::from_str(&json).unwrap();
        assert!(back.field(&FieldId::from("age")).is_some());
        assert_eq!(back, form);
    }
}
