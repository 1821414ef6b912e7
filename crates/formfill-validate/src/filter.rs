//! Field scoping for validation passes
//!
//! The scheduler narrows issue computation to the fields of the currently
//! active phase/group and to the roles its filler is responsible for.

use formfill_model::{Field, FieldId};
use std::collections::HashSet;

/// Admits or excludes fields from a validation pass
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    /// Only these fields, if set
    allowed: Option<HashSet<FieldId>>,
    /// Only fields whose role is unset or in this list, if set
    roles: Option<Vec<String>>,
}

impl FieldFilter {
    /// Admit every field
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Admit only the given fields
    #[must_use]
    pub fn fields<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = FieldId>,
    {
        Self {
            allowed: Some(ids.into_iter().collect()),
            roles: None,
        }
    }

    /// Additionally restrict by responsible role
    ///
    /// Fields with no declared role are admitted for any filler.
    #[inline]
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Whether a field passes the filter
    #[must_use]
    pub fn admits(&self, field: &Field) -> bool {
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(&field.id) {
                return false;
            }
        }
        if let Some(roles) = &self.roles {
            if let Some(role) = &field.role {
                if !roles.iter().any(|r| r == role) {
                    return false;
                }
            }
        }
        true
    }

    /// Whether the filter admits every field
    #[inline]
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.allowed.is_none() && self.roles.is_none()
    }
}
