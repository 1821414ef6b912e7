//! Error types for the form model

use crate::field::FieldId;

/// Model-level errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Two fields share an id within one form
    #[error("duplicate field id: {0}")]
    DuplicateFieldId(FieldId),

    /// Field id not present in the form
    #[error("unknown field: {0}")]
    UnknownField(FieldId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_display() {
        let err = ModelError::UnknownField(FieldId::from("x"));
        assert_eq!(err.to_string(), "unknown field: x");
    }
}
