//! Error types for the patch engine
//!
//! Every variant is a per-patch rejection reason; none of them aborts a
//! batch. The display strings travel back to the filler verbatim.

use formfill_model::FieldId;

/// Why a payload could not be coerced toward the field's kind
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoerceError {
    /// No unambiguous, lossless interpretation exists
    #[error("cannot interpret {found} as {expected}")]
    Incompatible {
        /// Target kind name
        expected: &'static str,
        /// JSON type or shape found
        found: String,
    },

    /// Date string did not parse
    #[error("invalid date `{text}`, expected YYYY-MM-DD")]
    InvalidDate {
        /// Offending text
        text: String,
    },

    /// Year payload was not an integral value
    #[error("invalid year `{text}`")]
    InvalidYear {
        /// Offending text
        text: String,
    },

    /// Checkbox state string was not recognized
    #[error("invalid checkbox state `{text}`")]
    InvalidCheckState {
        /// Offending text
        text: String,
    },

    /// Table row payload was not a JSON object
    #[error("table row must be an object, got {found}")]
    RowNotObject {
        /// JSON type found
        found: String,
    },
}

/// Why a single patch was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    /// Target field id is not in the form
    #[error("unknown field: {0}")]
    UnknownField(FieldId),

    /// The field's kind does not support this op
    #[error("field `{field}` ({kind}) does not support {op}")]
    UnsupportedOp {
        /// Target field
        field: FieldId,
        /// Field kind name
        kind: &'static str,
        /// Wire op name
        op: &'static str,
    },

    /// Payload could not be coerced
    #[error("coercion failed: {0}")]
    Coercion(#[from] CoerceError),

    /// Candidate value failed conformance
    #[error("value does not conform: {reasons}")]
    Nonconformant {
        /// Joined violation reasons
        reasons: String,
    },

    /// Delete index beyond the current list/table length
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Current length
        len: usize,
    },

    /// Skip/abort requires a non-empty reason
    #[error("{op} requires a non-empty reason")]
    EmptyReason {
        /// Wire op name
        op: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_error_display() {
        let err = PatchError::UnknownField(FieldId::from("x"));
        assert_eq!(err.to_string(), "unknown field: x");

        let err = PatchError::IndexOutOfRange { index: 5, len: 2 };
        assert_eq!(err.to_string(), "index 5 out of range for length 2");
    }

    #[test]
    fn coerce_error_wraps_into_patch_error() {
        let err: PatchError = CoerceError::InvalidDate {
            text: "tomorrow".into(),
        }
        .into();
        assert!(err.to_string().contains("invalid date"));
    }
}
