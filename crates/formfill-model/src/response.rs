//! Per-field fill state
//!
//! Exactly one [`Response`] exists per field at any time; it starts
//! `Unanswered` and only the patch engine transitions it.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Current fill state of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Response {
    /// No value yet
    Unanswered,
    /// Answered with a conformant value
    Answered {
        /// The stored value
        value: Value,
    },
    /// Explicitly skipped by the filler
    Skipped {
        /// Why the filler skipped it
        reason: String,
    },
    /// Abandoned by the filler
    Aborted {
        /// Why the filler gave up
        reason: String,
    },
}

impl Response {
    /// Answered response
    #[inline]
    #[must_use]
    pub fn answered(value: Value) -> Self {
        Self::Answered { value }
    }

    /// Whether a value is stored
    #[inline]
    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self, Response::Answered { .. })
    }

    /// Whether the filler is done with this field (answered, skipped, or aborted)
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Response::Unanswered)
    }

    /// Stored value, if answered
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Response::Answered { value } => Some(value),
            _ => None,
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Response::Unanswered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_states() {
        assert!(!Response::Unanswered.is_settled());
        assert!(Response::answered(Value::Number(1.0)).is_answered());
        assert!(Response::Skipped {
            reason: "n/a".into()
        }
        .is_settled());
    }

    #[test]
    fn response_value_access() {
        let r = Response::answered(Value::Text("hi".into()));
        assert_eq!(r.value(), Some(&Value::Text("hi".into())));
        assert_eq!(Response::Unanswered.value(), None);
    }

    #[test]
    fn response_serde_tag() {
        let json = serde_json::to_value(Response::Skipped {
            reason: "not applicable".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "skipped");
        assert_eq!(json["reason"], "not applicable");
    }
}
