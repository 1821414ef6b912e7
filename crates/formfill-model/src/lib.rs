//! Formfill Model — typed form schema and response state
//!
//! The pure data layer of the form engine:
//! - Field definitions with kinds, constraints, and validator references
//! - Groups with phase ordering and parallel batch ids
//! - Typed values and per-field responses
//! - The document (form + responses) that checkpoints by serialization
//! - The patch wire model
//! - Structural conformance checking
//!
//! # Example
//!
//! ```rust
//! use formfill_model::{Document, Field, Form, Group};
//!
//! let form = Form::new(
//!     "profile",
//!     vec![Group::new("basics").with_field(Field::text("name").required())],
//! );
//! let doc = Document::new(form);
//! assert_eq!(doc.answered_count(), 0);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod conformance;
pub mod document;
pub mod error;
pub mod field;
pub mod form;
pub mod patch;
pub mod response;
pub mod value;

// Re-exports for convenience
pub use conformance::{check, Conformance, Violation};
pub use document::Document;
pub use error::ModelError;
pub use field::{
    CheckboxMode, ChoiceOption, ColumnDef, ColumnKind, Constraints, Field, FieldId, FieldKind,
    ValidatorRef,
};
pub use form::{Form, FormId, Group, GroupId};
pub use patch::Patch;
pub use response::Response;
pub use value::{Cell, CheckState, Row, Value};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the form model
    pub use crate::{
        Cell, CheckState, Constraints, Document, Field, FieldId, FieldKind, Form, Group, Patch,
        Response, Row, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
