//! Formfill Patch — validated, atomic mutation of form documents
//!
//! The only write path into a [`formfill_model::Document`]:
//! - payloads arrive as loose JSON and are coerced toward the field's kind
//!   where an unambiguous, lossless interpretation exists
//! - the candidate value is checked for conformance before the store is
//!   touched; a rejection leaves the prior response untouched
//! - batches are best-effort: each patch succeeds or fails independently
//!
//! # Example
//!
//! ```rust
//! use formfill_model::{Document, Field, Form, Group, Patch};
//! use formfill_patch::apply;
//! use serde_json::json;
//!
//! let mut doc = Document::new(Form::new(
//!     "f",
//!     vec![Group::new("g").with_field(Field::text("name"))],
//! ));
//! let outcome = apply(&mut doc, &[Patch::set("name", json!("Alice"))]);
//! assert!(outcome.is_clean());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod apply;
pub mod coerce;
pub mod error;

// Re-exports for convenience
pub use apply::{apply, apply_one, AppliedPatch, ApplyOutcome, RejectedPatch};
pub use coerce::{coerce_item, coerce_row, coerce_value, AppendItem};
pub use error::{CoerceError, PatchError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the patch engine
    pub use crate::{apply, AppliedPatch, ApplyOutcome, PatchError, RejectedPatch};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
