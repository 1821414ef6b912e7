//! Formfill Validate — issue derivation pipeline
//!
//! Computes a prioritized issue list from two sources:
//! - **Structural**: required-but-unanswered fields, out-of-bounds values,
//!   malformed table rows, derived purely from field constraints and the
//!   current responses
//! - **Custom**: registered validator functions given a read-only view of
//!   the whole document plus field-scoped parameters
//!
//! Issues are ordered deterministically so the scheduler can cap how many
//! it surfaces per turn without reshuffling priorities between turns.
//!
//! # Example
//!
//! ```rust
//! use formfill_model::{Document, Field, Form, Group};
//! use formfill_validate::{compute_issues, ValidatorRegistry};
//!
//! let doc = Document::new(Form::new(
//!     "f",
//!     vec![Group::new("g").with_field(Field::text("name").required())],
//! ));
//! let issues = compute_issues(&doc, &ValidatorRegistry::new());
//! assert_eq!(issues.len(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod engine;
pub mod filter;
pub mod issue;
pub mod registry;
pub mod structural;

// Re-exports for convenience
pub use engine::{blocking_issue_count, compute_issues, compute_issues_scoped, is_blocking, sort_issues};
pub use filter::FieldFilter;
pub use issue::{codes, Issue, IssueScope, IssueSource, Severity};
pub use registry::{ValidatorFn, ValidatorInput, ValidatorRegistry};
pub use structural::structural_issues;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the validation engine
    pub use crate::{
        compute_issues, compute_issues_scoped, FieldFilter, Issue, IssueScope, Severity,
        ValidatorRegistry,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
