//! Formfill Engine — multi-turn fill scheduler
//!
//! Orchestrates form completion against a pluggable [`Filler`]:
//! - computes prioritized issues each turn and hands them to the filler
//!   together with schema views of the in-scope fields
//! - applies the proposed patch batch atomically per patch under a single
//!   document critical section
//! - partitions groups into sequential phases by `order` and fans groups
//!   with a parallel batch id out to bounded concurrent sub-sessions
//! - enforces turn and batch budgets, supports cooperative cancellation,
//!   and reports a terminal [`SessionStatus`] with the final document
//!
//! Sessions hold no hidden state: serializing the report's document and
//! resuming with [`SessionConfig::starting_at`] continues where a
//! batch-limited call stopped.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod filler;
pub mod record;
pub mod scheduler;
pub mod session;

// Re-exports for convenience
pub use cancel::CancelToken;
pub use config::{FillMode, SessionConfig};
pub use error::{EngineError, FillerError};
pub use filler::{FieldSchema, Filler, PatchProposal, TurnRequest, Usage};
pub use record::{FillRecord, TurnEntry};
pub use scheduler::FillSession;
pub use session::{SessionId, SessionReport, SessionStatus};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running fill sessions
    pub use crate::{
        CancelToken, FillMode, FillSession, Filler, FillerError, PatchProposal, SessionConfig,
        SessionReport, SessionStatus, TurnRequest,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
