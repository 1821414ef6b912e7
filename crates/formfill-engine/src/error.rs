//! Error types for the fill scheduler
//!
//! Per-patch failures never reach this module; they are recovered inside the
//! patch engine and reported back to the filler as next-turn issues. What
//! remains is filler-call failure (retryable or fatal) and internal
//! invariant violations.

use std::sync::Arc;

/// A failed call to the external filler
///
/// Retryable failures (network, rate limit) are retried up to the configured
/// count; fatal ones terminate the session immediately. The underlying cause
/// chain is preserved for the terminal error status.
#[derive(Debug)]
pub struct FillerError {
    message: String,
    retryable: bool,
    source: Option<Arc<anyhow::Error>>,
}

impl FillerError {
    /// Failure worth retrying
    #[inline]
    #[must_use]
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
            source: None,
        }
    }

    /// Failure that must not be retried
    #[inline]
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
            source: None,
        }
    }

    /// Attach the underlying cause
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Whether the scheduler should retry this failure
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Top-level message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for FillerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FillerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Terminal scheduler errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Retries against the filler ran out
    #[error("filler retries exhausted after {attempts} attempts")]
    FillerExhausted {
        /// Attempts made, including the first
        attempts: u32,
        /// Last failure
        #[source]
        source: FillerError,
    },

    /// Filler returned a non-retryable failure
    #[error("filler failed")]
    Filler(#[source] FillerError),

    /// A sub-session task panicked or was torn down
    #[error("sub-session task failed: {0}")]
    SubSession(String),

    /// Internal invariant violation
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl EngineError {
    /// Full cause chain, outermost first
    #[must_use]
    pub fn cause_chain(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut cause = std::error::Error::source(self);
        while let Some(e) = cause {
            chain.push(e.to_string());
            cause = e.source();
        }
        chain
    }
}
