//! Cooperative cancellation
//!
//! A clonable token over a `tokio::sync::watch` channel. Cancellation is
//! observed at suspension points and before the patch-apply critical
//! section, never inside it, so a patch stays all-or-nothing even when a
//! cancel races an apply.

use std::sync::Arc;
use tokio::sync::watch;

/// Clonable cancellation handle
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create new, un-cancelled token
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Signal cancellation to every clone
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether cancellation was signalled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is signalled
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone without a cancel; nothing left to observe.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_observed_by_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        clone.cancelled().await; // resolves immediately
    }

    #[tokio::test]
    async fn cancelled_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
    }
}
