//! Cooperative cancellation for in-flight analyses.
//!
//! A host that learns a snapshot is stale (the file was edited) calls
//! [`CancellationSource::cancel`]; every analysis holding a token observes it at
//! its next traversal step and stops without reporting anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Read-only view of a cancellation flag. Cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that can never be cancelled.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancellation has been requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Owner side of a [`CancellationToken`].
#[derive(Debug, Default)]
pub struct CancellationSource {
    token: CancellationToken,
}

impl CancellationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Marker returned when an analysis observed cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("analysis cancelled")
    }
}

impl std::error::Error for Cancelled {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_share_the_source_flag() {
        let source = CancellationSource::new();
        let a = source.token();
        let b = a.clone();
        assert!(a.check().is_ok());

        source.cancel();
        assert!(a.is_cancelled());
        assert_eq!(b.check(), Err(Cancelled));
    }

    #[test]
    fn none_token_stays_live() {
        let token = CancellationToken::none();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancellation_is_visible_across_threads() {
        let source = CancellationSource::new();
        let token = source.token();
        std::thread::scope(|s| {
            s.spawn(|| source.cancel());
        });
        assert!(token.is_cancelled());
    }
}
