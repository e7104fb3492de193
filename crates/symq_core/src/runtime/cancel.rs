use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation signal.
///
/// Cancellation is best effort. The flag is observed when a cursor is opened
/// and between elements as the cursor is polled; rewriting and compilation
/// have no cancellation points.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to everything holding a clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_visible_through_clones() {
        let token = CancelToken::new();
        let cloned = token.clone();
        assert!(!cloned.is_cancelled());

        token.cancel();
        assert!(cloned.is_cancelled());
    }
}
