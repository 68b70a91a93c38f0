use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Clones observe the same flag. Interpretation checks it on every step and
/// stops with `FailKind::Cancelled` once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancellationScope {
    cancelled: Arc<AtomicBool>,
}

impl CancellationScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let scope = CancellationScope::new();
        let other = scope.clone();
        assert!(!other.is_cancelled());
        scope.cancel();
        assert!(other.is_cancelled());
    }
}
