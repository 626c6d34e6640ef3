//! Single-flight guard for job ticks.

use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a job's run flag for the duration of a tick and clears it on drop,
/// however the tick ends.
pub(crate) struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    /// `None` when the flag is already held.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_and_resets() {
        let flag = AtomicBool::new(false);
        {
            let guard = RunGuard::acquire(&flag);
            assert!(guard.is_some());
            assert!(RunGuard::acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::SeqCst));
        assert!(RunGuard::acquire(&flag).is_some());
    }
}
