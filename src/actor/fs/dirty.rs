use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "sources changed since the last build" flag.
///
/// Set by the Change Source on every qualifying event, taken by the
/// Debounced Trigger once per tick. `take` is a single atomic swap, so a
/// `mark` racing with it either lands before (and is consumed) or after
/// (and is seen by the next tick); it is never lost.
#[derive(Clone, Default, Debug)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Test-and-clear. Returns whether the flag was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
