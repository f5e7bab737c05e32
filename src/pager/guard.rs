//! Abort guard - logical cancellation of in-flight window operations

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Monotonic counter shared by every operation that mutates a window.
///
/// An operation takes a [`Ticket`] before its first await. [`AbortGuard::abort`]
/// bumps the counter, which makes every outstanding ticket stale: the
/// operation still finishes its network calls but must not commit.
#[derive(Debug, Default)]
pub struct AbortGuard {
    generation: AtomicU64,
    discarded: AtomicUsize,
}

/// Generation captured at the start of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl AbortGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation.load(Ordering::SeqCst))
    }

    pub fn abort(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Record that a stale completion was dropped
    pub fn note_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of completions dropped because their ticket went stale
    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::Relaxed)
    }
}
