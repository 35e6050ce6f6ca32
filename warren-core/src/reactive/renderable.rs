//! Renderable scope identities.
//!
//! A `Renderable` is anything the runtime can ask to re-render: in practice
//! the internals of a [`Scope`](super::Scope). The Attached-Scope Set holds
//! these strongly while a scope is mounted, so a mounted scope keeps
//! re-rendering even after every user handle to it is gone.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a render scope.
///
/// Every scope gets one at construction. The Subscription Registry and the
/// Attached-Scope Set both key on scope ids rather than on the scopes
/// themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Generate a new unique scope ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A unit of templated output the runtime can re-render on demand.
///
/// Implemented by scope internals; the trait exists so the runtime module
/// does not depend on the concrete scope type.
pub trait Renderable: Send + Sync {
    /// The scope's unique ID.
    fn scope_id(&self) -> ScopeId;

    /// Re-render into the existing wrapper node.
    ///
    /// Must be a no-op when the scope is not attached.
    fn update(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_ids_are_unique() {
        let id1 = ScopeId::new();
        let id2 = ScopeId::new();
        let id3 = ScopeId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}
