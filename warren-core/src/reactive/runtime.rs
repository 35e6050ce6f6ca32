//! Reactivity Runtime
//!
//! The runtime is the central coordinator that connects state objects and
//! render scopes. It owns the three pieces of shared bookkeeping:
//!
//! - The **Subscription Registry**: state identity to the scopes that have
//!   read any property of that state. Entries iterate in insertion order, so
//!   dependent re-renders happen in the order scopes first read the state.
//! - The **Attached-Scope Set**: the scopes currently mounted to a host,
//!   held strongly. Attachment alone keeps a scope alive; dropping every
//!   user handle to a mounted scope must not stop its re-renders.
//! - The **render stack**: which scope is currently evaluating its template.
//!   A stack rather than a single slot, so an accidentally re-entrant render
//!   still attributes reads to the innermost scope. Each frame also records
//!   the states it has read, which lets a write-during-read cycle be
//!   rejected instead of recursing.
//!
//! # How It Works
//!
//! 1. Attaching a scope stores its handle in the Attached-Scope Set;
//!    detaching removes it, which is what makes a scope collectible again.
//!
//! 2. Rendering pushes a frame via [`Runtime::enter_render`]; the returned
//!    guard pops it on drop, including during a panic unwind.
//!
//! 3. A tracked state read calls [`Runtime::track_read`], which records the
//!    read in the current frame and subscribes the frame's scope to the
//!    state.
//!
//! 4. A state write calls [`Runtime::notify`], which walks the state's
//!    subscription entry: attached scopes get `update()`, everything else
//!    is pruned.
//!
//! # Sharing
//!
//! `Runtime` is a cheap clone over shared interior state. The
//! [`Runtime::global`] instance backs the crate-level factory functions;
//! tests and embedders that want isolation construct their own. The write
//! path is synchronous and assumes a single logical thread of control per
//! runtime; nothing in the critical path defers or batches.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use dashmap::DashMap;
use indexmap::IndexSet;
use smallvec::SmallVec;

use super::renderable::{Renderable, ScopeId};
use super::state::StateId;
use crate::error::Error;

/// A frame on the render stack: one template evaluation in flight.
struct Frame {
    scope: ScopeId,
    /// States read so far during this evaluation.
    reads: SmallVec<[StateId; 4]>,
}

/// Shared interior of a [`Runtime`].
struct RuntimeInner {
    /// Subscription Registry: state identity to subscribed scope ids.
    /// IndexSet keeps the notification order (first read, first told).
    subscriptions: RwLock<HashMap<StateId, IndexSet<ScopeId>>>,

    /// Attached-Scope Set. Strong handles: a mounted scope stays alive and
    /// reachable for `update()` until it detaches.
    attached: DashMap<ScopeId, Arc<dyn Renderable>>,

    /// Render stack. Top of the stack is the currently rendering scope.
    stack: RwLock<Vec<Frame>>,
}

/// A reactivity context: one Subscription Registry, one Attached-Scope Set,
/// one render stack.
///
/// Clones share the same interior, like the handles elsewhere in this crate.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

/// The process-wide default runtime.
static GLOBAL: OnceLock<Runtime> = OnceLock::new();

impl Runtime {
    /// Create a fresh, isolated runtime.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                subscriptions: RwLock::new(HashMap::new()),
                attached: DashMap::new(),
                stack: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Get the shared process-wide runtime.
    ///
    /// The crate-level [`create_state`](crate::create_state) and
    /// [`create_scope`](crate::create_scope) factories use this instance.
    pub fn global() -> Runtime {
        GLOBAL.get_or_init(Runtime::new).clone()
    }

    // ------------------------------------------------------------------
    // Attached-Scope Set
    // ------------------------------------------------------------------

    /// Add a scope to the Attached-Scope Set, keeping it alive while
    /// mounted.
    pub(crate) fn mark_attached(&self, scope: Arc<dyn Renderable>) {
        self.inner.attached.insert(scope.scope_id(), scope);
    }

    /// Remove a scope from the Attached-Scope Set, releasing the handle.
    ///
    /// Subscription entries are deliberately left in place; they are pruned
    /// lazily on the next notification pass.
    pub(crate) fn mark_detached(&self, id: ScopeId) {
        self.inner.attached.remove(&id);
    }

    /// Check whether a scope is currently attached.
    pub fn is_attached(&self, id: ScopeId) -> bool {
        self.inner.attached.contains_key(&id)
    }

    // ------------------------------------------------------------------
    // Render stack
    // ------------------------------------------------------------------

    /// Push a render frame for the given scope.
    ///
    /// The frame is popped when the returned guard drops, on every exit
    /// path including panics, so a template failure never leaves the stack
    /// dirty.
    pub(crate) fn enter_render(&self, scope: ScopeId) -> RenderGuard {
        let mut stack = self.inner.stack.write().expect("render stack lock poisoned");
        stack.push(Frame { scope, reads: SmallVec::new() });
        drop(stack);

        RenderGuard { runtime: self.clone(), scope }
    }

    /// The scope currently evaluating its template, if any.
    pub fn current_scope(&self) -> Option<ScopeId> {
        let stack = self.inner.stack.read().expect("render stack lock poisoned");
        stack.last().map(|frame| frame.scope)
    }

    // ------------------------------------------------------------------
    // Dependency tracking
    // ------------------------------------------------------------------

    /// Record that the currently rendering scope (if any) read `state`.
    ///
    /// Called by [`State::get`](super::State::get). Outside a render this
    /// does nothing: no dependency without an active render.
    pub(crate) fn track_read(&self, state: StateId) {
        let scope = {
            let mut stack = self.inner.stack.write().expect("render stack lock poisoned");
            match stack.last_mut() {
                Some(frame) => {
                    if !frame.reads.contains(&state) {
                        frame.reads.push(state);
                    }
                    frame.scope
                }
                None => return,
            }
        };

        let mut subs = self.inner.subscriptions.write().expect("subscriptions lock poisoned");
        subs.entry(state).or_default().insert(scope);
    }

    /// Reject a write that would synchronously re-enter an in-flight render.
    ///
    /// A template that writes to a state it has already read this pass would
    /// trigger its own re-render from inside itself, with no bound on the
    /// recursion. Any frame on the stack counts, so nested renders are
    /// covered too.
    pub(crate) fn check_write(&self, state: StateId) -> Result<(), Error> {
        let stack = self.inner.stack.read().expect("render stack lock poisoned");
        for frame in stack.iter() {
            if frame.reads.contains(&state) {
                return Err(Error::WriteDuringRender { state, scope: frame.scope });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------

    /// Notify every scope subscribed to `state` that it changed.
    ///
    /// Attached scopes are asked to `update()` synchronously, in the entry's
    /// insertion order. Detached scopes are pruned from the entry instead.
    /// The subscription lock is released before any `update()` runs so
    /// templates can read (and re-subscribe) freely.
    pub(crate) fn notify(&self, state: StateId) {
        let subscriber_ids: Vec<ScopeId> = {
            let subs = self.inner.subscriptions.read().expect("subscriptions lock poisoned");
            match subs.get(&state) {
                Some(entry) => entry.iter().copied().collect(),
                None => return,
            }
        };

        if subscriber_ids.is_empty() {
            return;
        }

        tracing::trace!(
            state = state.raw(),
            subscribers = subscriber_ids.len(),
            "notifying state change"
        );

        let mut pruned: SmallVec<[ScopeId; 4]> = SmallVec::new();

        for id in subscriber_ids {
            // Clone the handle out so no registry shard lock is held while
            // the scope re-renders.
            let target = self.inner.attached.get(&id).map(|entry| Arc::clone(entry.value()));
            match target {
                Some(scope) => scope.update(),
                None => pruned.push(id),
            }
        }

        if !pruned.is_empty() {
            let mut subs = self.inner.subscriptions.write().expect("subscriptions lock poisoned");
            if let Some(entry) = subs.get_mut(&state) {
                for id in &pruned {
                    entry.shift_remove(id);
                }
            }
        }
    }

    /// Drop the subscription entry for a state whose last handle was dropped.
    ///
    /// The registry keys on ids, not on the state storage itself, so this is
    /// what makes an unreferenced state fully reclaimable.
    pub(crate) fn forget_state(&self, state: StateId) {
        let mut subs = self.inner.subscriptions.write().expect("subscriptions lock poisoned");
        subs.remove(&state);
    }

    /// Number of scopes currently subscribed to a state.
    pub fn subscriber_count(&self, state: StateId) -> usize {
        let subs = self.inner.subscriptions.read().expect("subscriptions lock poisoned");
        subs.get(&state).map(IndexSet::len).unwrap_or(0)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that pops the render stack when dropped.
///
/// Holding the pop in a destructor is what guarantees the stack is restored
/// when a template panics mid-render.
pub(crate) struct RenderGuard {
    runtime: Runtime,
    scope: ScopeId,
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        let mut stack = self.runtime.inner.stack.write().expect("render stack lock poisoned");
        let popped = stack.pop();

        // Catch mismatched push/pop pairs early in debug builds.
        if let Some(frame) = popped {
            debug_assert_eq!(
                frame.scope, self.scope,
                "render stack mismatch: expected {:?}, got {:?}",
                self.scope, frame.scope
            );
        }
    }
}
