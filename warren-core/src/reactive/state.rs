//! Reactive State Wrapper
//!
//! A [`State`] wraps a plain [`Record`] and intercepts reads and writes:
//!
//! 1. A property read inside a rendering template subscribes that template's
//!    scope to this state as a whole, not to the individual key. Coarse
//!    invalidation is deliberate: any later write to any property re-renders
//!    every scope that read any property.
//!
//! 2. A property write stores the value and then synchronously re-renders
//!    every still-attached subscriber, before the write returns. There is no
//!    equality short-circuit and no batching; every write is treated as a
//!    change.
//!
//! # Identity
//!
//! The Subscription Registry keys on [`StateId`], not on value. Clones of a
//! `State` share identity and storage, like the shared-handle types elsewhere
//! in this crate. When the last clone drops, the registry entry is reclaimed;
//! the registry itself never holds the state's storage alive.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::runtime::Runtime;
use super::value::{Record, Value};
use crate::error::Error;

/// Unique identity of a state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(u64);

impl StateId {
    /// Generate a new unique state ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for StateId {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the Subscription Registry entry once the last state clone drops.
struct Registration {
    id: StateId,
    runtime: Runtime,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.runtime.forget_state(self.id);
    }
}

/// A reactive record: reads register render-scope dependencies, writes
/// re-render the dependents.
///
/// # Example
///
/// ```rust,ignore
/// let state = create_state(Record::new().with("count", 0));
///
/// // Inside a template, this read subscribes the rendering scope:
/// let count = state.get("count").unwrap_or_default();
///
/// // This write re-renders every attached subscriber before returning:
/// state.set("count", 1);
/// ```
pub struct State {
    /// Identity of this state object.
    id: StateId,

    /// The property storage. A copy of the caller's record, never a view
    /// into it.
    values: Arc<RwLock<Record>>,

    /// The reactivity context this state notifies through.
    runtime: Runtime,

    /// Shared drop guard; reclaims the registry entry with the last clone.
    _registration: Arc<Registration>,
}

impl State {
    /// Create a state in the shared global runtime.
    pub fn new(initial: Record) -> Self {
        Self::with_runtime(&Runtime::global(), initial)
    }

    /// Create a state in an explicit runtime.
    pub fn with_runtime(runtime: &Runtime, initial: Record) -> Self {
        let id = StateId::new();
        Self {
            id,
            values: Arc::new(RwLock::new(initial)),
            runtime: runtime.clone(),
            _registration: Arc::new(Registration {
                id,
                runtime: runtime.clone(),
            }),
        }
    }

    /// Get the state's unique ID.
    pub fn id(&self) -> StateId {
        self.id
    }

    /// Read a property.
    ///
    /// If a scope is currently rendering, it becomes a subscriber of this
    /// state, whether or not the key exists. Returns `None` for a missing
    /// key.
    pub fn get(&self, key: &str) -> Option<Value> {
        // Even a miss is a read of the object for dependency purposes.
        self.runtime.track_read(self.id);
        self.get_untracked(key)
    }

    /// Read a property without establishing a dependency.
    pub fn get_untracked(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .expect("state values lock poisoned")
            .get(key)
            .cloned()
    }

    /// Write a property and synchronously re-render all attached
    /// subscribers.
    ///
    /// If the write happens while a scope that has read this state is still
    /// rendering, the value is stored but the notification pass is skipped
    /// with a logged warning (see [`State::try_set`] for the reportable
    /// form).
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        if let Err(err) = self.try_set(key, value) {
            tracing::warn!(state = self.id.raw(), key, %err, "skipping notification");
        }
    }

    /// Write a property, reporting a rejected write cycle.
    ///
    /// The value is stored in every case; the error only means the dependent
    /// re-renders were skipped because they would have re-entered an
    /// in-flight render of this same state.
    pub fn try_set(&self, key: &str, value: impl Into<Value>) -> Result<(), Error> {
        {
            let mut values = self.values.write().expect("state values lock poisoned");
            values.insert(key, value);
        }

        self.runtime.check_write(self.id)?;
        self.runtime.notify(self.id);
        Ok(())
    }

    /// Read-modify-write a property in one step.
    ///
    /// The read is untracked; the write notifies as usual.
    pub fn update<F>(&self, key: &str, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let new_value = {
            let values = self.values.read().expect("state values lock poisoned");
            f(values.get(key).unwrap_or(&Value::Null))
        };
        self.set(key, new_value);
    }

    /// Number of scopes currently subscribed to this state.
    pub fn subscriber_count(&self) -> usize {
        self.runtime.subscriber_count(self.id)
    }
}

impl Clone for State {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            values: Arc::clone(&self.values),
            runtime: self.runtime.clone(),
            _registration: Arc::clone(&self._registration),
        }
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field(
                "values",
                &*self.values.read().expect("state values lock poisoned"),
            )
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_get_and_set() {
        let runtime = Runtime::new();
        let state = State::with_runtime(&runtime, Record::new().with("count", 0));

        assert_eq!(state.get("count"), Some(Value::Int(0)));

        state.set("count", 42);
        assert_eq!(state.get("count"), Some(Value::Int(42)));
    }

    #[test]
    fn state_missing_key_reads_none() {
        let runtime = Runtime::new();
        let state = State::with_runtime(&runtime, Record::new());

        assert_eq!(state.get("ghost"), None);
        assert_eq!(state.get_untracked("ghost"), None);
    }

    #[test]
    fn state_update_applies_closure() {
        let runtime = Runtime::new();
        let state = State::with_runtime(&runtime, Record::new().with("count", 10));

        state.update("count", |v| {
            Value::Int(v.as_int().unwrap_or_default() + 5)
        });
        assert_eq!(state.get("count"), Some(Value::Int(15)));
    }

    #[test]
    fn state_write_without_subscribers_only_stores() {
        let runtime = Runtime::new();
        let state = State::with_runtime(&runtime, Record::new().with("a", 1));

        state.set("a", 2);

        assert_eq!(state.get_untracked("a"), Some(Value::Int(2)));
        assert_eq!(state.subscriber_count(), 0);
    }

    #[test]
    fn state_clone_shares_storage_and_identity() {
        let runtime = Runtime::new();
        let state1 = State::with_runtime(&runtime, Record::new().with("x", 1));
        let state2 = state1.clone();

        assert_eq!(state1.id(), state2.id());

        state1.set("x", 9);
        assert_eq!(state2.get("x"), Some(Value::Int(9)));
    }

    #[test]
    fn state_ids_are_unique() {
        let runtime = Runtime::new();
        let s1 = State::with_runtime(&runtime, Record::new());
        let s2 = State::with_runtime(&runtime, Record::new());

        assert_ne!(s1.id(), s2.id());
    }

    #[test]
    fn dropping_last_clone_reclaims_registry_entry() {
        let runtime = Runtime::new();
        let state = State::with_runtime(&runtime, Record::new().with("a", 1));
        let id = state.id();

        // Subscribe a fake scope by reading inside a render frame.
        let scope = crate::reactive::ScopeId::new();
        {
            let _frame = runtime.enter_render(scope);
            state.get("a");
        }
        assert_eq!(runtime.subscriber_count(id), 1);

        drop(state);
        assert_eq!(runtime.subscriber_count(id), 0);
    }
}
