//! Warren Core
//!
//! This crate provides the reactive rendering runtime for the Warren UI
//! component library. It implements:
//!
//! - Reactive state wrappers with automatic dependency tracking
//! - Render scopes ("burrows") bound to container elements
//! - Synchronous write-to-re-render notification
//! - A minimal document tree and declarative patch primitive
//!
//! The component catalog built on top of this crate is declarative glue;
//! everything that makes `state.set(..)` repaint the right pieces of the
//! page lives here.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: state, scopes, and the runtime that tracks who-read-what
//! - `dom`: the element tree and the `render_into` patch primitive
//!
//! # Example
//!
//! ```rust,ignore
//! use warren_core::{create_scope, create_state, Record};
//!
//! let state = create_state(Record::new().with("count", 0));
//!
//! let state_view = state.clone();
//! let scope = create_scope(move || {
//!     format!("Count: {}", state_view.get("count").unwrap_or_default())
//! });
//!
//! scope.attach("host");       // host renders "Count: 0"
//! state.set("count", 1);      // host renders "Count: 1", synchronously
//! scope.detach();
//! state.set("count", 2);      // no further render
//! ```

pub mod dom;
pub mod error;
pub mod reactive;

pub use dom::{render_into, Document, NodeRef, RenderDescription};
pub use error::Error;
pub use reactive::{Record, Runtime, Scope, ScopeOptions, State, Target, Value};

/// Create a reactive state wrapper around `initial` in the global runtime.
///
/// The state copies the record; later mutations go through
/// [`State::set`](reactive::State::set) and notify dependents.
pub fn create_state(initial: Record) -> State {
    State::new(initial)
}

/// Create a detached render scope in the global runtime and document.
///
/// The template runs once per render and may run any number of times. Use
/// [`Scope::with_options`](reactive::Scope::with_options) for lifecycle
/// callbacks or an explicit runtime.
pub fn create_scope<F, D>(template: F) -> Scope
where
    F: Fn() -> D + Send + Sync + 'static,
    D: Into<RenderDescription>,
{
    Scope::new(template)
}
