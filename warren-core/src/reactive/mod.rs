//! Reactive Primitives
//!
//! This module implements the fine-grained reactive rendering runtime:
//! state wrappers, render scopes, and the runtime that connects them.
//!
//! # Concepts
//!
//! ## State
//!
//! A [`State`] wraps a plain record of properties. When a property is read
//! while a scope's template is rendering, that scope is registered as a
//! dependent of the state. When any property is written, every dependent
//! scope re-renders synchronously, before the write returns.
//!
//! Dependency granularity is the whole state object, not individual keys: a
//! scope that read `a` still re-renders when `b` is written. The trade is
//! simplicity of bookkeeping for occasionally redundant renders.
//!
//! ## Scopes ("burrows")
//!
//! A [`Scope`] binds a template function to at most one container element.
//! It renders into a private wrapper node inside its host, and re-renders on
//! demand when notified. Lifecycle callbacks fire on attach (`connect`) and
//! detach (`disconnect`).
//!
//! ## Runtime
//!
//! The [`Runtime`] holds the shared bookkeeping: which scope reads which
//! state (the Subscription Registry), which scopes are mounted (the
//! Attached-Scope Set), and which scope is currently rendering (the render
//! stack). A process-wide instance backs the crate's factory functions;
//! construct your own for isolated roots or tests.
//!
//! # Implementation Notes
//!
//! Dependency detection is automatic: reading a state property inside a
//! template is all it takes. The render stack makes the attribution correct
//! even if a render nests inside another, and a write to a state that an
//! in-flight render has already read is rejected rather than being allowed
//! to recurse. This "transparent reactivity" approach is the same one used
//! by SolidJS, Vue 3, and Leptos.

mod renderable;
mod runtime;
mod scope;
mod state;
mod value;

pub use renderable::{Renderable, ScopeId};
pub use runtime::Runtime;
pub use scope::{Scope, ScopeOptions, Target};
pub use state::{State, StateId};
pub use value::{Record, Value};
