//! Error types for the reactive runtime.
//!
//! The runtime distinguishes two failure classes (see the module docs on
//! [`crate::reactive`]):
//!
//! - Recoverable attach failures: the ergonomic [`Scope::attach`] logs a
//!   warning and leaves the scope detached; [`Scope::try_attach`] surfaces
//!   the error to callers that want to handle it.
//! - Rejected write cycles: a template writing to a state object it is
//!   currently rendering from would re-enter its own render synchronously.
//!   [`State::try_set`] reports this instead of recursing.
//!
//! [`Scope::attach`]: crate::reactive::Scope::attach
//! [`Scope::try_attach`]: crate::reactive::Scope::try_attach
//! [`State::try_set`]: crate::reactive::State::try_set

use thiserror::Error;

use crate::reactive::{ScopeId, StateId};

/// Errors produced by the reactive runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// The attach target id did not resolve to any element in the document.
    #[error("no element with id `{id}` in the document")]
    HostNotFound {
        /// The id that failed to resolve.
        id: String,
    },

    /// A state object was written while a scope that had already read it in
    /// the current render pass was still rendering. Notifying would re-enter
    /// that render synchronously.
    #[error("state {state:?} written during a render of scope {scope:?} that reads it")]
    WriteDuringRender {
        /// The state that was written.
        state: StateId,
        /// The scope whose in-flight render had read the state.
        scope: ScopeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{ScopeId, StateId};

    #[test]
    fn error_messages_name_the_offender() {
        let err = Error::HostNotFound {
            id: "sidebar".to_string(),
        };
        assert!(err.to_string().contains("sidebar"));

        let err = Error::WriteDuringRender {
            state: StateId::new(),
            scope: ScopeId::new(),
        };
        assert!(err.to_string().contains("written during a render"));
    }
}
