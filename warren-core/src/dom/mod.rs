//! Document boundary.
//!
//! The reactive core does not render pixels; it patches an element tree.
//! This module is that tree: a minimal document with id lookup, shared node
//! handles, and the [`render_into`] patch primitive that scopes call with
//! their template output.

mod node;
mod render;

pub use node::{Document, NodeRef};
pub use render::{render_into, RenderDescription};
