//! Render Scope ("Burrow")
//!
//! A scope is a unit of templated output bound to at most one container
//! element at a time. It owns a private wrapper node inside the host and can
//! re-render itself on demand; the runtime asks it to do exactly that when a
//! state it read is written.
//!
//! # Lifecycle
//!
//! ```text
//! build (detached) --attach--> mounted --detach--> detached
//!        ^                        |
//!        '---- attach re-homes ---'
//! ```
//!
//! - `attach` on an already-attached scope detaches first, so a scope is
//!   never mounted in two places.
//! - `attach` with an unresolvable id logs a warning and leaves the scope
//!   fully detached; it never panics for a missing host.
//! - `detach` and `update` on a detached scope are silent no-ops.
//! - While attached, the runtime holds the scope alive; dropping every user
//!   handle does not stop its re-renders. Detaching releases that hold.
//!
//! # Rendering
//!
//! Every render re-invokes the template function inside a render frame (see
//! [`Runtime`]), passes the resulting [`RenderDescription`] to
//! [`render_into`] against the private wrapper node, and pops the frame. The
//! template must therefore be callable any number of times.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use super::renderable::{Renderable, ScopeId};
use super::runtime::Runtime;
use crate::dom::{render_into, Document, NodeRef, RenderDescription};
use crate::error::Error;

/// Tag used for the private wrapper element a scope renders into.
const WRAPPER_TAG: &str = "warren-burrow";

/// An attach target: an element id to resolve in the document, or a concrete
/// node reference.
#[derive(Clone)]
pub enum Target {
    /// Resolve by `id` attribute at attach time.
    Id(String),
    /// Use the node directly.
    Node(NodeRef),
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::Id(id.to_string())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Target::Id(id)
    }
}

impl From<NodeRef> for Target {
    fn from(node: NodeRef) -> Self {
        Target::Node(node)
    }
}

/// Optional scope configuration for [`Scope::with_options`].
///
/// Every field defaults to off; the global runtime and document fill the
/// `None`s.
#[derive(Default)]
pub struct ScopeOptions {
    /// Callback invoked after each successful attach.
    pub connect: Option<Box<dyn Fn() + Send + Sync>>,
    /// Callback invoked after each detach.
    pub disconnect: Option<Box<dyn Fn() + Send + Sync>>,
    /// Reactivity context to register with instead of the global one.
    pub runtime: Option<Runtime>,
    /// Document to resolve attach targets in instead of the global one.
    pub document: Option<Document>,
}

/// Host and wrapper references held while the scope is mounted.
struct Mounted {
    host: NodeRef,
    wrapper: NodeRef,
}

/// Shared interior of a [`Scope`]; the runtime holds it as a [`Renderable`]
/// while the scope is attached.
struct ScopeInner {
    id: ScopeId,
    template: Box<dyn Fn() -> RenderDescription + Send + Sync>,
    connect: Box<dyn Fn() + Send + Sync>,
    disconnect: Box<dyn Fn() + Send + Sync>,
    mounted: RwLock<Option<Mounted>>,
    runtime: Runtime,
    document: Document,
}

impl ScopeInner {
    /// Run the template inside a render frame and patch `wrapper`.
    fn render(&self, wrapper: &NodeRef) {
        let _frame = self.runtime.enter_render(self.id);
        let description = (self.template)();
        render_into(&description, wrapper);
    }

    /// Re-render into the current wrapper, if mounted.
    fn render_existing(&self) {
        let wrapper = self
            .mounted
            .read()
            .expect("mounted lock poisoned")
            .as_ref()
            .map(|m| m.wrapper.clone());

        if let Some(wrapper) = wrapper {
            self.render(&wrapper);
        }
    }
}

impl Renderable for ScopeInner {
    fn scope_id(&self) -> ScopeId {
        self.id
    }

    fn update(&self) {
        self.render_existing();
    }
}

/// A render scope. Clones share the same underlying scope.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Create a detached scope in the global runtime and document, with
    /// no-op lifecycle callbacks.
    pub fn new<F, D>(template: F) -> Self
    where
        F: Fn() -> D + Send + Sync + 'static,
        D: Into<RenderDescription>,
    {
        Self::with_options(template, ScopeOptions::default())
    }

    /// Create a detached scope with lifecycle callbacks or an explicit
    /// runtime/document.
    pub fn with_options<F, D>(template: F, options: ScopeOptions) -> Self
    where
        F: Fn() -> D + Send + Sync + 'static,
        D: Into<RenderDescription>,
    {
        let inner = Arc::new(ScopeInner {
            id: ScopeId::new(),
            template: Box::new(move || template().into()),
            connect: options.connect.unwrap_or_else(|| Box::new(|| {})),
            disconnect: options.disconnect.unwrap_or_else(|| Box::new(|| {})),
            mounted: RwLock::new(None),
            runtime: options.runtime.unwrap_or_else(Runtime::global),
            document: options.document.unwrap_or_else(Document::global),
        });

        Scope { inner }
    }

    /// Get the scope's unique ID.
    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Mount the scope under `target`, re-homing if already mounted.
    ///
    /// An unresolvable target id logs a warning and leaves the scope
    /// detached.
    pub fn attach(&self, target: impl Into<Target>) {
        if let Err(err) = self.try_attach(target) {
            tracing::warn!(scope = self.inner.id.raw(), %err, "attach failed");
        }
    }

    /// Mount the scope under `target`, reporting a failed resolution.
    ///
    /// The sequence on success: detach from any previous host, resolve the
    /// target, insert a fresh wrapper node, render the template into it,
    /// join the Attached-Scope Set, then invoke `connect`.
    pub fn try_attach(&self, target: impl Into<Target>) -> Result<(), Error> {
        // Re-homing: never mounted in two places.
        self.detach();

        let host = match target.into() {
            Target::Node(node) => node,
            Target::Id(id) => self
                .inner
                .document
                .get_element_by_id(&id)
                .ok_or(Error::HostNotFound { id })?,
        };

        let wrapper = self.inner.document.create_element(WRAPPER_TAG);
        host.append_child(&wrapper);

        // A template panic propagates from here with the wrapper already in
        // the host and the scope still detached; no rollback is attempted.
        self.inner.render(&wrapper);

        *self.inner.mounted.write().expect("mounted lock poisoned") = Some(Mounted {
            host,
            wrapper,
        });
        self.inner.runtime.mark_attached(self.inner.clone());

        tracing::debug!(scope = self.inner.id.raw(), "attached");
        (self.inner.connect)();
        Ok(())
    }

    /// Unmount the scope: remove the wrapper from the document, leave the
    /// Attached-Scope Set, invoke `disconnect`, clear references.
    ///
    /// No-op when already detached; `disconnect` fires once per transition.
    pub fn detach(&self) {
        let mounted = self
            .inner
            .mounted
            .write()
            .expect("mounted lock poisoned")
            .take();

        let Some(mounted) = mounted else { return };

        mounted.host.remove_child(&mounted.wrapper);
        self.inner.runtime.mark_detached(self.inner.id);

        tracing::debug!(scope = self.inner.id.raw(), "detached");
        (self.inner.disconnect)();
    }

    /// Re-run the template and re-patch the wrapper node.
    ///
    /// No-op when detached: there is no wrapper to render into.
    pub fn update(&self) {
        self.inner.render_existing();
    }

    /// The host element this scope is mounted under, if any.
    pub fn host(&self) -> Option<NodeRef> {
        self.inner
            .mounted
            .read()
            .expect("mounted lock poisoned")
            .as_ref()
            .map(|m| m.host.clone())
    }

    /// Check whether the scope is currently mounted.
    pub fn is_attached(&self) -> bool {
        self.inner.runtime.is_attached(self.inner.id)
    }
}

impl Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn fixture() -> (Runtime, Document, NodeRef) {
        let runtime = Runtime::new();
        let document = Document::new();
        let host = document.create_element("div");
        host.set_attribute("id", "host");
        document.root().append_child(&host);
        (runtime, document, host)
    }

    fn options(runtime: Runtime, document: Document) -> ScopeOptions {
        ScopeOptions {
            runtime: Some(runtime),
            document: Some(document),
            ..ScopeOptions::default()
        }
    }

    #[test]
    fn attach_renders_into_wrapper() {
        let (runtime, document, host) = fixture();

        let scope = Scope::with_options(|| "hello", options(runtime, document));
        scope.attach("host");

        assert!(scope.is_attached());
        assert_eq!(host.text_content(), "hello");
        assert_eq!(host.child_count(), 1);
    }

    #[test]
    fn attach_unknown_id_is_a_warned_noop() {
        let (runtime, document, _host) = fixture();

        let scope = Scope::with_options(|| "hello", options(runtime, document));
        scope.attach("nowhere");

        assert!(!scope.is_attached());
        assert!(scope.host().is_none());

        let err = scope.try_attach("nowhere").unwrap_err();
        assert!(matches!(err, Error::HostNotFound { .. }));
    }

    #[test]
    fn detach_is_idempotent() {
        let (runtime, document, host) = fixture();

        let disconnects = Arc::new(AtomicI32::new(0));
        let disconnects_clone = disconnects.clone();

        let scope = Scope::with_options(
            || "x",
            ScopeOptions {
                disconnect: Some(Box::new(move || {
                    disconnects_clone.fetch_add(1, Ordering::SeqCst);
                })),
                ..options(runtime, document)
            },
        );

        scope.attach("host");
        assert_eq!(host.child_count(), 1);

        scope.detach();
        scope.detach();

        assert_eq!(host.child_count(), 0);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn attach_rehomes_to_new_host() {
        let (runtime, document, host_a) = fixture();
        let host_b = document.create_element("div");
        host_b.set_attribute("id", "other");
        document.root().append_child(&host_b);

        let connects = Arc::new(AtomicI32::new(0));
        let disconnects = Arc::new(AtomicI32::new(0));
        let connects_clone = connects.clone();
        let disconnects_clone = disconnects.clone();

        let scope = Scope::with_options(
            || "moving",
            ScopeOptions {
                connect: Some(Box::new(move || {
                    connects_clone.fetch_add(1, Ordering::SeqCst);
                })),
                disconnect: Some(Box::new(move || {
                    disconnects_clone.fetch_add(1, Ordering::SeqCst);
                })),
                ..options(runtime, document)
            },
        );

        scope.attach("host");
        scope.attach("other");

        assert_eq!(host_a.child_count(), 0);
        assert_eq!(host_b.child_count(), 1);
        assert_eq!(host_b.text_content(), "moving");
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn update_on_detached_scope_is_a_noop() {
        let (runtime, document, _host) = fixture();

        let renders = Arc::new(AtomicI32::new(0));
        let renders_clone = renders.clone();

        let scope = Scope::with_options(
            move || {
                renders_clone.fetch_add(1, Ordering::SeqCst);
                "x"
            },
            options(runtime, document),
        );

        scope.update();
        assert_eq!(renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn host_is_readable_while_attached() {
        let (runtime, document, host) = fixture();

        let scope = Scope::with_options(|| "x", options(runtime, document));

        assert!(scope.host().is_none());

        scope.attach(host.clone());
        assert!(scope.host().expect("attached").is_same(&host));

        scope.detach();
        assert!(scope.host().is_none());
    }
}
