//! Element tree.
//!
//! A deliberately small stand-in for a browser document: element and text
//! nodes, attributes, children, id lookup. The reactive core only needs a
//! container it can resolve attach targets in, insert wrapper nodes into,
//! and hand to [`render_into`](super::render_into); backends with a real
//! document swap in at this seam.

use std::fmt::Debug;
use std::sync::{Arc, OnceLock, RwLock};

use indexmap::IndexMap;

/// Node payload: an element with tag and attributes, or a run of text.
enum NodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
    },
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    children: Vec<NodeRef>,
}

/// Shared handle to a node. Clones refer to the same node; identity
/// comparisons use [`NodeRef::is_same`].
#[derive(Clone)]
pub struct NodeRef {
    data: Arc<RwLock<NodeData>>,
}

impl NodeRef {
    /// Create a detached element node.
    pub fn element(tag: &str) -> Self {
        Self {
            data: Arc::new(RwLock::new(NodeData {
                kind: NodeKind::Element {
                    tag: tag.to_string(),
                    attributes: IndexMap::new(),
                },
                children: Vec::new(),
            })),
        }
    }

    /// Create a text node.
    pub fn text(content: &str) -> Self {
        Self {
            data: Arc::new(RwLock::new(NodeData {
                kind: NodeKind::Text(content.to_string()),
                children: Vec::new(),
            })),
        }
    }

    /// The element tag, or `None` for text nodes.
    pub fn tag(&self) -> Option<String> {
        match &self.data.read().expect("node lock poisoned").kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Set an attribute. No-op on text nodes.
    pub fn set_attribute(&self, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } =
            &mut self.data.write().expect("node lock poisoned").kind
        {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Read an attribute.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.data.read().expect("node lock poisoned").kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Append a child node.
    pub fn append_child(&self, child: &NodeRef) {
        self.data
            .write()
            .expect("node lock poisoned")
            .children
            .push(child.clone());
    }

    /// Remove a child by identity. No-op if the node is not a child.
    pub fn remove_child(&self, child: &NodeRef) {
        self.data
            .write()
            .expect("node lock poisoned")
            .children
            .retain(|c| !c.is_same(child));
    }

    /// Replace all children at once.
    pub(crate) fn replace_children(&self, children: Vec<NodeRef>) {
        self.data.write().expect("node lock poisoned").children = children;
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.data.read().expect("node lock poisoned").children.len()
    }

    /// Snapshot of the direct children.
    pub fn children(&self) -> Vec<NodeRef> {
        self.data.read().expect("node lock poisoned").children.clone()
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        let data = self.data.read().expect("node lock poisoned");
        if let NodeKind::Text(text) = &data.kind {
            out.push_str(text);
        }
        for child in &data.children {
            child.collect_text(out);
        }
    }

    /// Identity comparison: do both handles refer to the same node?
    pub fn is_same(&self, other: &NodeRef) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Depth-first search for an element with the given `id` attribute.
    fn find_by_id(&self, id: &str) -> Option<NodeRef> {
        if self.attribute("id").as_deref() == Some(id) {
            return Some(self.clone());
        }
        let children = self.children();
        for child in children {
            if let Some(found) = child.find_by_id(id) {
                return Some(found);
            }
        }
        None
    }
}

impl Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read().expect("node lock poisoned");
        match &data.kind {
            NodeKind::Element { tag, .. } => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("children", &data.children.len())
                .finish(),
            NodeKind::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

/// A document root with id-based element lookup.
///
/// Clones share the same tree. [`Document::global`] is the process-wide
/// default the factory functions resolve attach targets against; tests
/// construct their own for isolation.
#[derive(Clone, Debug)]
pub struct Document {
    root: NodeRef,
}

/// The process-wide default document.
static GLOBAL: OnceLock<Document> = OnceLock::new();

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            root: NodeRef::element("document"),
        }
    }

    /// Get the shared process-wide document.
    pub fn global() -> Document {
        GLOBAL.get_or_init(Document::new).clone()
    }

    /// The document root node.
    pub fn root(&self) -> NodeRef {
        self.root.clone()
    }

    /// Create a detached element belonging to this document.
    pub fn create_element(&self, tag: &str) -> NodeRef {
        NodeRef::element(tag)
    }

    /// Find an element anywhere in the tree by its `id` attribute.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.root.find_by_id(id)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
