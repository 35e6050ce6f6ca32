//! Declarative render descriptions and the patch primitive.
//!
//! A template produces a [`RenderDescription`], a plain value describing
//! what the scope's subtree should look like. [`render_into`] makes a
//! container match it. The reconciliation is whole-subtree replacement with
//! no diffing. Re-rendering the same description yields the same container
//! contents, so patching is idempotent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::node::NodeRef;

/// Declarative description of rendered output.
///
/// Serializes to JSON-natural shapes: text as a string, elements as a map,
/// fragments as an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RenderDescription {
    /// A run of text.
    Text(String),
    /// An element with a tag, attributes, and child descriptions.
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        attributes: IndexMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<RenderDescription>,
    },
    /// Multiple siblings with no wrapping element.
    Fragment(Vec<RenderDescription>),
}

impl RenderDescription {
    /// Shorthand for an element with no attributes.
    pub fn element(tag: &str, children: Vec<RenderDescription>) -> Self {
        RenderDescription::Element {
            tag: tag.to_string(),
            attributes: IndexMap::new(),
            children,
        }
    }

    /// Shorthand for a text description.
    pub fn text(content: impl Into<String>) -> Self {
        RenderDescription::Text(content.into())
    }
}

impl From<String> for RenderDescription {
    fn from(s: String) -> Self {
        RenderDescription::Text(s)
    }
}

impl From<&str> for RenderDescription {
    fn from(s: &str) -> Self {
        RenderDescription::Text(s.to_string())
    }
}

impl From<Vec<RenderDescription>> for RenderDescription {
    fn from(children: Vec<RenderDescription>) -> Self {
        RenderDescription::Fragment(children)
    }
}

/// Reconcile `container`'s children to match `description`.
///
/// The container node itself is untouched; only its children are replaced.
pub fn render_into(description: &RenderDescription, container: &NodeRef) {
    let mut children = Vec::new();
    materialize(description, &mut children);
    container.replace_children(children);
}

/// Build concrete nodes for a description. Fragments flatten into the
/// parent's child list.
fn materialize(description: &RenderDescription, out: &mut Vec<NodeRef>) {
    match description {
        RenderDescription::Text(text) => out.push(NodeRef::text(text)),
        RenderDescription::Element {
            tag,
            attributes,
            children,
        } => {
            let node = NodeRef::element(tag);
            for (name, value) in attributes {
                node.set_attribute(name, value);
            }
            let mut child_nodes = Vec::new();
            for child in children {
                materialize(child, &mut child_nodes);
            }
            for child in &child_nodes {
                node.append_child(child);
            }
            out.push(node);
        }
        RenderDescription::Fragment(items) => {
            for item in items {
                materialize(item, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_text_into_container() {
        let container = NodeRef::element("div");
        render_into(&"hello".into(), &container);

        assert_eq!(container.child_count(), 1);
        assert_eq!(container.text_content(), "hello");
    }

    #[test]
    fn render_replaces_previous_children() {
        let container = NodeRef::element("div");

        render_into(&"first".into(), &container);
        render_into(&"second".into(), &container);

        assert_eq!(container.child_count(), 1);
        assert_eq!(container.text_content(), "second");
    }

    #[test]
    fn render_element_with_attributes_and_children() {
        let container = NodeRef::element("div");
        let description = RenderDescription::Element {
            tag: "button".to_string(),
            attributes: IndexMap::from_iter([(
                "class".to_string(),
                "primary".to_string(),
            )]),
            children: vec![RenderDescription::text("Click")],
        };

        render_into(&description, &container);

        let button = &container.children()[0];
        assert_eq!(button.tag().as_deref(), Some("button"));
        assert_eq!(button.attribute("class").as_deref(), Some("primary"));
        assert_eq!(button.text_content(), "Click");
    }

    #[test]
    fn fragments_flatten_into_siblings() {
        let container = NodeRef::element("div");
        let description = RenderDescription::Fragment(vec![
            RenderDescription::text("a"),
            RenderDescription::element("span", vec![RenderDescription::text("b")]),
            RenderDescription::text("c"),
        ]);

        render_into(&description, &container);

        assert_eq!(container.child_count(), 3);
        assert_eq!(container.text_content(), "abc");
    }

    #[test]
    fn description_serializes_to_natural_json() {
        let description = RenderDescription::Element {
            tag: "p".to_string(),
            attributes: IndexMap::new(),
            children: vec![RenderDescription::text("hi")],
        };

        let json = serde_json::to_string(&description).expect("serialize");
        assert_eq!(json, r#"{"tag":"p","children":["hi"]}"#);

        let back: RenderDescription = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, description);
    }
}
