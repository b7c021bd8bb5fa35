//! JSON snapshots of a DOM tree.
//!
//! A snapshot is how a host environment hands a document to Koala: nested
//! JSON nodes tagged by `type`, with a `shadowRoot` member on elements that
//! host one.
//!
//! ```json
//! { "type": "document", "children": [
//!   { "type": "element", "tagName": "div", "attributes": { "id": "host" },
//!     "shadowRoot": { "mode": "open", "children": [
//!       { "type": "element", "tagName": "span", "children": [
//!         { "type": "text", "content": "inside" } ] } ] } } ] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DomError, DomTree, ElementData, NodeId, NodeType, ShadowRootMode};

/// One node of a serialized DOM tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum NodeSnapshot {
    /// The document node. Only valid at the top of a snapshot.
    Document {
        /// Child nodes, in tree order.
        #[serde(default)]
        children: Vec<NodeSnapshot>,
    },
    /// An element, optionally hosting a shadow root.
    Element {
        /// Local name.
        tag_name: String,
        /// Attribute list.
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        /// Light-tree children, in tree order.
        #[serde(default)]
        children: Vec<NodeSnapshot>,
        /// Attached shadow root, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shadow_root: Option<ShadowRootSnapshot>,
    },
    /// A text node.
    Text {
        /// Character data.
        content: String,
    },
    /// A comment node.
    Comment {
        /// Character data.
        content: String,
    },
}

/// A serialized shadow root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowRootSnapshot {
    /// Open or closed; open when omitted.
    #[serde(default)]
    pub mode: ShadowRootMode,
    /// Shadow-tree children, in tree order.
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

impl DomTree {
    /// Parse a JSON snapshot into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Json`] for malformed JSON and
    /// [`DomError::InvalidSnapshot`] when the structure is not a tree.
    pub fn from_json(json: &str) -> Result<Self, DomError> {
        let snapshot: NodeSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    /// Build a tree from a snapshot.
    ///
    /// A top-level document becomes the tree's document node. Any other
    /// top-level node is appended as the document's only child, which lets
    /// fixtures describe a fragment such as a single `<div>`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidSnapshot`] if a document node appears
    /// anywhere but the top level.
    pub fn from_snapshot(snapshot: &NodeSnapshot) -> Result<Self, DomError> {
        let mut tree = Self::new();
        match snapshot {
            NodeSnapshot::Document { children } => {
                for child in children {
                    tree.load_node(NodeId::ROOT, child)?;
                }
            }
            other => tree.load_node(NodeId::ROOT, other)?,
        }
        Ok(tree)
    }

    fn load_node(&mut self, parent: NodeId, snapshot: &NodeSnapshot) -> Result<(), DomError> {
        let id = match snapshot {
            NodeSnapshot::Document { .. } => {
                return Err(DomError::InvalidSnapshot(
                    "a document node can only appear at the top level".to_string(),
                ));
            }
            NodeSnapshot::Element {
                tag_name,
                attributes,
                children,
                shadow_root,
            } => {
                let id = self.alloc(NodeType::Element(ElementData {
                    tag_name: tag_name.clone(),
                    attrs: attributes.clone().into_iter().collect(),
                }));
                if let Some(shadow) = shadow_root {
                    let root = self.attach_shadow(id, shadow.mode)?;
                    for child in &shadow.children {
                        self.load_node(root, child)?;
                    }
                }
                for child in children {
                    self.load_node(id, child)?;
                }
                id
            }
            NodeSnapshot::Text { content } => self.alloc(NodeType::Text(content.clone())),
            NodeSnapshot::Comment { content } => self.alloc(NodeType::Comment(content.clone())),
        };
        self.append_child(parent, id);
        Ok(())
    }

    /// Serialize the subtree rooted at `id`, shadow trees included.
    ///
    /// A shadow root id serializes as a document fragment would: as the
    /// list of its children wrapped in a document node.
    #[must_use]
    pub fn to_snapshot(&self, id: NodeId) -> NodeSnapshot {
        let children = |node: NodeId| -> Vec<NodeSnapshot> {
            self.children(node)
                .iter()
                .map(|&child| self.to_snapshot(child))
                .collect()
        };
        match self.get(id).map(|n| &n.node_type) {
            Some(NodeType::Element(data)) => NodeSnapshot::Element {
                tag_name: data.tag_name.clone(),
                attributes: data
                    .attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                children: children(id),
                shadow_root: self.shadow_root(id).map(|shadow| ShadowRootSnapshot {
                    mode: self.shadow_root_mode(shadow).unwrap_or_default(),
                    children: children(shadow),
                }),
            },
            Some(NodeType::Text(content)) => NodeSnapshot::Text {
                content: content.clone(),
            },
            Some(NodeType::Comment(content)) => NodeSnapshot::Comment {
                content: content.clone(),
            },
            Some(NodeType::Document | NodeType::ShadowRoot(_)) | None => NodeSnapshot::Document {
                children: children(id),
            },
        }
    }
}
