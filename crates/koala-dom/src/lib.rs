//! DOM tree implementation for the Koala selector engine.
//!
//! This crate provides an arena-based DOM tree structure following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/), including
//! [shadow trees](https://dom.spec.whatwg.org/#shadow-trees).
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships,
//! providing O(1) access and traversal without borrow checker issues.
//!
//! A shadow root is an ordinary arena node of type [`NodeType::ShadowRoot`].
//! It has no parent; instead it records its host, and the host records it.
//! This mirrors the standard: "A shadow root's parent is always null" while
//! "a shadow root has an associated host".

use std::collections::HashMap;

use thiserror::Error;

pub mod snapshot;

pub use snapshot::{NodeSnapshot, ShadowRootSnapshot};

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// Errors raised while building or loading a DOM tree.
#[derive(Debug, Error)]
pub enum DomError {
    /// [§ 4.2.14 attachShadow()](https://dom.spec.whatwg.org/#dom-element-attachshadow)
    /// "If this is not an element, throw a NotSupportedError."
    #[error("node {0:?} is not an element and cannot host a shadow root")]
    NotAnElement(NodeId),

    /// "If this is a shadow host, then throw a NotSupportedError."
    #[error("node {0:?} already hosts a shadow root")]
    ShadowRootAlreadyAttached(NodeId),

    /// A snapshot could not be turned into a tree.
    #[error("invalid DOM snapshot: {0}")]
    InvalidSnapshot(String),

    /// The snapshot was not valid JSON.
    #[error("failed to read DOM snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// A type-safe index into the DOM tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// NodeId provides O(1) access to any node in the tree without borrowing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
///
/// This node stores indices for parent/child/sibling relationships,
/// enabling O(1) traversal in any direction.
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    ///
    /// Always `None` for shadow roots.
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    pub prev_sibling: Option<NodeId>,

    /// [§ 4.9](https://dom.spec.whatwg.org/#concept-element-shadow-root)
    /// "Elements have an associated shadow root (null or a shadow root)."
    pub shadow_root: Option<NodeId>,

    /// [§ 4.8](https://dom.spec.whatwg.org/#concept-documentfragment-host)
    /// The host element, set only on shadow roots.
    pub host: Option<NodeId>,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    /// "Element nodes are simply known as elements."
    Element(ElementData),
    /// [§ 4.8 Interface ShadowRoot](https://dom.spec.whatwg.org/#interface-shadowroot)
    /// "Shadow roots's associated mode is either "open" or "closed"."
    ShadowRoot(ShadowRootMode),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// [§ 4.8](https://dom.spec.whatwg.org/#shadowroot-mode)
///
/// Only open shadow roots are reachable through `Element.shadowRoot`, and
/// so only open shadow roots are pierced by selector queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowRootMode {
    /// `attachShadow({ mode: "open" })`
    #[default]
    Open,
    /// `attachShadow({ mode: "closed" })`
    Closed,
}

/// Element-specific data.
///
/// NOTE: Only the local name and attribute list are stored. Namespaces and
/// custom element state are not modeled.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// "An element's local name"
    pub tag_name: String,
    /// "An element has an associated attribute list"
    pub attrs: AttributesMap,
}

impl ElementData {
    /// Create element data from a tag name and `(name, value)` pairs.
    pub fn new<'a>(tag: &str, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            tag_name: tag.to_string(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&String> {
        self.attrs.get("id")
    }

    /// Look up an attribute value.
    ///
    /// [§ 4.9](https://dom.spec.whatwg.org/#concept-element-attributes-get-by-name)
    /// Names are matched exactly first, then ASCII case-insensitively, since
    /// HTML attribute names are case-insensitive.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(name)
            .or_else(|| {
                self.attrs
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }
}

/// Arena-based DOM tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// All nodes, including shadow roots, live in one contiguous vector and
/// refer to each other by index.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by NodeId.
    /// The Document node is always at index 0 (NodeId::ROOT).
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new DOM tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::detached(NodeType::Document)],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should always have at least the Document).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::detached(node_type));
        id
    }

    /// Allocate a detached element.
    pub fn create_element<'a>(
        &mut self,
        tag: &str,
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> NodeId {
        self.alloc(NodeType::Element(ElementData::new(tag, attrs)))
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeType::Text(text.to_string()))
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// Appends `child` as the last child of `parent`, updating all relationships.
    ///
    /// # Panics
    ///
    /// Panics if either id does not belong to this tree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// [§ 4.2.14 attachShadow()](https://dom.spec.whatwg.org/#dom-element-attachshadow)
    ///
    /// "Let shadow be a new shadow root whose node document is element's node
    /// document, host is element, and mode is init["mode"]. Set element's
    /// shadow root to shadow."
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotAnElement`] if `host` is not an element, and
    /// [`DomError::ShadowRootAlreadyAttached`] if it already hosts one.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId, DomError> {
        if self.as_element(host).is_none() {
            return Err(DomError::NotAnElement(host));
        }
        if self.nodes[host.0].shadow_root.is_some() {
            return Err(DomError::ShadowRootAlreadyAttached(host));
        }
        let shadow = self.alloc(NodeType::ShadowRoot(mode));
        self.nodes[shadow.0].host = Some(host);
        self.nodes[host.0].shadow_root = Some(shadow);
        Ok(shadow)
    }

    /// The shadow root attached to `host`, regardless of its mode.
    #[must_use]
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.get(host).and_then(|n| n.shadow_root)
    }

    /// The shadow root attached to `host`, if it is open.
    ///
    /// [§ 4.9](https://dom.spec.whatwg.org/#dom-element-shadowroot)
    /// "If shadow is null or its mode is "closed", then return null."
    #[must_use]
    pub fn open_shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.shadow_root(host)
            .filter(|&shadow| self.shadow_root_mode(shadow) == Some(ShadowRootMode::Open))
    }

    /// The mode of `id` if it is a shadow root.
    #[must_use]
    pub fn shadow_root_mode(&self, id: NodeId) -> Option<ShadowRootMode> {
        self.get(id).and_then(|n| match n.node_type {
            NodeType::ShadowRoot(mode) => Some(mode),
            _ => None,
        })
    }

    /// The host of a shadow root.
    #[must_use]
    pub fn host(&self, shadow: NodeId) -> Option<NodeId> {
        self.get(shadow).and_then(|n| n.host)
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    ///
    /// The walk stays inside one tree: it ends at a shadow root rather
    /// than continuing into the host.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// [§ 4.4 textContent](https://dom.spec.whatwg.org/#dom-node-textcontent)
    ///
    /// "The descendant text content of a node is the concatenation of the data
    /// of all the Text node descendants of node, in tree order."
    ///
    /// Shadow trees are not part of the descendant text content.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match self.get(child).map(|n| &n.node_type) {
                Some(NodeType::Text(text)) => out.push_str(text),
                Some(NodeType::Element(_)) => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| self.as_element(id).is_some())
            .copied()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    const fn detached(node_type: NodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
            shadow_root: None,
            host: None,
        }
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
