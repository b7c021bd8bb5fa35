//! [`SelectorTree`] for the Koala arena DOM.

use koala_dom::{DomTree, NodeId, NodeType};

use crate::tree::{NodeKind, SelectorTree};

impl SelectorTree for DomTree {
    type Node = NodeId;

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.get(node).map(|n| &n.node_type) {
            Some(NodeType::Document) => NodeKind::Document,
            Some(NodeType::Element(_)) => NodeKind::Element,
            Some(NodeType::ShadowRoot(_)) => NodeKind::ShadowRoot,
            Some(NodeType::Text(_)) => NodeKind::Text,
            Some(NodeType::Comment(_)) | None => NodeKind::Other,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        Self::parent(self, node)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        Self::first_child(self, node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        Self::next_sibling(self, node)
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        Self::prev_sibling(self, node)
    }

    fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.open_shadow_root(host)
    }

    fn shadow_host(&self, shadow_root: NodeId) -> Option<NodeId> {
        self.host(shadow_root)
    }

    fn local_name(&self, element: NodeId) -> Option<&str> {
        self.as_element(element).map(|e| e.tag_name.as_str())
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.as_element(element).and_then(|e| e.attr(name))
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.as_text(node)
    }
}
