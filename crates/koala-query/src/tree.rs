//! The node capability interface the matcher runs against.
//!
//! The engine never touches a concrete DOM. Everything it needs from a host
//! environment is expressed by [`SelectorTree`]: light-tree navigation,
//! element data, and access to attached shadow roots. `koala_dom::DomTree`
//! implements it in [`crate::adapter`].

use std::fmt;
use std::hash::Hash;

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// The node types the matcher distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node.
    Document,
    /// An element.
    Element,
    /// A shadow root (a document fragment with a host).
    ShadowRoot,
    /// A text node.
    Text,
    /// Comments, processing instructions, doctypes.
    Other,
}

/// Read-only access to a DOM tree that may contain shadow roots.
///
/// All navigation methods describe the *light* tree: a shadow root has no
/// parent, and the children of a shadow root have the shadow root as their
/// parent. Crossing into a shadow tree goes through
/// [`shadow_root`](Self::shadow_root), and crossing out through
/// [`shadow_host`](Self::shadow_host).
///
/// The tree must not change while a query runs.
pub trait SelectorTree {
    /// A cheap handle identifying one node of this tree.
    type Node: Copy + Eq + Hash + fmt::Debug;

    /// What kind of node `node` is.
    fn kind(&self, node: Self::Node) -> NodeKind;

    /// The light-tree parent. `None` for the document and for shadow roots.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// First child in tree order.
    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;

    /// Next sibling in tree order.
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Previous sibling in tree order.
    fn prev_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// The *open* shadow root attached to `host`.
    ///
    /// Closed shadow roots are invisible to selector queries and must be
    /// reported as `None`.
    fn shadow_root(&self, host: Self::Node) -> Option<Self::Node>;

    /// The host element of a shadow root.
    fn shadow_host(&self, shadow_root: Self::Node) -> Option<Self::Node>;

    /// Local name of an element; `None` for other nodes.
    fn local_name(&self, element: Self::Node) -> Option<&str>;

    /// Value of an attribute on an element.
    fn attribute(&self, element: Self::Node, name: &str) -> Option<&str>;

    /// Character data of a text node.
    fn text(&self, node: Self::Node) -> Option<&str>;

    /// Whether `node` is an element.
    fn is_element(&self, node: Self::Node) -> bool {
        self.kind(node) == NodeKind::Element
    }

    /// Iterate over the children of `node`.
    fn children(&self, node: Self::Node) -> Children<'_, Self>
    where
        Self: Sized,
    {
        Children {
            tree: self,
            next: self.first_child(node),
        }
    }

    /// The light-tree parent if it is an element.
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node> {
        self.parent(node).filter(|&p| self.is_element(p))
    }

    /// The closest preceding sibling that is an element.
    fn prev_element_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        let mut current = self.prev_sibling(node);
        while let Some(sibling) = current {
            if self.is_element(sibling) {
                return Some(sibling);
            }
            current = self.prev_sibling(sibling);
        }
        None
    }

    /// The closest following sibling that is an element.
    fn next_element_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        let mut current = self.next_sibling(node);
        while let Some(sibling) = current {
            if self.is_element(sibling) {
                return Some(sibling);
            }
            current = self.next_sibling(sibling);
        }
        None
    }
}

/// Iterator over the children of a node, in tree order.
pub struct Children<'a, T: SelectorTree> {
    tree: &'a T,
    next: Option<T::Node>,
}

impl<T: SelectorTree> Iterator for Children<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = self.tree.next_sibling(node);
        Some(node)
    }
}
