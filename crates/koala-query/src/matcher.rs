//! Shadow-piercing matcher.
//!
//! A [`Matcher`] evaluates one compiled clause below one context node. The
//! context node bounds everything: candidates are its descendants, and
//! combinators may walk up to it but never past it.
//!
//! With piercing enabled the descendants include the contents of every open
//! shadow root on the way, and an element directly inside a shadow root has
//! the shadow host as its parent for the purpose of combinators. Closed
//! shadow roots are never entered.

use crate::selector::{
    Combinator, CompiledClause, ComplexSelector, CompoundSelector, PseudoClass, SelectorList,
    SimpleSelector,
};
use crate::text::TextPattern;
use crate::tree::{NodeKind, SelectorTree};

/// Matches selectors below a single context node.
pub struct Matcher<'t, T: SelectorTree> {
    tree: &'t T,
    scope: T::Node,
    pierce: bool,
}

impl<'t, T: SelectorTree> Matcher<'t, T> {
    /// A matcher for the subtree below `scope`.
    ///
    /// `scope` may be the document, an element, or a shadow root.
    pub const fn new(tree: &'t T, scope: T::Node, pierce: bool) -> Self {
        Self {
            tree,
            scope,
            pierce,
        }
    }

    /// Every element below the context node matching `clause`, in traversal
    /// order.
    ///
    /// The context node itself is never part of the result.
    pub fn query(&self, clause: &CompiledClause) -> Vec<T::Node> {
        let elements = Descendants::new(self.tree, self.scope, self.pierce)
            .filter(|&node| self.tree.is_element(node));
        match clause {
            CompiledClause::Css(list) => elements
                .filter(|&node| self.matches_list(list, node))
                .collect(),
            CompiledClause::Text(pattern) => elements
                .filter(|&node| self.matches_text(pattern, node))
                .collect(),
        }
    }

    /// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#selector-list)
    ///
    /// "A selector list ... represents the union of all elements represented
    /// by each selector in the list."
    pub fn matches_list(&self, list: &SelectorList, node: T::Node) -> bool {
        list.alternatives
            .iter()
            .any(|complex| self.matches_complex(complex, node))
    }

    /// Whether `node` is the subject of `complex`.
    pub fn matches_complex(&self, complex: &ComplexSelector, node: T::Node) -> bool {
        self.matches_compound(&complex.subject, node)
            && self.matches_combinators(&complex.combinators, node)
    }

    /// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
    ///
    /// The chain is right-to-left. Every ancestor or sibling that satisfies a
    /// compound is tried against the rest of the chain before giving up, so
    /// `section > div div span` finds the `div` pair whose outer `div` is a
    /// child of `section` even when a nearer `div` also matches.
    fn matches_combinators(
        &self,
        combinators: &[(Combinator, CompoundSelector)],
        node: T::Node,
    ) -> bool {
        let Some(((combinator, compound), rest)) = combinators.split_first() else {
            return true;
        };
        let continues = |candidate: T::Node| {
            self.matches_compound(compound, candidate) && self.matches_combinators(rest, candidate)
        };

        match combinator {
            // "A selector of the form 'A B' represents an element B that is an
            // arbitrary descendant of some ancestor element A."
            Combinator::Descendant => {
                let mut current = self.parent(node);
                while let Some(ancestor) = current {
                    if continues(ancestor) {
                        return true;
                    }
                    current = self.parent(ancestor);
                }
                false
            }

            // "A selector of the form 'A > B' represents an element B that is a
            // direct child of element A."
            Combinator::Child => self.parent(node).is_some_and(continues),

            // "A selector of the form 'A + B' represents an element B that
            // immediately follows element A, where A and B share the same parent."
            Combinator::NextSibling => self.prev_element_sibling(node).is_some_and(continues),

            // "A selector of the form 'A ~ B' represents an element B that
            // follows element A (not necessarily immediately)."
            Combinator::SubsequentSibling => {
                let mut current = self.prev_element_sibling(node);
                while let Some(sibling) = current {
                    if continues(sibling) {
                        return true;
                    }
                    current = self.prev_element_sibling(sibling);
                }
                false
            }
        }
    }

    /// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
    fn matches_compound(&self, compound: &CompoundSelector, node: T::Node) -> bool {
        self.tree.is_element(node)
            && compound
                .simple_selectors
                .iter()
                .all(|simple| self.matches_simple(simple, node))
    }

    fn matches_simple(&self, simple: &SimpleSelector, node: T::Node) -> bool {
        let tree = self.tree;
        match simple {
            SimpleSelector::Type(name) => tree
                .local_name(node)
                .is_some_and(|local| local.eq_ignore_ascii_case(name)),
            SimpleSelector::Universal => true,
            SimpleSelector::Id(id) => tree.attribute(node, "id") == Some(id.as_str()),
            SimpleSelector::Class(class) => tree
                .attribute(node, "class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            SimpleSelector::Attribute(predicate) => {
                predicate.matches(tree.attribute(node, &predicate.name))
            }
            SimpleSelector::PseudoClass(pseudo) => self.matches_pseudo_class(pseudo, node),
        }
    }

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    ///
    /// Structural pseudo-classes look at the element's real siblings, which
    /// for an element directly inside a shadow root are the other children
    /// of that shadow root.
    fn matches_pseudo_class(&self, pseudo: &PseudoClass, node: T::Node) -> bool {
        let tree = self.tree;
        match pseudo {
            PseudoClass::Root => tree
                .parent(node)
                .is_some_and(|parent| tree.kind(parent) == NodeKind::Document),
            // "If there is no scoping root, then :scope represents the root
            // of the document."
            PseudoClass::Scope => {
                node == self.scope
                    || (tree.kind(self.scope) == NodeKind::Document
                        && tree.parent(node) == Some(self.scope))
            }
            PseudoClass::Empty => tree.children(node).all(|child| match tree.kind(child) {
                NodeKind::Element => false,
                NodeKind::Text => tree.text(child).is_none_or(|t| t.trim().is_empty()),
                _ => true,
            }),
            PseudoClass::FirstChild => tree.prev_element_sibling(node).is_none(),
            PseudoClass::LastChild => tree.next_element_sibling(node).is_none(),
            PseudoClass::OnlyChild => {
                tree.prev_element_sibling(node).is_none()
                    && tree.next_element_sibling(node).is_none()
            }
            PseudoClass::FirstOfType => self.index_of_type(node, false) == 1,
            PseudoClass::LastOfType => self.index_of_type(node, true) == 1,
            PseudoClass::OnlyOfType => {
                self.index_of_type(node, false) == 1 && self.index_of_type(node, true) == 1
            }
            PseudoClass::NthChild(nth) => nth.matches(self.index(node, false)),
            PseudoClass::NthLastChild(nth) => nth.matches(self.index(node, true)),
            PseudoClass::NthOfType(nth) => nth.matches(self.index_of_type(node, false)),
            PseudoClass::NthLastOfType(nth) => nth.matches(self.index_of_type(node, true)),
            PseudoClass::Not(list) => !self.matches_list(list, node),
        }
    }

    /// 1-based position among element siblings, counted from the end when
    /// `from_end` is set.
    fn index(&self, node: T::Node, from_end: bool) -> i32 {
        self.sibling_position(node, from_end, |_| true)
    }

    /// Like [`index`](Self::index), counting only siblings with the same
    /// local name.
    fn index_of_type(&self, node: T::Node, from_end: bool) -> i32 {
        let name = self.tree.local_name(node);
        self.sibling_position(node, from_end, |sibling| {
            match (self.tree.local_name(sibling), name) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
        })
    }

    fn sibling_position(
        &self,
        node: T::Node,
        from_end: bool,
        counts: impl Fn(T::Node) -> bool,
    ) -> i32 {
        let step = |n: T::Node| {
            if from_end {
                self.tree.next_element_sibling(n)
            } else {
                self.tree.prev_element_sibling(n)
            }
        };
        let mut position = 1;
        let mut current = step(node);
        while let Some(sibling) = current {
            if counts(sibling) {
                position += 1;
            }
            current = step(sibling);
        }
        position
    }

    fn matches_text(&self, pattern: &TextPattern, node: T::Node) -> bool {
        let own_text: String = self
            .tree
            .children(node)
            .filter_map(|child| self.tree.text(child))
            .collect();
        pattern.matches(&own_text)
    }

    /// Parent for combinator purposes, bounded by the context node.
    fn parent(&self, node: T::Node) -> Option<T::Node> {
        if node == self.scope {
            return None;
        }
        let parent = self.tree.parent(node)?;
        if parent != self.scope && self.tree.kind(parent) == NodeKind::ShadowRoot {
            if self.pierce {
                self.tree.shadow_host(parent)
            } else {
                None
            }
        } else {
            Some(parent)
        }
    }

    /// Previous element sibling, bounded by the context node.
    fn prev_element_sibling(&self, node: T::Node) -> Option<T::Node> {
        if node == self.scope {
            None
        } else {
            self.tree.prev_element_sibling(node)
        }
    }
}

/// Pre-order traversal of the nodes below a root, excluding the root.
///
/// When piercing, the children of an element's open shadow root come before
/// its light children.
pub(crate) struct Descendants<'t, T: SelectorTree> {
    tree: &'t T,
    pierce: bool,
    stack: Vec<T::Node>,
}

impl<'t, T: SelectorTree> Descendants<'t, T> {
    pub(crate) fn new(tree: &'t T, root: T::Node, pierce: bool) -> Self {
        let mut descendants = Self {
            tree,
            pierce,
            stack: Vec::new(),
        };
        descendants.push_children(root);
        descendants
    }

    fn push_children(&mut self, node: T::Node) {
        let tree = self.tree;
        let shadow = if self.pierce {
            tree.shadow_root(node)
        } else {
            None
        };
        let in_order: Vec<T::Node> = shadow
            .into_iter()
            .flat_map(|shadow| tree.children(shadow))
            .chain(tree.children(node))
            .collect();
        self.stack.extend(in_order.into_iter().rev());
    }
}

impl<T: SelectorTree> Iterator for Descendants<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_children(node);
        Some(node)
    }
}
