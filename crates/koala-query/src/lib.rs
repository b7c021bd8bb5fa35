//! Shadow-piercing selector engine for Koala DOM trees.
//!
//! # Scope
//!
//! This crate implements:
//! - **Selector chains**: parts separated by the `>>` deep combinator, each
//!   with an optional engine prefix (`css=`, `css:light=`, `text=`,
//!   `text:light=`) and an optional `*` capture marker.
//!
//! - **CSS Selectors** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, universal, class, and ID selectors
//!   - Attribute selectors with `=`, `~=`, `|=`, `^=`, `$=`, `*=` and the
//!     `i`/`s` modifiers
//!   - Descendant, child, next-sibling, and subsequent-sibling combinators
//!   - Structural pseudo-classes, `:scope`, `:root`, `:empty`, `:not()`
//!   - Comma-separated selector lists
//!
//! - **Shadow DOM** ([DOM § 4.2.2 Shadow trees](https://dom.spec.whatwg.org/#shadow-trees))
//!   - `css` and `text` descend into open shadow roots; their `:light`
//!     variants stay in the light tree
//!   - Closed shadow roots are never entered
//!
//! - **Text matching**: substring, exact (`"..."`), and regular expression
//!   (`/.../flags`) matches against an element's own text.
//!
//! # Example
//!
//! ```
//! use koala_dom::DomTree;
//!
//! let tree = DomTree::from_json(
//!     r#"{"type": "element", "tagName": "section", "children": [
//!         {"type": "element", "tagName": "span", "attributes": {"id": "a"}}
//!     ]}"#,
//! )
//! .unwrap();
//!
//! let spans = koala_query::query_all(&tree, "css=section >> span", tree.root()).unwrap();
//! assert_eq!(spans.len(), 1);
//! ```
//!
//! # Not Yet Implemented
//!
//! - Pseudo-elements and user-action pseudo-classes (`:hover`, `:focus`)
//! - Namespace prefixes in type and attribute selectors
//! - `xpath=` and `id=` engines

/// [`SelectorTree`] implementation for `koala_dom::DomTree`.
pub mod adapter;
/// Union and document ordering of match sets.
pub mod assembler;
/// Attribute selectors per [§ 6](https://www.w3.org/TR/selectors-4/#attribute-selectors).
pub mod attribute;
/// Selector engines.
pub mod engine;
/// Error types.
pub mod error;
/// Staged execution of `>>` chains.
pub mod executor;
/// Matching compiled clauses below a context node.
pub mod matcher;
/// Query configuration.
pub mod options;
/// Compiled selector representation and the clause parser.
pub mod selector;
/// Text patterns for the `text` engines.
pub mod text;
/// Chain splitting and lexical helpers.
pub mod tokenizer;
/// The node capability trait.
pub mod tree;

use std::fmt;
use std::str::FromStr;

use tracing::debug_span;

pub use assembler::DocumentOrder;
pub use attribute::{AttributeOperator, AttributePredicate, CaseSensitivity};
pub use engine::Engine;
pub use error::{SelectorResult, SelectorSyntaxError};
pub use matcher::Matcher;
pub use options::QueryOptions;
pub use selector::{
    Combinator, CompiledClause, ComplexSelector, CompoundSelector, Nth, PseudoClass,
    PseudoClassName, SelectorList, SimpleSelector,
};
pub use text::TextPattern;
pub use tokenizer::{SelectorPart, tokenize};
pub use tree::{NodeKind, SelectorTree};

/// One compiled `>>` part of a [`Selector`].
#[derive(Debug, Clone)]
pub struct CompiledPart {
    /// Engine evaluating the clause.
    pub engine: Engine,
    /// The compiled clause.
    pub clause: CompiledClause,
    /// Whether this part's matches are the query result.
    pub capture: bool,
}

/// A compiled selector chain.
///
/// Compile once, query many times: a `Selector` is immutable and can be
/// shared across threads.
///
/// ```
/// use koala_query::Selector;
///
/// let selector: Selector = "*css = section >> css:light=div, span".parse().unwrap();
/// assert_eq!(selector.parts().len(), 2);
/// assert!(selector.parts()[0].capture);
/// assert_eq!(selector.to_string(), "*css=section >> css:light=div, span");
/// ```
#[derive(Debug, Clone)]
pub struct Selector {
    parts: Vec<CompiledPart>,
}

impl Selector {
    /// Compile `selector` with default options.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorSyntaxError`] if the selector does not parse.
    pub fn parse(selector: &str) -> SelectorResult<Self> {
        Self::parse_with(selector, &QueryOptions::default())
    }

    /// Compile `selector` with `options`.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorSyntaxError`] if the selector does not parse.
    pub fn parse_with(selector: &str, options: &QueryOptions) -> SelectorResult<Self> {
        let parts = tokenize(selector, options.default_engine)?
            .into_iter()
            .map(|part| {
                Ok(CompiledPart {
                    engine: part.engine,
                    clause: CompiledClause::compile(part.engine, &part.clause, part.offset, options)?,
                    capture: part.capture,
                })
            })
            .collect::<SelectorResult<Vec<_>>>()?;
        Ok(Self { parts })
    }

    /// The compiled parts, in chain order.
    #[must_use]
    pub fn parts(&self) -> &[CompiledPart] {
        &self.parts
    }

    /// Every match below `root`, in document order.
    pub fn query_all<T: SelectorTree>(&self, tree: &T, root: T::Node) -> Vec<T::Node> {
        let _span = debug_span!("query", selector = %self, ?root).entered();
        executor::execute(tree, &self.parts, root)
    }

    /// The first match below `root` in document order.
    pub fn query_single<T: SelectorTree>(&self, tree: &T, root: T::Node) -> Option<T::Node> {
        self.query_all(tree, root).into_iter().next()
    }
}

impl FromStr for Selector {
    type Err = SelectorSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            if part.capture {
                f.write_str("*")?;
            }
            write!(f, "{}={}", part.engine, part.clause)?;
        }
        Ok(())
    }
}

/// Query entry points bound to a set of [`QueryOptions`].
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    options: QueryOptions,
}

impl QueryEngine {
    /// An engine compiling selectors with `options`.
    #[must_use]
    pub const fn new(options: QueryOptions) -> Self {
        Self { options }
    }

    /// The options selectors are compiled with.
    #[must_use]
    pub const fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Compile `selector`.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorSyntaxError`] if the selector does not parse.
    pub fn compile(&self, selector: &str) -> SelectorResult<Selector> {
        Selector::parse_with(selector, &self.options)
    }

    /// Every match of `selector` below `root`, in document order.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorSyntaxError`] if the selector does not parse; an
    /// empty result is not an error.
    pub fn query_all<T: SelectorTree>(
        &self,
        tree: &T,
        selector: &str,
        root: T::Node,
    ) -> SelectorResult<Vec<T::Node>> {
        Ok(self.compile(selector)?.query_all(tree, root))
    }

    /// The first match of `selector` below `root` in document order.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorSyntaxError`] if the selector does not parse.
    pub fn query_single<T: SelectorTree>(
        &self,
        tree: &T,
        selector: &str,
        root: T::Node,
    ) -> SelectorResult<Option<T::Node>> {
        Ok(self.compile(selector)?.query_single(tree, root))
    }
}

/// Every match of `selector` below `root`, in document order, using default
/// options.
///
/// # Errors
///
/// Returns a [`SelectorSyntaxError`] if the selector does not parse.
pub fn query_all<T: SelectorTree>(
    tree: &T,
    selector: &str,
    root: T::Node,
) -> SelectorResult<Vec<T::Node>> {
    QueryEngine::default().query_all(tree, selector, root)
}

/// The first match of `selector` below `root`, using default options.
///
/// # Errors
///
/// Returns a [`SelectorSyntaxError`] if the selector does not parse.
pub fn query_single<T: SelectorTree>(
    tree: &T,
    selector: &str,
    root: T::Node,
) -> SelectorResult<Option<T::Node>> {
    QueryEngine::default().query_single(tree, selector, root)
}
