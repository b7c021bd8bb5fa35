//! CSS selector representation
//!
//! This module holds the compiled form of a clause: the
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/) subset understood
//! by the `css` engines, plus the text patterns of the `text` engines.
//! Every type serializes back to selector text through `Display`; the output
//! re-parses to an equivalent selector.

mod nth;
mod parser;

use std::fmt;

use strum_macros::{Display, EnumString};

use crate::attribute::AttributePredicate;
use crate::engine::Engine;
use crate::error::SelectorResult;
use crate::options::QueryOptions;
use crate::text::TextPattern;
use crate::tokenizer::is_ident_code_point;

pub use nth::Nth;
pub use parser::parse_selector_list;

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    /// Matched ASCII case-insensitively, as for HTML elements.
    ///
    /// Examples: `div`, `span`, `section`
    Type(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    ///
    /// Example: `*`
    Universal,

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    ///
    /// Example: `#target`
    Id(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    ///
    /// Example: `.nav-item`
    Class(String),

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    ///
    /// Examples: `[href]`, `[attr*="value"]`, `[attr $= woRLD i]`
    Attribute(AttributePredicate),

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    ///
    /// Examples: `:nth-child(2)`, `:first-of-type`, `:not(.hidden)`
    PseudoClass(PseudoClass),
}

/// Names of the supported pseudo-classes.
///
/// Which of these a parser accepts is configured through
/// [`QueryOptions`]; any other name is a syntax error.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum PseudoClassName {
    /// `:root`
    Root,
    /// `:scope`
    Scope,
    /// `:empty`
    Empty,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:only-of-type`
    OnlyOfType,
    /// `:nth-child(An+B)`
    NthChild,
    /// `:nth-last-child(An+B)`
    NthLastChild,
    /// `:nth-of-type(An+B)`
    NthOfType,
    /// `:nth-last-of-type(An+B)`
    NthLastOfType,
    /// `:not(<selector-list>)`
    Not,
}

impl PseudoClassName {
    /// Every supported pseudo-class.
    pub const ALL: [Self; 14] = [
        Self::Root,
        Self::Scope,
        Self::Empty,
        Self::FirstChild,
        Self::LastChild,
        Self::OnlyChild,
        Self::FirstOfType,
        Self::LastOfType,
        Self::OnlyOfType,
        Self::NthChild,
        Self::NthLastChild,
        Self::NthOfType,
        Self::NthLastOfType,
        Self::Not,
    ];

    /// Whether the pseudo-class takes a parenthesized argument.
    #[must_use]
    pub const fn is_functional(self) -> bool {
        matches!(
            self,
            Self::NthChild | Self::NthLastChild | Self::NthOfType | Self::NthLastOfType | Self::Not
        )
    }
}

/// A parsed pseudo-class with its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    /// [§ 14.1 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    /// "The :root pseudo-class represents an element that is the root of the document."
    Root,

    /// [§ 14.3 :scope](https://www.w3.org/TR/selectors-4/#the-scope-pseudo)
    /// Matches the context node of the current chain stage. When the
    /// context is the document itself, it matches the document element,
    /// like `:root`.
    Scope,

    /// [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    /// "The :empty pseudo-class represents an element that has no children
    /// except, optionally, document white space characters."
    Empty,

    /// [§ 14.4.3 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    FirstChild,

    /// [§ 14.4.4 :last-child](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    LastChild,

    /// [§ 14.4.5 :only-child](https://www.w3.org/TR/selectors-4/#the-only-child-pseudo)
    OnlyChild,

    /// [§ 14.5.3 :first-of-type](https://www.w3.org/TR/selectors-4/#the-first-of-type-pseudo)
    FirstOfType,

    /// [§ 14.5.4 :last-of-type](https://www.w3.org/TR/selectors-4/#the-last-of-type-pseudo)
    LastOfType,

    /// [§ 14.5.5 :only-of-type](https://www.w3.org/TR/selectors-4/#the-only-of-type-pseudo)
    OnlyOfType,

    /// [§ 14.4.1 :nth-child()](https://www.w3.org/TR/selectors-4/#the-nth-child-pseudo)
    /// "The :nth-child(An+B) pseudo-class notation represents elements that
    /// are among An+Bth elements from the list composed of their inclusive
    /// siblings."
    NthChild(Nth),

    /// [§ 14.4.2 :nth-last-child()](https://www.w3.org/TR/selectors-4/#the-nth-last-child-pseudo)
    NthLastChild(Nth),

    /// [§ 14.5.1 :nth-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-of-type-pseudo)
    NthOfType(Nth),

    /// [§ 14.5.2 :nth-last-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-last-of-type-pseudo)
    NthLastOfType(Nth),

    /// [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
    /// "The negation pseudo-class, :not(), is a functional pseudo-class
    /// taking a selector list as an argument. It represents an element that
    /// is not represented by its argument."
    Not(SelectorList),
}

impl PseudoClass {
    /// The name this pseudo-class is written with.
    #[must_use]
    pub const fn name(&self) -> PseudoClassName {
        match self {
            Self::Root => PseudoClassName::Root,
            Self::Scope => PseudoClassName::Scope,
            Self::Empty => PseudoClassName::Empty,
            Self::FirstChild => PseudoClassName::FirstChild,
            Self::LastChild => PseudoClassName::LastChild,
            Self::OnlyChild => PseudoClassName::OnlyChild,
            Self::FirstOfType => PseudoClassName::FirstOfType,
            Self::LastOfType => PseudoClassName::LastOfType,
            Self::OnlyOfType => PseudoClassName::OnlyOfType,
            Self::NthChild(_) => PseudoClassName::NthChild,
            Self::NthLastChild(_) => PseudoClassName::NthLastChild,
            Self::NthOfType(_) => PseudoClassName::NthOfType,
            Self::NthLastOfType(_) => PseudoClassName::NthLastOfType,
            Self::Not(_) => PseudoClassName::Not,
        }
    }
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The list of simple selectors that make up this compound selector.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
    /// "A selector of the form 'A B' represents an element B that is an
    /// arbitrary descendant of some ancestor element A."
    Descendant,

    /// [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
    /// "A selector of the form 'A > B' represents an element B that is
    /// a direct child of element A."
    Child,

    /// [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
    /// "A selector of the form 'A + B' represents an element B that
    /// immediately follows element A, where A and B share the same parent."
    NextSibling,

    /// [§ 16.4 Subsequent-sibling combinator](https://www.w3.org/TR/selectors-4/#general-sibling-combinators)
    /// "A selector of the form 'A ~ B' represents an element B that
    /// follows element A (not necessarily immediately)."
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Example: `section > div div span`
/// This would be parsed as:
/// ```text
/// subject: [span]
/// combinators: [(Descendant, [div]), (Descendant, [div]), (Child, [section])]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector (the subject of the selector).
    pub subject: CompoundSelector,

    /// Chain of (combinator, `compound_selector`) pairs going left from the subject.
    ///
    /// The order is right-to-left because matching is done from the subject upward.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#selector-list)
///
/// "A selector list is a comma-separated list of selectors; it represents
/// the union of all elements represented by each selector in the list."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// The comma-separated alternatives, in source order.
    pub alternatives: Vec<ComplexSelector>,
}

/// The compiled form of one chain part's clause.
#[derive(Debug, Clone)]
pub enum CompiledClause {
    /// A CSS selector list, for the `css` engines.
    Css(SelectorList),
    /// A text pattern, for the `text` engines.
    Text(TextPattern),
}

impl CompiledClause {
    /// Compile `clause` for `engine`.
    ///
    /// `offset` is the clause's position within the whole selector and only
    /// affects error positions.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SelectorSyntaxError`] when the clause is not valid
    /// for the engine.
    pub fn compile(
        engine: Engine,
        clause: &str,
        offset: usize,
        options: &QueryOptions,
    ) -> SelectorResult<Self> {
        if engine.is_text() {
            TextPattern::parse(clause).map(Self::Text)
        } else {
            parse_selector_list(clause, offset, options).map(Self::Css)
        }
    }
}

/// [CSSOM § 2.1 serialize an identifier](https://drafts.csswg.org/cssom/#serialize-an-identifier)
pub(crate) fn write_identifier(f: &mut impl fmt::Write, ident: &str) -> fmt::Result {
    for (i, c) in ident.chars().enumerate() {
        let leading_digit = c.is_ascii_digit()
            && (i == 0 || (i == 1 && ident.starts_with('-')));
        if c == '\0' {
            f.write_char('\u{FFFD}')?;
        } else if c.is_control() || leading_digit {
            write!(f, "\\{:x} ", u32::from(c))?;
        } else if is_ident_code_point(c) {
            f.write_char(c)?;
        } else {
            f.write_char('\\')?;
            f.write_char(c)?;
        }
    }
    Ok(())
}

/// [CSSOM § 2.1 serialize a string](https://drafts.csswg.org/cssom/#serialize-a-string)
pub(crate) fn write_string(f: &mut impl fmt::Write, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        match c {
            '\0' => f.write_char('\u{FFFD}')?,
            '"' | '\\' => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c if c.is_control() => write!(f, "\\{:x} ", u32::from(c))?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => write_identifier(f, name),
            Self::Universal => f.write_str("*"),
            Self::Id(id) => {
                f.write_str("#")?;
                write_identifier(f, id)
            }
            Self::Class(class) => {
                f.write_str(".")?;
                write_identifier(f, class)
            }
            Self::Attribute(predicate) => fmt::Display::fmt(predicate, f),
            Self::PseudoClass(pseudo) => fmt::Display::fmt(pseudo, f),
        }
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name())?;
        match self {
            Self::NthChild(nth)
            | Self::NthLastChild(nth)
            | Self::NthOfType(nth)
            | Self::NthLastOfType(nth) => write!(f, "({nth})"),
            Self::Not(list) => write!(f, "({list})"),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for simple in &self.simple_selectors {
            fmt::Display::fmt(simple, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Descendant => " ",
            Self::Child => " > ",
            Self::NextSibling => " + ",
            Self::SubsequentSibling => " ~ ",
        })
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (combinator, compound) in self.combinators.iter().rev() {
            write!(f, "{compound}{combinator}")?;
        }
        fmt::Display::fmt(&self.subject, f)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, complex) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(complex, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for CompiledClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(list) => fmt::Display::fmt(list, f),
            Self::Text(pattern) => fmt::Display::fmt(pattern, f),
        }
    }
}
