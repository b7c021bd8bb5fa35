//! Error types for selector parsing.
//!
//! Every error is raised while compiling a selector, before any traversal
//! starts. A selector that parses but matches nothing is not an error.

use thiserror::Error;

/// Result type for selector compilation.
pub type SelectorResult<T> = Result<T, SelectorSyntaxError>;

/// Unparseable selector text.
///
/// Positions are byte offsets into the whole selector string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorSyntaxError {
    /// The selector, or one `>>` part of it, is empty.
    #[error("empty selector")]
    EmptySelector,

    /// A quoted literal has no closing quote.
    #[error("unterminated string starting at {position}")]
    UnterminatedString {
        /// Offset of the opening quote
        position: usize,
    },

    /// `[`/`(` without a matching `]`/`)`, or the reverse.
    #[error("unbalanced '{bracket}' at {position}")]
    UnbalancedBracket {
        /// The offending bracket character
        bracket: char,
        /// Offset of the bracket
        position: usize,
    },

    /// `name=` prefix naming an engine that does not exist.
    #[error("unknown selector engine '{name}'")]
    UnknownEngine {
        /// Engine name as written
        name: String,
    },

    /// More than one part of a `>>` chain starts with `*`.
    #[error("only one part of a selector chain can be captured with '*'")]
    DuplicateCapture,

    /// A pseudo-class that is unknown or disabled in the query options.
    #[error("unknown pseudo-class ':{name}'")]
    UnknownPseudoClass {
        /// Pseudo-class name without the colon
        name: String,
    },

    /// An attribute selector operator other than `=`, `~=`, `|=`, `^=`, `$=`, `*=`.
    #[error("invalid attribute operator '{operator}' at {position}")]
    InvalidAttributeOperator {
        /// The operator text
        operator: String,
        /// Offset of the operator
        position: usize,
    },

    /// A trailing attribute modifier other than `i` or `s`.
    #[error("invalid attribute modifier '{modifier}' at {position}")]
    InvalidAttributeModifier {
        /// The modifier text
        modifier: String,
        /// Offset of the modifier
        position: usize,
    },

    /// An `An+B` argument that does not parse.
    #[error("invalid An+B expression '{expression}'")]
    InvalidNth {
        /// The argument text
        expression: String,
    },

    /// A `text=/…/` pattern the regex engine rejects.
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegex {
        /// Pattern source
        pattern: String,
        /// Message from the regex compiler
        message: String,
    },

    /// Any other character the grammar does not allow at this point.
    #[error("unexpected '{found}' at {position}")]
    UnexpectedCharacter {
        /// The character found
        found: char,
        /// Offset of the character
        position: usize,
    },

    /// Input ended where more was required.
    #[error("unexpected end of selector, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for
        expected: &'static str,
    },
}

impl SelectorSyntaxError {
    /// Move the position of a positioned error by `offset` bytes, for errors
    /// found in a slice of the selector.
    #[must_use]
    pub(crate) fn shifted(self, offset: usize) -> Self {
        match self {
            Self::UnterminatedString { position } => Self::UnterminatedString {
                position: position + offset,
            },
            Self::UnbalancedBracket { bracket, position } => Self::UnbalancedBracket {
                bracket,
                position: position + offset,
            },
            other => other,
        }
    }
}
