//! Text patterns for the `text` engines.
//!
//! A text clause matches an element by its own text: the concatenation of
//! its direct text-node children, with runs of whitespace collapsed to one
//! space and the ends trimmed.
//!
//! | Clause | Matches |
//! |---|---|
//! | `Hello` | own text contains `hello`, ASCII and Unicode case-insensitively |
//! | `"Hello"` or `'Hello'` | own text is exactly `Hello` |
//! | `/hel+o/i` | own text matches the regular expression |

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::{SelectorResult, SelectorSyntaxError};
use crate::selector::write_string;
use crate::tokenizer::Cursor;

/// A compiled text clause.
#[derive(Debug, Clone)]
pub enum TextPattern {
    /// Unquoted: case-insensitive substring.
    Substring {
        /// Normalized needle, lower-cased
        needle: String,
    },

    /// Quoted: whole-text equality after normalization.
    Exact {
        /// Normalized expected text
        text: String,
    },

    /// `/pattern/flags`
    Regex {
        /// Compiled expression
        regex: Regex,
        /// Pattern as written between the slashes
        source: String,
        /// Flags as written after the closing slash
        flags: String,
    },
}

impl TextPattern {
    /// Compile a text clause.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorSyntaxError::UnterminatedString`] for a quoted clause
    /// missing its closing quote, [`SelectorSyntaxError::UnexpectedCharacter`]
    /// for text after the closing quote, and
    /// [`SelectorSyntaxError::InvalidRegex`] for a regular expression the
    /// `regex` crate rejects.
    pub fn parse(clause: &str) -> SelectorResult<Self> {
        if clause.starts_with(['"', '\'']) {
            let mut cursor = Cursor::new(clause, 0);
            let text = cursor.consume_string()?;
            let _ = cursor.skip_whitespace();
            if !cursor.is_eof() {
                return Err(cursor.unexpected("the end of the text"));
            }
            return Ok(Self::Exact {
                text: normalize_whitespace(&text),
            });
        }

        // `/pattern/flags`; anything else starting with a slash is plain text.
        if let Some((source, flags)) = clause
            .strip_prefix('/')
            .and_then(|body| body.rsplit_once('/'))
            .filter(|(_, flags)| flags.chars().all(|c| matches!(c, 'i' | 'm' | 's')))
        {
            return Self::regex(source, flags);
        }

        Ok(Self::Substring {
            needle: normalize_whitespace(clause).to_lowercase(),
        })
    }

    fn regex(source: &str, flags: &str) -> SelectorResult<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|e| SelectorSyntaxError::InvalidRegex {
                pattern: source.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self::Regex {
            regex,
            source: source.to_string(),
            flags: flags.to_string(),
        })
    }

    /// Whether an element whose direct text children concatenate to
    /// `own_text` matches.
    #[must_use]
    pub fn matches(&self, own_text: &str) -> bool {
        let text = normalize_whitespace(own_text);
        match self {
            Self::Substring { needle } => text.to_lowercase().contains(needle.as_str()),
            Self::Exact { text: expected } => text == *expected,
            Self::Regex { regex, .. } => regex.is_match(&text),
        }
    }
}

/// Collapse whitespace runs to a single space and trim.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl fmt::Display for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring { needle } => f.write_str(needle),
            Self::Exact { text } => write_string(f, text),
            Self::Regex { source, flags, .. } => write!(f, "/{source}/{flags}"),
        }
    }
}
