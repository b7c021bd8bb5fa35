//! Selector tokenizer.
//!
//! Splits a selector string into the parts of a `>>` chain and decodes the
//! lexical pieces of a clause (identifiers, strings, escapes).
//!
//! ```text
//! *css = section >> css:light=div, span >> text="Hello"
//! └──── part 0 ──┘    └──── part 1 ───┘    └─ part 2 ──┘
//!  capture, css        css:light             text
//! ```
//!
//! Separators are only recognized at the top level: a `>>` or `,` inside a
//! quoted literal, a `[...]` attribute selector, or a `(...)` argument list
//! belongs to the clause.

use tracing::trace;

use crate::engine::Engine;
use crate::error::{SelectorResult, SelectorSyntaxError};

/// The deep combinator separating chain parts.
pub const DEEP_COMBINATOR: &str = ">>";

/// One `>>`-separated part of a selector chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorPart {
    /// Engine named by the prefix, or the default engine.
    pub engine: Engine,
    /// Clause text with the prefix and surrounding whitespace removed.
    pub clause: String,
    /// Byte offset of `clause` within the whole selector.
    pub offset: usize,
    /// Whether a leading `*` marked this part as the one whose matches are
    /// returned.
    pub capture: bool,
}

/// A slice of the input produced by [`split_top_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Byte offset of `text` within the split input.
    pub offset: usize,
    /// The segment text, untrimmed.
    pub text: &'a str,
}

/// Split `selector` into its `>>` chain.
///
/// `default_engine` applies to parts without a recognized `name=` prefix.
///
/// The end of each part depends on its engine. A CSS part ends at the next
/// `>>` outside quotes and brackets. A text part is free text: only a
/// leading quoted literal or `/regex/` is skipped over, so `text=don't` and
/// `text=Price (USD` are ordinary clauses.
///
/// # Errors
///
/// Returns a [`SelectorSyntaxError`] for an empty selector or part, an
/// unterminated string, unbalanced brackets, an unknown engine name, or
/// more than one capture marker.
pub fn tokenize(selector: &str, default_engine: Engine) -> SelectorResult<Vec<SelectorPart>> {
    if selector.trim().is_empty() {
        return Err(SelectorSyntaxError::EmptySelector);
    }

    let mut parts = Vec::new();
    let mut start = 0;
    loop {
        let rest = &selector[start..];
        let prefix = Prefix::read(rest);
        let is_text = prefix
            .engine_name
            .map_or(Ok(default_engine), str::parse::<Engine>)
            .is_ok_and(Engine::is_text);
        let end = if is_text {
            text_part_end(rest, prefix.clause_start)
        } else {
            find_top_level(rest, DEEP_COMBINATOR)
        }
        .map_err(|error| error.shifted(start))?;

        match end {
            Some(end) => {
                let segment = Segment {
                    offset: start,
                    text: &rest[..end],
                };
                parts.push(parse_part(segment, default_engine)?);
                start += end + DEEP_COMBINATOR.len();
            }
            None => {
                let segment = Segment {
                    offset: start,
                    text: rest,
                };
                parts.push(parse_part(segment, default_engine)?);
                break;
            }
        }
    }

    if parts.iter().filter(|part| part.capture).count() > 1 {
        return Err(SelectorSyntaxError::DuplicateCapture);
    }

    trace!(selector, ?parts, "tokenized selector");
    Ok(parts)
}

/// Split `text` on every top-level occurrence of `separator`.
///
/// Quoted literals (with `\` escapes), `[...]` and `(...)` are skipped over,
/// as is any character escaped with `\` outside a literal.
///
/// # Errors
///
/// Returns [`SelectorSyntaxError::UnterminatedString`] or
/// [`SelectorSyntaxError::UnbalancedBracket`]; positions are offsets into
/// `text`.
pub fn split_top_level<'a>(text: &'a str, separator: &str) -> SelectorResult<Vec<Segment<'a>>> {
    let mut segments = Vec::new();
    let mut start = 0;
    while let Some(end) = find_top_level(&text[start..], separator)
        .map_err(|error| error.shifted(start))?
    {
        segments.push(Segment {
            offset: start,
            text: &text[start..start + end],
        });
        start += end + separator.len();
    }
    segments.push(Segment {
        offset: start,
        text: &text[start..],
    });
    Ok(segments)
}

/// Byte offset of the first top-level `separator` in `text`, if any.
///
/// Without a separator the whole of `text` is checked, so an unclosed quote
/// or bracket anywhere is reported.
fn find_top_level(text: &str, separator: &str) -> SelectorResult<Option<usize>> {
    let mut brackets: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut chars = text.char_indices();

    while let Some((i, c)) = chars.next() {
        if let Some((q, _)) = quote {
            if c == '\\' {
                let _ = chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\\' => {
                let _ = chars.next();
            }
            '"' | '\'' => quote = Some((c, i)),
            '[' | '(' => brackets.push((c, i)),
            ']' | ')' => {
                let open = if c == ']' { '[' } else { '(' };
                match brackets.pop() {
                    Some((b, _)) if b == open => {}
                    _ => {
                        return Err(SelectorSyntaxError::UnbalancedBracket {
                            bracket: c,
                            position: i,
                        });
                    }
                }
            }
            _ if brackets.is_empty() && text[i..].starts_with(separator) => return Ok(Some(i)),
            _ => {}
        }
    }

    if let Some((_, position)) = quote {
        return Err(SelectorSyntaxError::UnterminatedString { position });
    }
    if let Some((bracket, position)) = brackets.pop() {
        return Err(SelectorSyntaxError::UnbalancedBracket { bracket, position });
    }
    Ok(None)
}

/// Byte offset of the `>>` ending a text part that starts at the top of
/// `text`, if any.
///
/// A clause opening with a quote must close it, and the literal is skipped.
/// A clause opening with `/` skips to the closing `/` when there is one.
/// Everything else is searched as plain text.
fn text_part_end(text: &str, clause_start: usize) -> SelectorResult<Option<usize>> {
    let clause = &text[clause_start..];
    let mut literal_end = 0;
    if let Some(delimiter @ ('"' | '\'' | '/')) = clause.chars().next() {
        let mut chars = clause.char_indices().skip(1);
        let mut closed = false;
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                let _ = chars.next();
            } else if c == delimiter {
                literal_end = i + 1;
                closed = true;
                break;
            }
        }
        if !closed && delimiter != '/' {
            return Err(SelectorSyntaxError::UnterminatedString {
                position: clause_start,
            });
        }
    }

    let searched = clause_start + literal_end;
    Ok(text[searched..]
        .find(DEEP_COMBINATOR)
        .map(|i| searched + i))
}

/// The `*` marker and `name=` prefix at the start of a part.
struct Prefix<'a> {
    /// Whether a `*` capture marker precedes the prefix.
    capture: bool,
    /// The engine name as written, if there is a prefix.
    engine_name: Option<&'a str>,
    /// Offset of the clause within the part, after the prefix and any
    /// whitespace.
    clause_start: usize,
}

impl<'a> Prefix<'a> {
    fn read(part: &'a str) -> Self {
        let text = part.trim_start();
        let mut offset = part.len() - text.len();

        // A `*` is only a capture marker when an engine prefix follows it;
        // otherwise it is the universal selector.
        let (capture, rest) = match text.strip_prefix('*') {
            Some(rest) if engine_prefix(rest).is_some() => (true, rest),
            _ => (false, text),
        };
        if capture {
            offset += 1;
        }

        match engine_prefix(rest) {
            Some((name, consumed)) => {
                let after = &rest[consumed..];
                let skipped = after.len() - after.trim_start().len();
                Self {
                    capture,
                    engine_name: Some(name),
                    clause_start: offset + consumed + skipped,
                }
            }
            None => Self {
                capture,
                engine_name: None,
                clause_start: offset,
            },
        }
    }
}

/// Resolve the capture marker and engine of one part.
fn parse_part(segment: Segment<'_>, default_engine: Engine) -> SelectorResult<SelectorPart> {
    let prefix = Prefix::read(segment.text);
    let engine = match prefix.engine_name {
        Some(name) => name
            .parse::<Engine>()
            .map_err(|_| SelectorSyntaxError::UnknownEngine {
                name: name.to_string(),
            })?,
        None => default_engine,
    };

    let clause = segment.text[prefix.clause_start..].trim_end();
    if clause.is_empty() {
        return Err(SelectorSyntaxError::EmptySelector);
    }

    Ok(SelectorPart {
        engine,
        clause: clause.to_string(),
        offset: segment.offset + prefix.clause_start,
        capture: prefix.capture,
    })
}

/// Match `name` `ws*` `=` at the start of `text`.
///
/// Returns the name and the number of bytes up to and including the `=`.
fn engine_prefix(text: &str) -> Option<(&str, usize)> {
    let name_len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':')))
        .unwrap_or(text.len());
    let name = &text[..name_len];
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let after = &text[name_len..];
    let spaces = after.len() - after.trim_start().len();
    after[spaces..]
        .starts_with('=')
        .then_some((name, name_len + spaces + 1))
}

/// A character cursor over clause text.
///
/// Tracks a byte position so errors can point into the original selector;
/// `base` is the offset of the clause within that selector.
pub(crate) struct Cursor<'a> {
    input: &'a str,
    position: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(input: &'a str, base: usize) -> Self {
        Self {
            input,
            position: 0,
            base,
        }
    }

    /// Offset of the next character within the whole selector.
    pub(crate) const fn offset(&self) -> usize {
        self.base + self.position
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.position..].chars().nth(offset)
    }

    /// Consume and return the next character.
    pub(crate) fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Consume the next character if it is `expected`.
    pub(crate) fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Skip whitespace; returns whether any was skipped.
    pub(crate) fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(is_whitespace) {
            self.position += 1;
        }
        self.position > start
    }

    /// Skip `bytes` bytes of the remainder; must land on a char boundary.
    pub(crate) fn advance(&mut self, bytes: usize) {
        self.position = (self.position + bytes).min(self.input.len());
    }

    /// The unconsumed remainder.
    pub(crate) fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// An error for the next character, or for running out of input.
    pub(crate) fn unexpected(&self, expected: &'static str) -> SelectorSyntaxError {
        match self.peek() {
            Some(found) => SelectorSyntaxError::UnexpectedCharacter {
                found,
                position: self.offset(),
            },
            None => SelectorSyntaxError::UnexpectedEnd { expected },
        }
    }

    /// [§ 4.3.8 Check if two code points are a valid escape](https://www.w3.org/TR/css-syntax-3/#starts-with-a-valid-escape)
    pub(crate) fn at_valid_escape(&self) -> bool {
        self.peek() == Some('\\') && self.peek_at(1).is_some_and(|c| c != '\n')
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    ///
    /// "Repeatedly consume the next input code point from the stream:
    /// ident code point: Append the code point to result.
    /// the stream starts with a valid escape: Consume an escaped code point.
    /// anything else: Reconsume the current input code point. Return result."
    pub(crate) fn consume_name(&mut self) -> String {
        let mut result = String::new();
        loop {
            match self.peek() {
                Some(c) if is_ident_code_point(c) => {
                    result.push(c);
                    self.position += c.len_utf8();
                }
                Some('\\') if self.at_valid_escape() => {
                    self.position += 1;
                    result.push(self.consume_escaped_code_point());
                }
                _ => return result,
            }
        }
    }

    /// [§ 4.3.5 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    ///
    /// Called with the cursor on the opening quote. Unlike a stylesheet
    /// tokenizer, a newline or EOF before the closing quote is an error.
    pub(crate) fn consume_string(&mut self) -> SelectorResult<String> {
        let start = self.offset();
        let ending = self
            .consume()
            .ok_or(SelectorSyntaxError::UnexpectedEnd { expected: "a string" })?;
        let mut value = String::new();
        loop {
            match self.consume() {
                Some(c) if c == ending => return Ok(value),
                None | Some('\n') => {
                    return Err(SelectorSyntaxError::UnterminatedString { position: start });
                }
                Some('\\') => match self.peek() {
                    // "If the next input code point is EOF, do nothing."
                    None => {}
                    // "Otherwise, if the next input code point is a newline, consume it."
                    Some('\n') => self.position += 1,
                    Some(_) => value.push(self.consume_escaped_code_point()),
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// An unquoted attribute value: everything up to whitespace or `]`,
    /// with escapes decoded.
    pub(crate) fn consume_unquoted_value(&mut self) -> String {
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if is_whitespace(c) || c == ']' {
                break;
            }
            self.position += c.len_utf8();
            if c == '\\' && !self.is_eof() {
                value.push(self.consume_escaped_code_point());
            } else {
                value.push(c);
            }
        }
        value
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    ///
    /// Called after the backslash has been consumed.
    fn consume_escaped_code_point(&mut self) -> char {
        match self.consume() {
            // "hex digit"
            Some(c) if c.is_ascii_hexdigit() => {
                let mut hex = c.to_string();
                // "Consume as many hex digits as possible, but no more than 5."
                while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    if let Some(digit) = self.consume() {
                        hex.push(digit);
                    }
                }
                // "If the next input code point is whitespace, consume it as well."
                if self.peek().is_some_and(is_whitespace) {
                    self.position += 1;
                }
                // "If this number is zero, or is for a surrogate, or is greater than the
                // maximum allowed code point, return U+FFFD REPLACEMENT CHARACTER."
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|&cp| cp != 0)
                    .and_then(char::from_u32)
                    .unwrap_or('\u{FFFD}')
            }
            // "EOF: This is a parse error. Return U+FFFD REPLACEMENT CHARACTER."
            None => '\u{FFFD}',
            // "anything else: Return the current input code point."
            Some(c) => c,
        }
    }
}

/// [§ 4.2 Definitions - whitespace](https://www.w3.org/TR/css-syntax-3/#whitespace)
pub(crate) const fn is_whitespace(c: char) -> bool {
    matches!(c, '\n' | '\t' | ' ' | '\r' | '\x0C')
}

/// [§ 4.2 Definitions - ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
pub(crate) const fn is_ident_start_code_point(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// [§ 4.2 Definitions - ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
pub(crate) const fn is_ident_code_point(c: char) -> bool {
    is_ident_start_code_point(c) || c.is_ascii_digit() || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_string(input: &str) -> String {
        Cursor::new(input, 0).consume_string().unwrap()
    }

    #[test]
    fn test_escaped_space_in_string() {
        assert_eq!(decode_string(r#""value\ space""#), "value space");
        assert_eq!(decode_string(r"'value\ \space'"), "value space");
    }

    #[test]
    fn test_hex_escape_consumes_one_whitespace() {
        assert_eq!(decode_string(r#""a\20 b""#), "a b");
        assert_eq!(decode_string(r#""\41\42""#), "AB");
    }

    #[test]
    fn test_null_escape_is_replacement_character() {
        assert_eq!(decode_string(r#""\0""#), "\u{FFFD}");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Cursor::new("\"abc", 4).consume_string().unwrap_err();
        assert_eq!(err, SelectorSyntaxError::UnterminatedString { position: 4 });
    }

    #[test]
    fn test_consume_name_with_escape() {
        let mut cursor = Cursor::new(r"foo\.bar baz", 0);
        assert_eq!(cursor.consume_name(), "foo.bar");
        assert_eq!(cursor.rest(), " baz");
    }

    #[test]
    fn test_engine_prefix() {
        assert_eq!(engine_prefix("css=div"), Some(("css", 4)));
        assert_eq!(engine_prefix("css:light =div"), Some(("css:light", 11)));
        assert_eq!(engine_prefix("div[foo=bar]"), None);
        assert_eq!(engine_prefix("span:nth-child(2)"), None);
        assert_eq!(engine_prefix(" > span"), None);
    }
}
