//! Clause parser for the `css` engines.
//!
//! [§ 4 Selector syntax and structure](https://www.w3.org/TR/selectors-4/#syntax)
//!
//! The clause is split into comma-separated alternatives first (quote and
//! bracket aware), and each alternative is parsed left-to-right into
//! compound selectors and the combinators between them. The compounds are
//! then reversed so the subject is the head of the chain.

use std::str::FromStr;

use tracing::trace;

use super::{
    Combinator, ComplexSelector, CompoundSelector, Nth, PseudoClass, PseudoClassName,
    SelectorList, SimpleSelector,
};
use crate::attribute::{AttributeOperator, AttributePredicate, CaseSensitivity};
use crate::error::{SelectorResult, SelectorSyntaxError};
use crate::options::QueryOptions;
use crate::tokenizer::{Cursor, is_ident_code_point, is_ident_start_code_point, split_top_level};

/// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#selector-list)
///
/// Parse `clause` into a selector list. `offset` is the clause's position
/// within the whole selector and is added to error positions.
///
/// # Errors
///
/// Returns a [`SelectorSyntaxError`] for an empty alternative, a dangling
/// combinator, a malformed attribute selector, an unknown or disabled
/// pseudo-class, a malformed `An+B` argument, or any unexpected character.
pub fn parse_selector_list(
    clause: &str,
    offset: usize,
    options: &QueryOptions,
) -> SelectorResult<SelectorList> {
    let mut alternatives = Vec::new();
    for segment in split_top_level(clause, ",")
        .map_err(|error| error.shifted(offset))?
    {
        let mut cursor = Cursor::new(segment.text, offset + segment.offset);
        let _ = cursor.skip_whitespace();
        if cursor.is_eof() {
            // "a,,b", ",a", "a,"
            return Err(SelectorSyntaxError::UnexpectedEnd {
                expected: "a selector",
            });
        }
        let complex = parse_complex(&mut cursor, options)?;
        let _ = cursor.skip_whitespace();
        if !cursor.is_eof() {
            return Err(cursor.unexpected("',' or the end of the selector"));
        }
        alternatives.push(complex);
    }

    let list = SelectorList { alternatives };
    trace!(clause, %list, "parsed selector list");
    Ok(list)
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// "A complex selector is a chain of one or more compound selectors
/// separated by combinators."
fn parse_complex(cursor: &mut Cursor<'_>, options: &QueryOptions) -> SelectorResult<ComplexSelector> {
    let first = parse_compound(cursor, options)?;
    if first.simple_selectors.is_empty() {
        return Err(cursor.unexpected("a selector"));
    }

    let mut compounds = vec![first];
    let mut combinators_between = Vec::new();

    loop {
        let had_whitespace = cursor.skip_whitespace();
        let combinator = match cursor.peek() {
            None => break,
            Some('>') => Combinator::Child,
            Some('+') => Combinator::NextSibling,
            Some('~') => Combinator::SubsequentSibling,
            // [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
            // "A descendant combinator is whitespace that separates two
            // compound selectors."
            Some(_) if had_whitespace => Combinator::Descendant,
            Some(_) => return Err(cursor.unexpected("a combinator")),
        };
        if combinator != Combinator::Descendant {
            let _ = cursor.consume();
            let _ = cursor.skip_whitespace();
        }

        let compound = parse_compound(cursor, options)?;
        if compound.simple_selectors.is_empty() {
            // Dangling combinator: "div >", "a + + b"
            return Err(cursor.unexpected("a selector after the combinator"));
        }
        combinators_between.push(combinator);
        compounds.push(compound);
    }

    // Left-to-right [c0, c1, .., subject] with combinators [k1, .., kn]
    // becomes subject plus [(kn, cn-1), .., (k1, c0)].
    let Some(subject) = compounds.pop() else {
        return Err(cursor.unexpected("a selector"));
    };
    let combinators = combinators_between
        .into_iter()
        .zip(compounds)
        .rev()
        .collect();

    Ok(ComplexSelector {
        subject,
        combinators,
    })
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// Returns an empty compound when the cursor is not at a simple selector.
fn parse_compound(
    cursor: &mut Cursor<'_>,
    options: &QueryOptions,
) -> SelectorResult<CompoundSelector> {
    let mut simple_selectors = Vec::new();

    // [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    // [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    // Only the first simple selector of a compound may be a type or universal selector.
    if cursor.eat('*') {
        simple_selectors.push(SimpleSelector::Universal);
    } else if starts_identifier(cursor) {
        let name = cursor.consume_name();
        simple_selectors.push(SimpleSelector::Type(name.to_ascii_lowercase()));
    }

    loop {
        let simple = match cursor.peek() {
            // [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
            Some('#') => {
                let _ = cursor.consume();
                SimpleSelector::Id(expect_name(cursor, "an id")?)
            }
            // [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
            Some('.') => {
                let _ = cursor.consume();
                SimpleSelector::Class(expect_name(cursor, "a class name")?)
            }
            Some('[') => SimpleSelector::Attribute(parse_attribute(cursor)?),
            Some(':') => SimpleSelector::PseudoClass(parse_pseudo_class(cursor, options)?),
            Some('*') if !simple_selectors.is_empty() => {
                return Err(cursor.unexpected("a simple selector"));
            }
            _ => break,
        };
        simple_selectors.push(simple);
    }

    Ok(CompoundSelector { simple_selectors })
}

/// [§ 4.3.9 Check if three code points would start an ident sequence](https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier)
fn starts_identifier(cursor: &Cursor<'_>) -> bool {
    match cursor.peek() {
        Some('-') => match cursor.peek_at(1) {
            Some('\\') => cursor.peek_at(2).is_some_and(|c| c != '\n'),
            Some(c) => is_ident_start_code_point(c) || c == '-',
            None => false,
        },
        Some(c) if is_ident_start_code_point(c) => true,
        Some('\\') => cursor.at_valid_escape(),
        _ => false,
    }
}

fn expect_name(cursor: &mut Cursor<'_>, expected: &'static str) -> SelectorResult<String> {
    let starts_name = cursor.peek().is_some_and(is_ident_code_point) || cursor.at_valid_escape();
    if !starts_name {
        return Err(cursor.unexpected(expected));
    }
    Ok(cursor.consume_name())
}

/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// `[` ws* name ws* ( `]` | op ws* value ws* modifier? ws* `]` )
fn parse_attribute(cursor: &mut Cursor<'_>) -> SelectorResult<AttributePredicate> {
    let open = cursor.offset();
    let unclosed = SelectorSyntaxError::UnbalancedBracket {
        bracket: '[',
        position: open,
    };
    let _ = cursor.consume();
    let _ = cursor.skip_whitespace();

    if !starts_identifier(cursor) {
        return Err(if cursor.is_eof() {
            unclosed
        } else {
            cursor.unexpected("an attribute name")
        });
    }
    let name = cursor.consume_name();
    let _ = cursor.skip_whitespace();

    let operator_position = cursor.offset();
    let operator = match cursor.peek() {
        Some(']') => {
            let _ = cursor.consume();
            return Ok(AttributePredicate::exists(&name));
        }
        None => return Err(unclosed),
        Some('=') => {
            let _ = cursor.consume();
            AttributeOperator::Equals
        }
        Some(c) => {
            let _ = cursor.consume();
            match AttributeOperator::from_prefix(c) {
                Some(operator) if cursor.eat('=') => operator,
                _ => {
                    let mut text = c.to_string();
                    if let Some(next) = cursor.peek().filter(|&n| n != ']' && n != ' ') {
                        text.push(next);
                    }
                    return Err(SelectorSyntaxError::InvalidAttributeOperator {
                        operator: text,
                        position: operator_position,
                    });
                }
            }
        }
    };
    let _ = cursor.skip_whitespace();

    let value = match cursor.peek() {
        Some('"' | '\'') => cursor.consume_string()?,
        None => return Err(unclosed),
        Some(']') => return Err(cursor.unexpected("an attribute value")),
        Some(_) => cursor.consume_unquoted_value(),
    };
    let _ = cursor.skip_whitespace();

    // [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
    let modifier_position = cursor.offset();
    let case = match cursor.peek() {
        Some(']') => CaseSensitivity::Sensitive,
        None => return Err(unclosed),
        Some(c) => {
            let modifier = if is_ident_code_point(c) {
                cursor.consume_name()
            } else {
                let _ = cursor.consume();
                c.to_string()
            };
            match modifier.as_str() {
                "i" | "I" => CaseSensitivity::Insensitive,
                "s" | "S" => CaseSensitivity::ExplicitlySensitive,
                _ => {
                    return Err(SelectorSyntaxError::InvalidAttributeModifier {
                        modifier,
                        position: modifier_position,
                    });
                }
            }
        }
    };
    let _ = cursor.skip_whitespace();

    if cursor.eat(']') {
        Ok(AttributePredicate::new(&name, operator, &value, case))
    } else if cursor.is_eof() {
        Err(unclosed)
    } else {
        Err(cursor.unexpected("']'"))
    }
}

/// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
fn parse_pseudo_class(
    cursor: &mut Cursor<'_>,
    options: &QueryOptions,
) -> SelectorResult<PseudoClass> {
    let _ = cursor.consume();

    // [§ 3.6 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
    // Pseudo-elements never name an element, so they cannot be a query subject.
    if cursor.peek() == Some(':') {
        let _ = cursor.consume();
        return Err(SelectorSyntaxError::UnknownPseudoClass {
            name: format!(":{}", cursor.consume_name()),
        });
    }

    let written = expect_name(cursor, "a pseudo-class name")?;
    let unknown = || SelectorSyntaxError::UnknownPseudoClass {
        name: written.clone(),
    };
    let name = PseudoClassName::from_str(&written).map_err(|_| unknown())?;
    if !options.allows(name) {
        return Err(unknown());
    }

    let has_arguments = cursor.peek() == Some('(');
    if has_arguments != name.is_functional() {
        return Err(if has_arguments {
            cursor.unexpected("the end of a pseudo-class")
        } else {
            SelectorSyntaxError::UnexpectedEnd {
                expected: "a parenthesized argument",
            }
        });
    }

    let pseudo = match name {
        PseudoClassName::Root => PseudoClass::Root,
        PseudoClassName::Scope => PseudoClass::Scope,
        PseudoClassName::Empty => PseudoClass::Empty,
        PseudoClassName::FirstChild => PseudoClass::FirstChild,
        PseudoClassName::LastChild => PseudoClass::LastChild,
        PseudoClassName::OnlyChild => PseudoClass::OnlyChild,
        PseudoClassName::FirstOfType => PseudoClass::FirstOfType,
        PseudoClassName::LastOfType => PseudoClass::LastOfType,
        PseudoClassName::OnlyOfType => PseudoClass::OnlyOfType,
        PseudoClassName::NthChild => PseudoClass::NthChild(parse_nth_argument(cursor)?),
        PseudoClassName::NthLastChild => PseudoClass::NthLastChild(parse_nth_argument(cursor)?),
        PseudoClassName::NthOfType => PseudoClass::NthOfType(parse_nth_argument(cursor)?),
        PseudoClassName::NthLastOfType => PseudoClass::NthLastOfType(parse_nth_argument(cursor)?),
        // [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
        PseudoClassName::Not => {
            let (offset, arguments) = consume_arguments(cursor)?;
            PseudoClass::Not(parse_selector_list(arguments, offset, options)?)
        }
    };
    Ok(pseudo)
}

fn parse_nth_argument(cursor: &mut Cursor<'_>) -> SelectorResult<Nth> {
    let (_, arguments) = consume_arguments(cursor)?;
    Nth::parse(arguments)
}

/// Consume `( ... )` and return the argument text with its offset.
///
/// Nested parentheses and quoted literals are skipped over.
fn consume_arguments<'a>(cursor: &mut Cursor<'a>) -> SelectorResult<(usize, &'a str)> {
    let open = cursor.offset();
    let _ = cursor.consume();
    let rest = cursor.rest();

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                let _ = chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') if depth == 0 => {
                let arguments = &rest[..i];
                cursor.advance(i + 1);
                return Ok((open + 1, arguments));
            }
            (None, ')') => depth -= 1,
            (None, _) => {}
        }
    }

    Err(SelectorSyntaxError::UnbalancedBracket {
        bracket: '(',
        position: open,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(clause: &str) -> SelectorResult<SelectorList> {
        parse_selector_list(clause, 0, &QueryOptions::default())
    }

    #[test]
    fn test_combinators_are_stored_right_to_left() {
        let list = parse("section > div div span").unwrap();
        let complex = &list.alternatives[0];
        assert_eq!(
            complex.subject.simple_selectors,
            vec![SimpleSelector::Type("span".to_string())]
        );
        let kinds: Vec<Combinator> = complex.combinators.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            kinds,
            vec![Combinator::Descendant, Combinator::Descendant, Combinator::Child]
        );
        assert_eq!(
            complex.combinators[2].1.simple_selectors,
            vec![SimpleSelector::Type("section".to_string())]
        );
    }

    #[test]
    fn test_combinator_spacing_is_irrelevant() {
        for clause in ["div>span", "div > span", "div >span", "div>  span"] {
            assert_eq!(parse(clause).unwrap().to_string(), "div > span", "{clause}");
        }
    }

    #[test]
    fn test_compound_with_everything() {
        let list = parse(r#"DIV#main.a.b[foo="bar"]:first-child"#).unwrap();
        let simple = &list.alternatives[0].subject.simple_selectors;
        assert_eq!(simple.len(), 6);
        assert_eq!(simple[0], SimpleSelector::Type("div".to_string()));
        assert_eq!(simple[1], SimpleSelector::Id("main".to_string()));
        assert_eq!(simple[5], SimpleSelector::PseudoClass(PseudoClass::FirstChild));
    }

    #[test]
    fn test_comma_inside_attribute_value() {
        let list = parse(r#"div[attr="hello,world!"], span"#).unwrap();
        assert_eq!(list.alternatives.len(), 2);
    }

    #[test]
    fn test_attribute_forms() {
        let list = parse(r"[attr ^=hello ]").unwrap();
        let SimpleSelector::Attribute(predicate) = &list.alternatives[0].subject.simple_selectors[0]
        else {
            panic!("expected an attribute selector");
        };
        assert_eq!(predicate.operator, AttributeOperator::Prefix);
        assert_eq!(predicate.value, "hello");

        let list = parse(r#"[attr = "Hello World" i ]"#).unwrap();
        let SimpleSelector::Attribute(predicate) = &list.alternatives[0].subject.simple_selectors[0]
        else {
            panic!("expected an attribute selector");
        };
        assert_eq!(predicate.case, CaseSensitivity::Insensitive);
    }

    #[test]
    fn test_attribute_errors() {
        assert!(matches!(
            parse("[attr%=x]"),
            Err(SelectorSyntaxError::InvalidAttributeOperator { .. })
        ));
        assert!(matches!(
            parse("[attr=x q]"),
            Err(SelectorSyntaxError::InvalidAttributeModifier { .. })
        ));
        assert!(matches!(
            parse("[attr=x"),
            Err(SelectorSyntaxError::UnbalancedBracket { bracket: '[', .. })
        ));
    }

    #[test]
    fn test_empty_alternative_and_dangling_combinator() {
        assert!(parse("a,,b").is_err());
        assert!(parse("a,").is_err());
        assert!(parse("div >").is_err());
        assert!(parse("> div").is_err());
        assert!(parse("a + + b").is_err());
    }

    #[test]
    fn test_pseudo_classes() {
        let list = parse("li:nth-child(2n+1):not(.skip, #x)").unwrap();
        let simple = &list.alternatives[0].subject.simple_selectors;
        assert_eq!(
            simple[1],
            SimpleSelector::PseudoClass(PseudoClass::NthChild(Nth { a: 2, b: 1 }))
        );
        let SimpleSelector::PseudoClass(PseudoClass::Not(inner)) = &simple[2] else {
            panic!("expected :not()");
        };
        assert_eq!(inner.alternatives.len(), 2);
    }

    #[test]
    fn test_unknown_and_disabled_pseudo_classes() {
        assert_eq!(
            parse("a:hover"),
            Err(SelectorSyntaxError::UnknownPseudoClass {
                name: "hover".to_string()
            })
        );
        assert!(parse("p::before").is_err());

        let options = QueryOptions::default().without_pseudo_class(PseudoClassName::Empty);
        assert!(parse_selector_list("p:empty", 0, &options).is_err());
    }

    #[test]
    fn test_functional_mismatch() {
        assert!(parse("p:first-child()").is_err());
        assert!(parse("p:nth-child").is_err());
        assert!(matches!(
            parse("p:nth-child(foo)"),
            Err(SelectorSyntaxError::InvalidNth { .. })
        ));
        assert!(matches!(
            parse("p:not(a"),
            Err(SelectorSyntaxError::UnbalancedBracket { .. })
        ));
    }

    #[test]
    fn test_error_positions_include_offset() {
        let err = parse_selector_list("div $ span", 10, &QueryOptions::default()).unwrap_err();
        assert_eq!(
            err,
            SelectorSyntaxError::UnexpectedCharacter {
                found: '$',
                position: 14
            }
        );
    }
}
