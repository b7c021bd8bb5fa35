//! Attribute selectors per [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors).

use std::fmt;

use crate::selector::{write_identifier, write_string};

/// [§ 6.1 Attribute presence and value selectors](https://www.w3.org/TR/selectors-4/#attribute-representation)
/// [§ 6.2 Substring matching attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-substrings)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[att]`: "Represents an element with the att attribute, whatever the
    /// value of the attribute."
    Exists,

    /// `[att=val]`: "Represents an element with the att attribute whose value
    /// is exactly 'val'."
    Equals,

    /// `[att~=val]`: "Represents an element with the att attribute whose value
    /// is a whitespace-separated list of words, one of which is exactly 'val'.
    /// If 'val' contains whitespace, it will never represent anything."
    Includes,

    /// `[att|=val]`: "Represents an element with the att attribute, its value
    /// either being exactly 'val' or beginning with 'val' immediately
    /// followed by '-'."
    DashMatch,

    /// `[att^=val]`: "Represents an element with the att attribute whose value
    /// begins with the prefix 'val'. If 'val' is the empty string then the
    /// selector does not represent anything."
    Prefix,

    /// `[att$=val]`: "...whose value ends with the suffix 'val'."
    Suffix,

    /// `[att*=val]`: "...whose value contains at least one instance of the
    /// substring 'val'."
    Substring,
}

impl AttributeOperator {
    /// Operator text as written between name and value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exists => "",
            Self::Equals => "=",
            Self::Includes => "~=",
            Self::DashMatch => "|=",
            Self::Prefix => "^=",
            Self::Suffix => "$=",
            Self::Substring => "*=",
        }
    }

    /// Operator for the character preceding `=`, or `None` for a bare `=`.
    pub(crate) const fn from_prefix(c: char) -> Option<Self> {
        match c {
            '~' => Some(Self::Includes),
            '|' => Some(Self::DashMatch),
            '^' => Some(Self::Prefix),
            '$' => Some(Self::Suffix),
            '*' => Some(Self::Substring),
            _ => None,
        }
    }
}

/// [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseSensitivity {
    /// Default matching: values compare exactly.
    #[default]
    Sensitive,
    /// The `i` modifier: "the attribute value is matched ASCII
    /// case-insensitively", extended here to a full locale-independent
    /// lower-case mapping.
    Insensitive,
    /// The explicit `s` modifier.
    ExplicitlySensitive,
}

/// One bracketed attribute test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePredicate {
    /// Attribute name, ASCII-lowercased.
    pub name: String,
    /// Comparison operator.
    pub operator: AttributeOperator,
    /// Expected value with escapes decoded; empty for [`AttributeOperator::Exists`].
    pub value: String,
    /// Case-sensitivity modifier.
    pub case: CaseSensitivity,
}

impl AttributePredicate {
    /// `[name]`
    #[must_use]
    pub fn exists(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            operator: AttributeOperator::Exists,
            value: String::new(),
            case: CaseSensitivity::Sensitive,
        }
    }

    /// `[name op "value"]`
    #[must_use]
    pub fn new(name: &str, operator: AttributeOperator, value: &str, case: CaseSensitivity) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            operator,
            value: value.to_string(),
            case,
        }
    }

    /// Evaluate against the candidate's value for [`name`](Self::name).
    ///
    /// A missing attribute never matches.
    #[must_use]
    pub fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        if self.operator == AttributeOperator::Exists {
            return true;
        }

        if self.case == CaseSensitivity::Insensitive {
            compare(self.operator, &actual.to_lowercase(), &self.value.to_lowercase())
        } else {
            compare(self.operator, actual, &self.value)
        }
    }
}

fn compare(operator: AttributeOperator, actual: &str, expected: &str) -> bool {
    match operator {
        AttributeOperator::Exists => true,
        AttributeOperator::Equals => actual == expected,
        AttributeOperator::Includes => {
            !expected.is_empty()
                && !expected.contains(char::is_whitespace)
                && actual.split_whitespace().any(|word| word == expected)
        }
        AttributeOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
    }
}

impl fmt::Display for AttributePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        write_identifier(f, &self.name)?;
        if self.operator != AttributeOperator::Exists {
            f.write_str(self.operator.as_str())?;
            write_string(f, &self.value)?;
            match self.case {
                CaseSensitivity::Sensitive => {}
                CaseSensitivity::Insensitive => f.write_str(" i")?,
                CaseSensitivity::ExplicitlySensitive => f.write_str(" s")?,
            }
        }
        f.write_str("]")
    }
}
