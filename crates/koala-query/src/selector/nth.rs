//! [§ 6.2 The An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)

use std::fmt;

use crate::error::{SelectorResult, SelectorSyntaxError};

/// "The An+B notation defines an integer step (A) and offset (B), and
/// represents the An+Bth elements in a list, for every positive integer or
/// zero value of n, with the first element in the list having index 1."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    /// Step.
    pub a: i32,
    /// Offset.
    pub b: i32,
}

impl Nth {
    /// Parse the argument of an `:nth-*()` pseudo-class.
    ///
    /// Accepts `odd`, `even`, an integer, and `An+B` forms such as `2n+1`,
    /// `-n+3`, `n`, `+5n - 2`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorSyntaxError::InvalidNth`] for anything else.
    pub fn parse(expression: &str) -> SelectorResult<Self> {
        let invalid = || SelectorSyntaxError::InvalidNth {
            expression: expression.to_string(),
        };
        let compact: String = expression
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        // "odd": "Equivalent to 2n+1." / "even": "Equivalent to 2n."
        match compact.as_str() {
            "odd" => return Ok(Self { a: 2, b: 1 }),
            "even" => return Ok(Self { a: 2, b: 0 }),
            "" => return Err(invalid()),
            _ => {}
        }

        let Some((step, offset)) = compact.split_once('n') else {
            let b = compact.parse().map_err(|_| invalid())?;
            return Ok(Self { a: 0, b });
        };

        let a = match step {
            "" | "+" => 1,
            "-" => -1,
            digits => digits.parse().map_err(|_| invalid())?,
        };
        let b = if offset.is_empty() {
            0
        } else if offset.starts_with(['+', '-']) && offset.len() > 1 {
            offset.parse().map_err(|_| invalid())?
        } else {
            return Err(invalid());
        };
        Ok(Self { a, b })
    }

    /// Whether the 1-based `index` is one of the An+Bth positions.
    #[must_use]
    pub fn matches(self, index: i32) -> bool {
        // `index - b` and `diff / a` can overflow i32 at the extremes.
        let (a, b) = (i64::from(self.a), i64::from(self.b));
        let index = i64::from(index);
        if a == 0 {
            return index == b;
        }
        let diff = index - b;
        // n = diff / a must be a non-negative integer.
        diff % a == 0 && diff / a >= 0
    }
}

impl fmt::Display for Nth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.a, self.b) {
            (0, b) => write!(f, "{b}"),
            (a, b) => {
                match a {
                    1 => f.write_str("n")?,
                    -1 => f.write_str("-n")?,
                    a => write!(f, "{a}n")?,
                }
                match b {
                    0 => Ok(()),
                    b if b > 0 => write!(f, "+{b}"),
                    b => write!(f, "{b}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Nth::parse("odd").unwrap(), Nth { a: 2, b: 1 });
        assert_eq!(Nth::parse(" EVEN ").unwrap(), Nth { a: 2, b: 0 });
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(Nth::parse("2").unwrap(), Nth { a: 0, b: 2 });
        assert_eq!(Nth::parse("n").unwrap(), Nth { a: 1, b: 0 });
        assert_eq!(Nth::parse("-n+3").unwrap(), Nth { a: -1, b: 3 });
        assert_eq!(Nth::parse("+5n - 2").unwrap(), Nth { a: 5, b: -2 });
        assert_eq!(Nth::parse("3n+0").unwrap(), Nth { a: 3, b: 0 });
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "x", "2n+", "n3", "2n1", "1.5"] {
            assert!(Nth::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_matches() {
        let odd = Nth { a: 2, b: 1 };
        assert!(odd.matches(1) && odd.matches(3) && !odd.matches(2));

        let first_three = Nth { a: -1, b: 3 };
        assert!(first_three.matches(1) && first_three.matches(3));
        assert!(!first_three.matches(4));

        assert!(Nth { a: 0, b: 2 }.matches(2));
        assert!(!Nth { a: 0, b: 2 }.matches(1));
    }

    #[test]
    fn test_extreme_offsets_do_not_overflow() {
        let far_back = Nth::parse("n-2147483648").unwrap();
        assert_eq!(far_back, Nth { a: 1, b: i32::MIN });
        assert!(far_back.matches(1));

        let far_ahead = Nth::parse("-n+2147483647").unwrap();
        assert!(far_ahead.matches(1) && far_ahead.matches(i32::MAX));

        assert!(!Nth { a: -1, b: i32::MIN }.matches(1));
        assert!(Nth { a: i32::MIN, b: i32::MAX }.matches(i32::MAX));
        assert!(!Nth { a: 0, b: i32::MIN }.matches(1));
    }

    #[test]
    fn test_display_reparses() {
        for text in ["odd", "-n+3", "4", "n", "3n-1"] {
            let nth = Nth::parse(text).unwrap();
            assert_eq!(Nth::parse(&nth.to_string()).unwrap(), nth);
        }
    }
}
