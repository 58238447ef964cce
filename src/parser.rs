//! Parsing of combinator term text into the tree representation.
//!
//! The grammar is a non-empty left-associative run of atoms; an atom is a
//! single alphabetic character or a parenthesized subterm. Validation runs
//! before any tree is built, so parsing is all-or-nothing.

use crate::term::Term;
use std::error::Error;
use std::fmt;

/// Rejection reasons for term text. Offsets are byte positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A byte outside {S,K,I,B,C,W, a-z, '(', ')'}.
    InvalidCharacter { offset: usize },
    /// A ')' with no open '(' before it, or a '(' that never closes.
    UnbalancedParens { offset: usize },
    /// Empty input, or an empty '()' group.
    Empty,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidCharacter { offset } => {
                write!(f, "invalid character at offset {}", offset)
            }
            ParseError::UnbalancedParens { offset } => {
                write!(f, "unbalanced parenthesis at offset {}", offset)
            }
            ParseError::Empty => write!(f, "empty term"),
        }
    }
}

impl Error for ParseError {}

/// Whether `b` may appear as a leaf: combinator tag or lowercase variable.
#[inline]
pub(crate) fn is_atom_byte(b: u8) -> bool {
    matches!(b, b'S' | b'K' | b'I' | b'B' | b'C' | b'W' | b'a'..=b'z')
}

/// Check alphabet and parenthesis balance without building anything.
///
/// Balance must never go negative at any prefix; a surviving open paren is
/// reported at the position of the first one that never closes.
pub fn validate(input: &str) -> Result<(), ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut opens: Vec<usize> = Vec::new();
    for (offset, &b) in input.as_bytes().iter().enumerate() {
        match b {
            b'(' => opens.push(offset),
            b')' => {
                if opens.pop().is_none() {
                    return Err(ParseError::UnbalancedParens { offset });
                }
            }
            _ if is_atom_byte(b) => {}
            _ => return Err(ParseError::InvalidCharacter { offset }),
        }
    }
    if let Some(&offset) = opens.first() {
        return Err(ParseError::UnbalancedParens { offset });
    }
    Ok(())
}

/// Parse term text into a tree.
pub fn parse(input: &str) -> Result<Term, ParseError> {
    validate(input)?;
    let bytes = input.as_bytes();
    parse_run(bytes, 0, bytes.len())
}

/// Parse `bytes[start..end]` as a left-associative run of atoms.
fn parse_run(bytes: &[u8], start: usize, end: usize) -> Result<Term, ParseError> {
    let mut acc: Option<Term> = None;
    let mut i = start;
    while i < end {
        let atom = if bytes[i] == b'(' {
            let close = matching_paren(bytes, i);
            let inner = parse_run(bytes, i + 1, close)?;
            i = close + 1;
            inner
        } else {
            let leaf = Term::leaf(bytes[i] as char);
            i += 1;
            leaf
        };
        acc = Some(match acc {
            None => atom,
            Some(left) => Term::app(left, atom),
        });
    }
    // None here means an empty input range, i.e. a '()' group.
    acc.ok_or(ParseError::Empty)
}

/// Index of the ')' matching the '(' at `open`. Balance was verified by
/// `validate`, so the match always exists.
pub(crate) fn matching_paren(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    loop {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::print;

    #[test]
    fn test_single_leaf() {
        assert_eq!(parse("x").unwrap(), Term::leaf('x'));
        assert_eq!(parse("S").unwrap(), Term::leaf('S'));
    }

    #[test]
    fn test_left_associativity() {
        // abc == (ab)c
        let expected = Term::app(
            Term::app(Term::leaf('a'), Term::leaf('b')),
            Term::leaf('c'),
        );
        assert_eq!(parse("abc").unwrap(), expected);
        assert_eq!(parse("(ab)c").unwrap(), expected);
        assert_eq!(parse("((ab)c)").unwrap(), expected);
    }

    #[test]
    fn test_parens_group_right() {
        // a(bc) != abc
        let grouped = Term::app(
            Term::leaf('a'),
            Term::app(Term::leaf('b'), Term::leaf('c')),
        );
        assert_eq!(parse("a(bc)").unwrap(), grouped);
        assert_ne!(parse("a(bc)").unwrap(), parse("abc").unwrap());
    }

    #[test]
    fn test_redundant_parens_collapse() {
        assert_eq!(parse("((a))").unwrap(), Term::leaf('a'));
        assert_eq!(parse("(a)(b)").unwrap(), parse("ab").unwrap());
        assert_eq!(parse("a((bc))").unwrap(), parse("a(bc)").unwrap());
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            "x",
            "SKx",
            "Sxyz",
            "a(bc)d",
            "S(KI)(Ix)(Sxyz)",
            "W(ab)(cd)",
            "SII(SII)",
            "B(a(bc))(de)f",
        ];
        for s in cases {
            let term = parse(s).unwrap();
            let printed = print(&term);
            assert_eq!(parse(&printed).unwrap(), term, "round trip of {:?}", s);
        }
    }

    #[test]
    fn test_canonical_strings_print_identically() {
        // Already-minimal strings come back unchanged.
        for s in ["x", "SKx", "a(bc)d", "S(KI)(Ix)(Sxyz)", "xz(yz)"] {
            assert_eq!(print(&parse(s).unwrap()), s);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), Err(ParseError::Empty));
    }

    #[test]
    fn test_empty_group() {
        assert_eq!(parse("a()b"), Err(ParseError::Empty));
        assert_eq!(parse("()"), Err(ParseError::Empty));
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(parse("a$b"), Err(ParseError::InvalidCharacter { offset: 1 }));
        // Uppercase letters that are not combinators are invalid.
        assert_eq!(parse("Ab"), Err(ParseError::InvalidCharacter { offset: 0 }));
        assert_eq!(parse("ab c"), Err(ParseError::InvalidCharacter { offset: 2 }));
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(parse("ab)"), Err(ParseError::UnbalancedParens { offset: 2 }));
        assert_eq!(parse("(ab"), Err(ParseError::UnbalancedParens { offset: 0 }));
        // First never-closed open paren is reported.
        assert_eq!(parse("(()"), Err(ParseError::UnbalancedParens { offset: 0 }));
        assert_eq!(parse(")("), Err(ParseError::UnbalancedParens { offset: 0 }));
    }

    #[test]
    fn test_validate_accepts_full_alphabet() {
        assert!(validate("SKIBCW(abcdefghijklmnopqrstuvwxyz)").is_ok());
    }

    #[test]
    fn test_validate_leaves_empty_group_to_parse() {
        // Balance-wise "()" is fine; only parsing rejects the empty group.
        assert!(validate("a()b").is_ok());
        assert_eq!(parse("a()b"), Err(ParseError::Empty));
    }
}
