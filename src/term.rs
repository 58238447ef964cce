//! Combinator term representation and canonical printing.
//!
//! Terms are binary application trees over single-character leaves. A leaf is
//! either one of the six combinators or a lowercase variable. Printing is the
//! canonical minimal-parenthesis form that round-trips through the parser.

use std::fmt::{self, Write};

/// The six combinators, identified by their rewrite rules:
///
/// ```text
/// S x y z -> x z (y z)
/// K x y   -> x
/// I x     -> x
/// B x y z -> x (y z)
/// C x y z -> x z y
/// W x y   -> x y y
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    S,
    K,
    I,
    B,
    C,
    W,
}

impl Combinator {
    pub const ALL: [Combinator; 6] = [
        Combinator::S,
        Combinator::K,
        Combinator::I,
        Combinator::B,
        Combinator::C,
        Combinator::W,
    ];

    #[inline]
    pub fn from_char(c: char) -> Option<Combinator> {
        match c {
            'S' => Some(Combinator::S),
            'K' => Some(Combinator::K),
            'I' => Some(Combinator::I),
            'B' => Some(Combinator::B),
            'C' => Some(Combinator::C),
            'W' => Some(Combinator::W),
            _ => None,
        }
    }

    #[inline]
    pub fn as_char(self) -> char {
        match self {
            Combinator::S => 'S',
            Combinator::K => 'K',
            Combinator::I => 'I',
            Combinator::B => 'B',
            Combinator::C => 'C',
            Combinator::W => 'W',
        }
    }

    /// Number of arguments the rule consumes.
    #[inline]
    pub fn arity(self) -> usize {
        match self {
            Combinator::S | Combinator::B | Combinator::C => 3,
            Combinator::K | Combinator::W => 2,
            Combinator::I => 1,
        }
    }

    /// Whether the rule strictly shrinks the term (K discards, I unwraps).
    /// S and W duplicate an argument; B and C only regroup.
    #[inline]
    pub fn shrinks(self) -> bool {
        matches!(self, Combinator::K | Combinator::I)
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A combinator expression.
///
/// `Clone` is a deep copy: subtrees are never shared, so duplicating an
/// argument (S's z, W's y) yields fully independent copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Combinator tag or lowercase variable.
    Leaf(char),
    /// Left applied to right; `x y z` is `App(App(x, y), z)`.
    App(Box<Term>, Box<Term>),
}

impl Term {
    #[inline]
    pub fn leaf(c: char) -> Term {
        Term::Leaf(c)
    }

    #[inline]
    pub fn app(left: Term, right: Term) -> Term {
        Term::App(Box::new(left), Box::new(right))
    }

    /// The combinator this leaf names, if it is one.
    #[inline]
    pub fn combinator(&self) -> Option<Combinator> {
        match self {
            Term::Leaf(c) => Combinator::from_char(*c),
            Term::App(_, _) => None,
        }
    }

    /// Number of leaves.
    pub fn size(&self) -> usize {
        match self {
            Term::Leaf(_) => 1,
            Term::App(left, right) => left.size() + right.size(),
        }
    }

    /// Height of the application tree.
    pub fn depth(&self) -> usize {
        match self {
            Term::Leaf(_) => 1,
            Term::App(left, right) => 1 + left.depth().max(right.depth()),
        }
    }

    /// Length of the canonical rendering in bytes.
    pub fn print_len(&self) -> usize {
        match self {
            Term::Leaf(_) => 1,
            Term::App(left, right) => {
                let wrapped = matches!(**right, Term::App(_, _));
                left.print_len() + right.print_len() + if wrapped { 2 } else { 0 }
            }
        }
    }
}

impl fmt::Display for Term {
    /// Canonical form: left children print bare (left-associativity needs no
    /// parens on the left), right children are parenthesized iff they are
    /// applications.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Leaf(c) => write!(f, "{}", c),
            Term::App(left, right) => {
                write!(f, "{}", left)?;
                match **right {
                    Term::App(_, _) => write!(f, "({})", right),
                    _ => write!(f, "{}", right),
                }
            }
        }
    }
}

/// Canonical rendering of a term.
pub fn print(term: &Term) -> String {
    let mut out = String::with_capacity(term.print_len());
    // fmt::Write on String never fails
    let _ = write!(out, "{}", term);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arities() {
        assert_eq!(Combinator::S.arity(), 3);
        assert_eq!(Combinator::K.arity(), 2);
        assert_eq!(Combinator::I.arity(), 1);
        assert_eq!(Combinator::B.arity(), 3);
        assert_eq!(Combinator::C.arity(), 3);
        assert_eq!(Combinator::W.arity(), 2);
    }

    #[test]
    fn test_char_round_trip() {
        for comb in Combinator::ALL {
            assert_eq!(Combinator::from_char(comb.as_char()), Some(comb));
        }
        assert_eq!(Combinator::from_char('x'), None);
        assert_eq!(Combinator::from_char('A'), None);
    }

    #[test]
    fn test_display_flat_run() {
        // S K x prints without parens
        let term = Term::app(
            Term::app(Term::leaf('S'), Term::leaf('K')),
            Term::leaf('x'),
        );
        assert_eq!(term.to_string(), "SKx");
    }

    #[test]
    fn test_display_wraps_right_application() {
        // S (K x) keeps parens, (S K) x loses them
        let right_app = Term::app(
            Term::leaf('S'),
            Term::app(Term::leaf('K'), Term::leaf('x')),
        );
        assert_eq!(right_app.to_string(), "S(Kx)");

        let left_app = Term::app(
            Term::app(Term::leaf('S'), Term::leaf('K')),
            Term::leaf('x'),
        );
        assert_eq!(left_app.to_string(), "SKx");
    }

    #[test]
    fn test_print_len_matches_display() {
        let cases = [
            Term::leaf('S'),
            Term::app(
                Term::app(Term::leaf('a'), Term::app(Term::leaf('b'), Term::leaf('c'))),
                Term::app(Term::leaf('I'), Term::leaf('x')),
            ),
            // a(b(cd)): a wrapped child inside a wrapped child
            Term::app(
                Term::leaf('a'),
                Term::app(Term::leaf('b'), Term::app(Term::leaf('c'), Term::leaf('d'))),
            ),
        ];
        for term in cases {
            assert_eq!(term.print_len(), term.to_string().len(), "term {}", term);
            assert_eq!(print(&term), term.to_string());
        }
    }

    #[test]
    fn test_size_and_depth() {
        let term = Term::app(
            Term::app(Term::leaf('S'), Term::leaf('K')),
            Term::app(Term::leaf('I'), Term::leaf('x')),
        );
        assert_eq!(term.size(), 4);
        assert_eq!(term.depth(), 3);
    }

    #[test]
    fn test_clone_is_independent() {
        let term = Term::app(Term::leaf('I'), Term::leaf('x'));
        let copy = term.clone();
        assert_eq!(term, copy);
        drop(term);
        assert_eq!(copy.to_string(), "Ix");
    }
}
