//! Tree reduction engine.
//!
//! Rewrites operate on [`Term`] values directly: the redex's spine is torn
//! into head and arguments, the rule's right-hand side is rebuilt from owned
//! subterms, and trailing arguments are folded back on. Duplicating rules
//! clone their argument, so the two copies never share structure.

use std::error::Error;
use std::fmt;
use std::time::Instant;

use crate::redex::{find_redexes, select_redex, Redex};
use crate::term::{Combinator, Term};

/// A redex path did not land on a saturated combinator spine.
///
/// Only stale [`Redex`] values trigger this: anything returned by
/// [`find_redexes`] for the same term applies cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArityError {
    /// Head combinator found at the path, if any.
    pub head: Option<Combinator>,
    /// Arguments available on the spine.
    pub args: usize,
}

impl fmt::Display for ArityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.head {
            Some(head) => write!(
                f,
                "combinator {} needs {} arguments, found {}",
                head,
                head.arity(),
                self.args
            ),
            None => write!(f, "spine head is not a combinator"),
        }
    }
}

impl Error for ArityError {}

/// Applies `redex` to `term`, producing the rewritten term.
pub fn apply_redex(term: &Term, redex: &Redex) -> Result<Term, ArityError> {
    rewrite_at(term.clone(), &redex.path)
}

/// Performs the preferred single step: the leftmost K or I redex if one
/// exists, else the leftmost redex. Returns `None` on a normal form.
pub fn reduce_step(term: &Term) -> Option<Term> {
    let found = find_redexes(term);
    let pick = select_redex(found.iter().map(|r| r.head))?;
    apply_redex(term, &found[pick]).ok()
}

fn rewrite_at(term: Term, path: &[usize]) -> Result<Term, ArityError> {
    let step = match path.split_first() {
        None => return rewrite_spine(term),
        Some(step) => step,
    };
    match term {
        Term::Leaf(_) => Err(ArityError {
            head: None,
            args: 0,
        }),
        Term::App(left, right) => match step {
            (&0, rest) => Ok(Term::App(Box::new(rewrite_at(*left, rest)?), right)),
            (_, rest) => Ok(Term::App(left, Box::new(rewrite_at(*right, rest)?))),
        },
    }
}

/// Rewrites the spine rooted at `term` with its head combinator's rule and
/// reattaches any arguments beyond the arity.
fn rewrite_spine(term: Term) -> Result<Term, ArityError> {
    let mut args = Vec::new();
    let mut node = term;
    while let Term::App(left, right) = node {
        args.push(*right);
        node = *left;
    }
    args.reverse();

    let head = match node.combinator() {
        Some(head) => head,
        None => {
            return Err(ArityError {
                head: None,
                args: args.len(),
            })
        }
    };
    if args.len() < head.arity() {
        return Err(ArityError {
            head: Some(head),
            args: args.len(),
        });
    }

    let trailing = args.split_off(head.arity());
    let mut it = args.into_iter();
    // arity checked above
    let rewritten = match head {
        Combinator::S => {
            let x = it.next().unwrap();
            let y = it.next().unwrap();
            let z = it.next().unwrap();
            Term::app(Term::app(x, z.clone()), Term::app(y, z))
        }
        Combinator::K => it.next().unwrap(),
        Combinator::I => it.next().unwrap(),
        Combinator::B => {
            let x = it.next().unwrap();
            let y = it.next().unwrap();
            let z = it.next().unwrap();
            Term::app(x, Term::app(y, z))
        }
        Combinator::C => {
            let x = it.next().unwrap();
            let y = it.next().unwrap();
            let z = it.next().unwrap();
            Term::app(Term::app(x, z), y)
        }
        Combinator::W => {
            let x = it.next().unwrap();
            let y = it.next().unwrap();
            Term::app(Term::app(x, y.clone()), y)
        }
    };
    Ok(trailing.into_iter().fold(rewritten, Term::app))
}

/// Reduces terms to normal form under a step budget.
#[derive(Debug, Clone)]
pub struct Reducer {
    max_steps: usize,
}

/// Outcome of [`Reducer::reduce`].
#[derive(Debug, Clone)]
pub struct Reduction {
    /// Term after the final step.
    pub final_term: Term,
    /// Rewrites performed.
    pub steps: usize,
    /// Wall-clock time in milliseconds.
    pub total_time_ms: f64,
    /// True when a normal form was reached within the step budget.
    pub converged: bool,
}

impl Reducer {
    pub fn new(max_steps: usize) -> Reducer {
        Reducer { max_steps }
    }

    /// Repeatedly rewrites the preferred redex until no redex remains or
    /// the step budget runs out. Shrinking K and I redexes fire first, then
    /// the leftmost, matching [`crate::soup::Soup::reduce`] step for step.
    pub fn reduce(&self, term: &Term) -> Reduction {
        let start = Instant::now();
        let mut current = term.clone();
        let mut steps = 0;
        let mut converged = false;
        loop {
            if steps >= self.max_steps {
                break;
            }
            let found = find_redexes(&current);
            let pick = match select_redex(found.iter().map(|r| r.head)) {
                Some(i) => i,
                None => {
                    converged = true;
                    break;
                }
            };
            match apply_redex(&current, &found[pick]) {
                Ok(next) => current = next,
                // redexes found on the current term always apply
                Err(_) => break,
            }
            steps += 1;
        }
        Reduction {
            final_term: current,
            steps,
            total_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::term::print;

    fn step(s: &str) -> String {
        print(&reduce_step(&parse(s).unwrap()).unwrap())
    }

    fn normal_form(s: &str, max_steps: usize) -> Reduction {
        Reducer::new(max_steps).reduce(&parse(s).unwrap())
    }

    #[test]
    fn test_rule_table() {
        assert_eq!(step("Sxyz"), "xz(yz)");
        assert_eq!(step("Kxy"), "x");
        assert_eq!(step("Ix"), "x");
        assert_eq!(step("Bxyz"), "x(yz)");
        assert_eq!(step("Cxyz"), "xzy");
        assert_eq!(step("Wxy"), "xyy");
    }

    #[test]
    fn test_trailing_arguments_reattach() {
        assert_eq!(step("Kxyz"), "xz");
        assert_eq!(step("Sxyzw"), "xz(yz)w");
    }

    #[test]
    fn test_normal_form_has_no_step() {
        assert!(reduce_step(&parse("x").unwrap()).is_none());
        assert!(reduce_step(&parse("Sxy").unwrap()).is_none());
        assert!(reduce_step(&parse("xz(yz)").unwrap()).is_none());
    }

    #[test]
    fn test_reduce_skk_identity() {
        let outcome = normal_form("SKKa", 100);
        assert_eq!(print(&outcome.final_term), "a");
        assert_eq!(outcome.steps, 2);
        assert!(outcome.converged);
    }

    #[test]
    fn test_normal_form_is_fixed_point() {
        let outcome = normal_form("S(KI)(Ix)(Sxyz)", 100);
        assert!(outcome.converged);
        let again = Reducer::new(100).reduce(&outcome.final_term);
        assert_eq!(again.steps, 0);
        assert!(again.converged);
        assert_eq!(again.final_term, outcome.final_term);
    }

    #[test]
    fn test_step_budget_on_divergent_term() {
        let outcome = normal_form("SII(SII)", 200);
        assert_eq!(outcome.steps, 200);
        assert!(!outcome.converged);
    }

    #[test]
    fn test_duplicated_argument_is_independent() {
        let term = parse("Wa(Ib)").unwrap();
        let found = find_redexes(&term);
        let w = found.iter().position(|r| r.head == Combinator::W).unwrap();
        let stepped = apply_redex(&term, &found[w]).unwrap();
        assert_eq!(print(&stepped), "a(Ib)(Ib)");
        // reducing one copy must not touch the other
        let next = reduce_step(&stepped).unwrap();
        assert_eq!(print(&next), "ab(Ib)");
    }

    #[test]
    fn test_stale_redex_reports_arity_error() {
        let term = parse("Kx").unwrap();
        let fake = Redex {
            head: Combinator::K,
            head_pos: 0,
            path: Vec::new(),
            args: 2,
        };
        let err = apply_redex(&term, &fake).unwrap_err();
        assert_eq!(
            err,
            ArityError {
                head: Some(Combinator::K),
                args: 1,
            }
        );

        let leaf = parse("x").unwrap();
        let into_leaf = Redex {
            head: Combinator::I,
            head_pos: 0,
            path: vec![0],
            args: 1,
        };
        assert!(apply_redex(&leaf, &into_leaf).is_err());
    }

    #[test]
    fn test_selection_policy_is_result_neutral() {
        // K/I preference only reorders steps; normal forms match a plain
        // leftmost strategy
        let cases = ["SKKa", "Kab", "S(KI)(Ix)y", "B(Ka)bc(Id)", "CKab(Ic)"];
        for case in cases {
            let preferred = normal_form(case, 500);
            let mut leftmost = parse(case).unwrap();
            let mut steps = 0;
            while steps < 500 {
                let found = find_redexes(&leftmost);
                if found.is_empty() {
                    break;
                }
                leftmost = apply_redex(&leftmost, &found[0]).unwrap();
                steps += 1;
            }
            assert!(preferred.converged, "case {case}");
            assert_eq!(
                print(&preferred.final_term),
                print(&leftmost),
                "case {case}"
            );
        }
    }
}
