//! Redex discovery over the tree representation.
//!
//! A redex is a maximal left-application spine whose head leaf is a
//! combinator applied to at least its arity. Enumeration follows the head
//! combinator's position in the canonical rendering, left to right, which
//! fixes the reduction strategy deterministically.

use crate::term::{Combinator, Term};

/// One reducible application spine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redex {
    /// Combinator at the head of the spine.
    pub head: Combinator,
    /// Byte offset of the head character in the canonical rendering.
    pub head_pos: usize,
    /// Steps from the root to the spine-top application (0 left, 1 right).
    pub path: Vec<usize>,
    /// Arguments available on the spine; at least `head.arity()`.
    pub args: usize,
}

/// Enumerate every redex in `term`, ordered by increasing head position.
pub fn find_redexes(term: &Term) -> Vec<Redex> {
    let mut found = Vec::new();
    let mut path = Vec::new();
    walk_top(term, 0, &mut path, &mut found);
    found
}

/// Index of the redex the reduce loop fires next: the leftmost K or I redex
/// if any (those strictly shrink the term), else the leftmost overall. The
/// preference only affects intermediate sizes, never the normal form.
pub fn select_redex<I>(heads: I) -> Option<usize>
where
    I: Iterator<Item = Combinator>,
{
    let mut first = None;
    for (i, head) in heads.enumerate() {
        if head.shrinks() {
            return Some(i);
        }
        if first.is_none() {
            first = Some(i);
        }
    }
    first
}

/// Visit a spine top: a subterm that is not the left child of an application
/// (the root, or any parenthesized right child). Only spine tops can carry a
/// redex; their head is the leftmost leaf, which sits exactly at `offset` in
/// the canonical rendering. Returns the subterm's printed length.
fn walk_top(
    term: &Term,
    offset: usize,
    path: &mut Vec<usize>,
    found: &mut Vec<Redex>,
) -> usize {
    if let Some((head, args)) = spine_head(term) {
        if args >= head.arity() {
            found.push(Redex {
                head,
                head_pos: offset,
                path: path.clone(),
                args,
            });
        }
    }
    walk_spine(term, offset, path, found)
}

/// Descend a spine in print order: left children continue the spine at the
/// same offset, right children start fresh spine tops after the left text.
/// Pushes nested redexes in increasing head-position order as it unwinds,
/// so `find_redexes` needs no sort.
fn walk_spine(
    term: &Term,
    offset: usize,
    path: &mut Vec<usize>,
    found: &mut Vec<Redex>,
) -> usize {
    match term {
        Term::Leaf(_) => 1,
        Term::App(left, right) => {
            path.push(0);
            let left_len = walk_spine(left, offset, path, found);
            path.pop();

            let wrapped = matches!(**right, Term::App(_, _));
            path.push(1);
            let right_len = walk_top(right, offset + left_len + usize::from(wrapped), path, found);
            path.pop();

            left_len + right_len + if wrapped { 2 } else { 0 }
        }
    }
}

/// Head leaf and argument count of the spine rooted at `term`, when the head
/// is a combinator.
fn spine_head(term: &Term) -> Option<(Combinator, usize)> {
    let mut args = 0;
    let mut node = term;
    while let Term::App(left, _) = node {
        args += 1;
        node = left;
    }
    node.combinator().map(|head| (head, args))
}
