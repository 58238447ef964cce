//! Flat-buffer reduction engine.
//!
//! Terms are held as canonical strings and rewritten by splicing byte
//! ranges, never materializing a tree. One left-to-right scan recovers every
//! redex: each parenthesized group becomes an index frame, pushed at '(' and
//! popped at ')', and a popped frame whose head atom is a saturated
//! combinator yields a [`SoupRedex`]. A [`ScanPool`] keeps the frame stack,
//! the redex list, and the splice scratch alive across calls, so
//! steady-state reduction does not allocate.

use std::fmt;
use std::ops::Range;
use std::time::Instant;

use crate::parser::{matching_paren, parse, validate, ParseError};
use crate::redex::select_redex;
use crate::term::{print, Combinator, Term};

/// A term stored as its canonical rendering.
///
/// The buffer stays canonical through every operation: the head atom of each
/// run is bare, every group wraps an application of at least two atoms, and
/// no redundant parentheses survive. Equal terms therefore have equal
/// buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soup {
    buf: String,
}

impl Soup {
    /// Parses `text` into a soup, canonicalizing as it goes. Accepts the
    /// same inputs as [`crate::parser::parse`].
    pub fn parse(text: &str) -> Result<Soup, ParseError> {
        Ok(Soup {
            buf: normalize(text)?,
        })
    }

    /// Renders `term` into a soup.
    pub fn from_term(term: &Term) -> Soup {
        Soup { buf: print(term) }
    }

    /// Rebuilds the tree form of the buffer.
    pub fn to_term(&self) -> Term {
        // the buffer is canonical by construction, so this cannot fail
        parse(&self.buf).unwrap()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of atom characters in the buffer, parentheses excluded.
    pub fn atom_count(&self) -> usize {
        self.buf.bytes().filter(|&b| b != b'(' && b != b')').count()
    }

    /// Byte offsets where the buffer's top-level atoms start. The first
    /// entry is always 0.
    pub fn top_level_atoms(&self) -> Vec<usize> {
        let bytes = self.buf.as_bytes();
        let mut starts = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            starts.push(i);
            i = atom_end(bytes, i);
        }
        starts
    }

    /// Splits the buffer at `at`, which must be the start of a top-level
    /// atom other than the first. `self` keeps the left part; the right part
    /// comes back as a new soup with its head atom unwrapped if it was a
    /// group.
    pub fn split_at_atom(&mut self, at: usize) -> Soup {
        assert!(at > 0 && at < self.buf.len(), "split point outside buffer");
        let right = self.buf.split_off(at);
        if right.as_bytes()[0] != b'(' {
            return Soup { buf: right };
        }
        // group contents are canonical runs with a bare head, so dropping
        // the parens is the only renormalization the new head needs
        let close = matching_paren(right.as_bytes(), 0);
        let mut buf = String::with_capacity(right.len() - 2);
        buf.push_str(&right[1..close]);
        buf.push_str(&right[close + 1..]);
        Soup { buf }
    }

    /// Appends `argument`'s top-level atoms onto this soup's spine, forming
    /// the curried application of `self` to each of them in turn. Plain
    /// concatenation stays canonical because appended atoms never land in
    /// head position.
    pub fn fuse(&mut self, argument: &Soup) {
        self.buf.push_str(&argument.buf);
    }

    /// Scans the buffer and returns every redex, ordered by head position.
    pub fn redexes<'p>(&self, pool: &'p mut ScanPool) -> &'p [SoupRedex] {
        pool.reset();
        let bytes = self.buf.as_bytes();
        pool.open_frame();
        for i in 0..=bytes.len() {
            match bytes.get(i) {
                Some(b'(') => {
                    pool.record(i as u32);
                    pool.open_frame();
                }
                Some(b')') => {
                    pool.record(i as u32);
                    pool.close_frame(bytes, true);
                }
                Some(_) => pool.record(i as u32),
                // sentinel past the end closes the root frame
                None => {
                    pool.record(i as u32);
                    pool.close_frame(bytes, false);
                }
            }
        }
        debug_assert_eq!(pool.depth, 0);
        // frames close innermost-first; restore textual order
        pool.found.sort_unstable_by_key(|r| r.bounds[0]);
        &pool.found
    }

    /// Rewrites one redex in place.
    ///
    /// The consumed range is replaced by the rule's right-hand side, built
    /// in the pool scratch from slices of the current buffer. When a group
    /// shrinks to a single atom its enclosing parens are dropped as well,
    /// keeping the buffer canonical.
    pub fn apply(&mut self, redex: &SoupRedex, pool: &mut ScanPool) {
        let arity = redex.head.arity();
        debug_assert!(redex.atoms as usize > arity);

        let out = &mut pool.scratch;
        out.clear();

        let bounds = &redex.bounds;
        let atom = |k: usize| &self.buf[bounds[k] as usize..bounds[k + 1] as usize];

        // K and I with nothing trailing leave a single atom behind; inside
        // a group that atom must shed the enclosing parens too
        let rest = redex.atoms as usize - 1 - arity;
        let lone = rest == 0 && matches!(redex.head, Combinator::K | Combinator::I);
        let strip = lone && redex.enclosed;

        match redex.head {
            Combinator::K | Combinator::I => push_atom(out, atom(1), !strip),
            Combinator::W => {
                push_atom(out, atom(1), true);
                push_atom(out, atom(2), false);
                push_atom(out, atom(2), false);
            }
            Combinator::C => {
                push_atom(out, atom(1), true);
                push_atom(out, atom(3), false);
                push_atom(out, atom(2), false);
            }
            Combinator::B => {
                push_atom(out, atom(1), true);
                out.push('(');
                push_atom(out, atom(2), true);
                push_atom(out, atom(3), false);
                out.push(')');
            }
            Combinator::S => {
                push_atom(out, atom(1), true);
                push_atom(out, atom(3), false);
                out.push('(');
                push_atom(out, atom(2), true);
                push_atom(out, atom(3), false);
                out.push(')');
            }
        }

        let range = if strip {
            debug_assert_eq!(self.buf.as_bytes()[bounds[0] as usize - 1], b'(');
            bounds[0] as usize - 1..redex.end as usize + 1
        } else {
            bounds[0] as usize..bounds[arity + 1] as usize
        };
        self.buf.replace_range(range, &pool.scratch);
    }

    /// Repeatedly rewrites the preferred redex until no redex remains or
    /// `max_steps` is reached. Shrinking K and I redexes fire first, then
    /// the leftmost, matching [`crate::reducer::Reducer`] step for step.
    pub fn reduce(&mut self, pool: &mut ScanPool, max_steps: usize) -> SoupReduction {
        let start = Instant::now();
        let mut steps = 0;
        let mut converged = false;
        loop {
            if steps >= max_steps {
                break;
            }
            let found = self.redexes(pool);
            let pick = match select_redex(found.iter().map(|r| r.head)) {
                Some(i) => i,
                None => {
                    converged = true;
                    break;
                }
            };
            let redex = found[pick];
            self.apply(&redex, pool);
            steps += 1;
        }
        SoupReduction {
            steps,
            total_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            converged,
        }
    }
}

impl fmt::Display for Soup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

/// One reducible frame found by a scan.
///
/// `bounds` holds the start offset of the head atom and of each consumed
/// argument, plus the offset one past the last consumed argument; entries
/// beyond `arity + 2` are unused. Offsets are `u32` so the struct stays
/// small enough to copy freely.
#[derive(Debug, Clone, Copy)]
pub struct SoupRedex {
    /// Combinator at the head of the frame.
    pub head: Combinator,
    bounds: [u32; 5],
    end: u32,
    atoms: u32,
    enclosed: bool,
}

impl SoupRedex {
    /// Byte offset of the head combinator.
    pub fn head_pos(&self) -> usize {
        self.bounds[0] as usize
    }

    /// Arguments available to the head, consumed or not.
    pub fn args(&self) -> usize {
        self.atoms as usize - 1
    }

    /// Byte range of consumed argument `i`, counted from zero. Valid for
    /// `i < self.head.arity()`.
    pub fn arg(&self, i: usize) -> Range<usize> {
        debug_assert!(i < self.head.arity());
        self.bounds[i + 1] as usize..self.bounds[i + 2] as usize
    }

    /// Byte range of the frame atoms the rewrite leaves untouched.
    pub fn rest(&self) -> Range<usize> {
        self.bounds[self.head.arity() + 1] as usize..self.end as usize
    }
}

/// Reusable scan state: the frame stack, the redexes found, and the splice
/// scratch. Keep one per worker and pass it to every call.
#[derive(Debug)]
pub struct ScanPool {
    frames: Vec<Vec<u32>>,
    depth: usize,
    found: Vec<SoupRedex>,
    scratch: String,
}

impl ScanPool {
    pub fn new() -> ScanPool {
        ScanPool {
            frames: Vec::new(),
            depth: 0,
            found: Vec::new(),
            scratch: String::new(),
        }
    }

    fn reset(&mut self) {
        self.depth = 0;
        self.found.clear();
    }

    fn open_frame(&mut self) {
        if self.depth == self.frames.len() {
            self.frames.push(Vec::new());
        } else {
            self.frames[self.depth].clear();
        }
        self.depth += 1;
    }

    #[inline]
    fn record(&mut self, offset: u32) {
        self.frames[self.depth - 1].push(offset);
    }

    /// Pops the current frame and records a redex if its head atom is a
    /// combinator with enough arguments. `enclosed` marks frames closed by
    /// a real ')' rather than the end of the buffer.
    fn close_frame(&mut self, bytes: &[u8], enclosed: bool) {
        self.depth -= 1;
        let frame = &self.frames[self.depth];
        let atoms = frame.len() - 1;
        if atoms < 2 || frame[1] - frame[0] != 1 {
            return;
        }
        let head = match Combinator::from_char(bytes[frame[0] as usize] as char) {
            Some(head) => head,
            None => return,
        };
        let arity = head.arity();
        if atoms - 1 < arity {
            return;
        }
        let mut bounds = [0u32; 5];
        bounds[..arity + 2].copy_from_slice(&frame[..arity + 2]);
        self.found.push(SoupRedex {
            head,
            bounds,
            end: frame[atoms],
            atoms: atoms as u32,
            enclosed,
        });
    }
}

impl Default for ScanPool {
    fn default() -> ScanPool {
        ScanPool::new()
    }
}

/// Outcome of [`Soup::reduce`].
#[derive(Debug, Clone)]
pub struct SoupReduction {
    /// Rewrites performed.
    pub steps: usize,
    /// Wall-clock time in milliseconds.
    pub total_time_ms: f64,
    /// True when a normal form was reached within the step budget.
    pub converged: bool,
}

/// Canonicalizes `text` without building a tree: redundant parentheses are
/// dropped and nothing else changes. Equivalent to parsing and re-printing.
pub fn normalize(text: &str) -> Result<String, ParseError> {
    validate(text)?;
    let mut out = String::with_capacity(text.len());
    emit_run(text.as_bytes(), 0, text.len(), &mut out)?;
    Ok(out)
}

/// End of the atom starting at `start`: one past the matching ')' for a
/// group, the next byte otherwise.
fn atom_end(bytes: &[u8], start: usize) -> usize {
    if bytes[start] == b'(' {
        matching_paren(bytes, start) + 1
    } else {
        start + 1
    }
}

fn count_atoms(bytes: &[u8], mut i: usize, end: usize) -> usize {
    let mut n = 0;
    while i < end {
        n += 1;
        i = atom_end(bytes, i);
    }
    n
}

/// Emits the run over `[start, end)` with its head atom unwrapped.
fn emit_run(bytes: &[u8], start: usize, end: usize, out: &mut String) -> Result<(), ParseError> {
    if start == end {
        return Err(ParseError::Empty);
    }
    let mut i = start;
    let mut head = true;
    while i < end {
        let next = atom_end(bytes, i);
        if head && bytes[i] == b'(' {
            emit_run(bytes, i + 1, next - 1, out)?;
        } else if head {
            out.push(bytes[i] as char);
        } else {
            emit_atom(bytes, i, next, out)?;
        }
        head = false;
        i = next;
    }
    Ok(())
}

/// Emits the atom over `[start, end)` in a non-head position. A group
/// around a single atom is redundant at this level, but the atom inside may
/// still need its own parens, so recurse instead of splicing the contents
/// into the run.
fn emit_atom(bytes: &[u8], start: usize, end: usize, out: &mut String) -> Result<(), ParseError> {
    if bytes[start] != b'(' {
        out.push(bytes[start] as char);
        return Ok(());
    }
    match count_atoms(bytes, start + 1, end - 1) {
        0 => Err(ParseError::Empty),
        1 => emit_atom(bytes, start + 1, end - 1, out),
        _ => {
            out.push('(');
            emit_run(bytes, start + 1, end - 1, out)?;
            out.push(')');
            Ok(())
        }
    }
}

/// Appends one canonical atom, unwrapping a group when it lands in head
/// position.
fn push_atom(out: &mut String, atom: &str, head: bool) {
    if head && atom.as_bytes()[0] == b'(' {
        out.push_str(&atom[1..atom.len() - 1]);
    } else {
        out.push_str(atom);
    }
}
