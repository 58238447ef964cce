//! Combinatory logic reduction over two interchangeable engines.
//!
//! This library provides:
//! - Compact term representation over the S K I B C W basis
//! - All-or-nothing parsing with byte-offset error reporting
//! - A tree engine that rewrites owned subterms
//! - A flat-buffer engine that splices canonical strings in place
//! - Seeded term generation for reduction workloads
//! - An algorithmic chemistry reactor over a population of buffers
//!
//! # Engines
//!
//! Both engines enumerate redexes left to right by head position and prefer
//! shrinking K and I rewrites, so for any input they perform the same steps
//! and reach the same normal form. The buffer engine exists for throughput:
//! a scan is one pass over the bytes, a rewrite is one splice, and all
//! working state lives in a reusable [`ScanPool`].

pub mod term;
pub mod parser;
pub mod redex;
pub mod reducer;
pub mod soup;
pub mod generator;
pub mod chemistry;

pub use term::{Term, Combinator, print};
pub use parser::{parse, validate, ParseError};
pub use redex::{Redex, find_redexes, select_redex};
pub use reducer::{Reducer, Reduction, ArityError, apply_redex, reduce_step};
pub use soup::{Soup, SoupRedex, SoupReduction, ScanPool, normalize};
pub use generator::{TermGenerator, GeneratorConfig, SimpleRng};
pub use chemistry::{Chemistry, ChemistryConfig, ChemistryStats, parse_alphabet};
