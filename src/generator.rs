//! Random term generator with configurable depth and size limits.
//!
//! Produces well-formed combinator terms over a chosen alphabet, used to
//! build reduction workloads. Generation is deterministic for a given seed.

use crate::term::{Combinator, Term};

/// Simple, fast random number generator (LCG)
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        SimpleRng {
            state: seed.wrapping_add(1),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        // LCG constants from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn gen_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min;
        min + (self.next_u64() % range as u64) as u32
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub max_depth: usize,
    pub min_depth: usize,
    pub max_size: usize,
    /// Combinators eligible as leaves.
    pub combinators: Vec<Combinator>,
    /// Number of distinct variables, drawn from 'a' upward.
    pub variables: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            max_depth: 6,  // Balanced depth for interesting spines
            min_depth: 2,  // Avoid bare leaves
            max_size: 40,  // Leaf budget before a term is regenerated
            combinators: Combinator::ALL.to_vec(),
            variables: 3,
        }
    }
}

pub struct TermGenerator {
    config: GeneratorConfig,
}

impl TermGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        TermGenerator { config }
    }

    /// Generate a random term within configured constraints
    pub fn generate(&self, rng: &mut SimpleRng) -> Option<Term> {
        for _attempt in 0..100 {
            let term = self.generate_term(rng, 0);

            // Check size constraint
            if term.size() <= self.config.max_size {
                return Some(term);
            }
        }
        None
    }

    /// Recursive term generation with depth tracking
    fn generate_term(&self, rng: &mut SimpleRng, depth: usize) -> Term {
        // Force termination at max depth
        if depth >= self.config.max_depth {
            return self.generate_leaf(rng);
        }

        // Early depth: always branch so spines get long enough to reduce
        if depth < self.config.min_depth {
            let func = self.generate_term(rng, depth + 1);
            let arg = self.generate_term(rng, depth + 1);
            return Term::app(func, arg);
        }

        match rng.gen_range(0, 10) {
            // Leaf: 30% probability
            0..=2 => self.generate_leaf(rng),
            // App: 70% probability
            _ => {
                let func = self.generate_term(rng, depth + 1);
                let arg = self.generate_term(rng, depth + 1);
                Term::app(func, arg)
            }
        }
    }

    fn generate_leaf(&self, rng: &mut SimpleRng) -> Term {
        let pool = self.config.combinators.len() as u32 + self.config.variables;
        let pick = rng.gen_range(0, pool.max(1));
        match self.config.combinators.get(pick as usize) {
            Some(comb) => Term::leaf(comb.as_char()),
            None => {
                let var = pick - self.config.combinators.len() as u32;
                Term::leaf((b'a' + var as u8) as char)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::term::print;

    #[test]
    fn test_generation() {
        let config = GeneratorConfig::default();
        let generator = TermGenerator::new(config);
        let mut rng = SimpleRng::seed_from_u64(42);

        let term = generator.generate(&mut rng);
        assert!(term.is_some());

        let term = term.unwrap();
        assert!(term.size() > 0);
        assert!(term.depth() > 0);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = TermGenerator::new(GeneratorConfig::default());
        let mut a = SimpleRng::seed_from_u64(7);
        let mut b = SimpleRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(generator.generate(&mut a), generator.generate(&mut b));
        }
    }

    #[test]
    fn test_size_constraint() {
        let config = GeneratorConfig {
            max_depth: 4,
            min_depth: 2,
            max_size: 10,
            ..GeneratorConfig::default()
        };
        let generator = TermGenerator::new(config);
        let mut rng = SimpleRng::seed_from_u64(123);

        for _ in 0..10 {
            if let Some(term) = generator.generate(&mut rng) {
                assert!(term.size() <= 10);
            }
        }
    }

    #[test]
    fn test_restricted_alphabet() {
        let config = GeneratorConfig {
            combinators: vec![Combinator::S, Combinator::K],
            variables: 2,
            ..GeneratorConfig::default()
        };
        let generator = TermGenerator::new(config);
        let mut rng = SimpleRng::seed_from_u64(9);

        for _ in 0..20 {
            let term = generator.generate(&mut rng).unwrap();
            let rendered = print(&term);
            for c in rendered.chars() {
                assert!(matches!(c, 'S' | 'K' | 'a' | 'b' | '(' | ')'), "got {c}");
            }
            // generated terms always round-trip through the parser
            assert_eq!(parse(&rendered).unwrap(), term);
        }
    }

    #[test]
    fn test_rng_uniform_unit_interval() {
        let mut rng = SimpleRng::seed_from_u64(1);
        for _ in 0..1000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }
}
