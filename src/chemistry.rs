//! Algorithmic chemistry over a population of soups.
//!
//! Terms float in a well-mixed reactor. Each step shuffles the population
//! and offers every member one action: a budgeted run of rewrites, a split
//! at a top-level atom boundary, or fusion onto a partner drawn from the
//! same round. Combinators destroyed by rewrites are re-seeded as fresh
//! atoms at the end of the step, so no species ever drains out of the
//! reactor.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::generator::SimpleRng;
use crate::parser::ParseError;
use crate::soup::{ScanPool, Soup};
use crate::term::{Combinator, Term};

#[derive(Debug, Clone)]
pub struct ChemistryConfig {
    /// Members seeded at start, one atom each.
    pub population: usize,
    /// Species present in the reactor.
    pub combinators: Vec<Combinator>,
    /// Chance that a member acts at all in a given step.
    pub p_action: f64,
    /// Action split; the three must sum to one.
    pub p_reduce: f64,
    pub p_fission: f64,
    pub p_fusion: f64,
    /// Rewrite budget for a single reduce event.
    pub reduce_steps: usize,
    pub seed: u64,
}

impl Default for ChemistryConfig {
    fn default() -> Self {
        ChemistryConfig {
            population: 100,
            combinators: Combinator::ALL.to_vec(),
            p_action: 0.4,
            p_reduce: 0.75,
            p_fission: 0.125,
            p_fusion: 0.125,
            reduce_steps: 10,
            seed: 42,
        }
    }
}

/// Point-in-time reactor measurements, one JSON object per report.
#[derive(Debug, Clone, Serialize)]
pub struct ChemistryStats {
    pub step: usize,
    pub population: usize,
    pub total_atoms: usize,
    pub normal_forms: usize,
    pub counts: BTreeMap<char, usize>,
}

/// Parses a species string such as `"SKI"` into a combinator set, in order.
/// Offsets in the error follow the term parser's convention, so callers can
/// report both through the same path.
pub fn parse_alphabet(alphabet: &str) -> Result<Vec<Combinator>, ParseError> {
    if alphabet.is_empty() {
        return Err(ParseError::Empty);
    }
    alphabet
        .char_indices()
        .map(|(offset, c)| Combinator::from_char(c).ok_or(ParseError::InvalidCharacter { offset }))
        .collect()
}

pub struct Chemistry {
    config: ChemistryConfig,
    rng: SimpleRng,
    pool: ScanPool,
    terms: Vec<Soup>,
    steps: usize,
}

impl Chemistry {
    pub fn new(config: ChemistryConfig) -> Chemistry {
        assert!(
            !config.combinators.is_empty(),
            "chemistry needs at least one combinator"
        );
        debug_assert!(
            (config.p_reduce + config.p_fission + config.p_fusion - 1.0).abs() < 1e-9,
            "action probabilities must sum to one"
        );
        let mut rng = SimpleRng::seed_from_u64(config.seed);
        let mut terms = Vec::with_capacity(config.population);
        for _ in 0..config.population {
            let pick = rng.gen_range(0, config.combinators.len() as u32);
            let comb = config.combinators[pick as usize];
            terms.push(Soup::from_term(&Term::leaf(comb.as_char())));
        }
        Chemistry {
            config,
            rng,
            pool: ScanPool::new(),
            terms,
            steps: 0,
        }
    }

    pub fn terms(&self) -> &[Soup] {
        &self.terms
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Runs one reactor step over the whole population.
    pub fn step(&mut self) {
        let before = self.census();
        self.shuffle();
        let mut work = std::mem::take(&mut self.terms);
        while let Some(soup) = work.pop() {
            if self.rng.next_f64() >= self.config.p_action {
                self.terms.push(soup);
                continue;
            }
            let roll = self.rng.next_f64();
            if roll < self.config.p_reduce {
                self.reduce_member(soup);
            } else if roll < self.config.p_reduce + self.config.p_fission {
                self.fission(soup);
            } else {
                // the partner acts as the function, the member as arguments
                match work.pop() {
                    Some(mut partner) => {
                        partner.fuse(&soup);
                        self.terms.push(partner);
                    }
                    None => self.terms.push(soup),
                }
            }
        }
        self.replenish(&before);
        self.steps += 1;
    }

    /// Measures the reactor; scans every member, so not free.
    pub fn stats(&mut self) -> ChemistryStats {
        let mut normal_forms = 0;
        for soup in &self.terms {
            if soup.redexes(&mut self.pool).is_empty() {
                normal_forms += 1;
            }
        }
        ChemistryStats {
            step: self.steps,
            population: self.terms.len(),
            total_atoms: self.terms.iter().map(Soup::atom_count).sum(),
            normal_forms,
            counts: self.census(),
        }
    }

    fn reduce_member(&mut self, mut soup: Soup) {
        soup.reduce(&mut self.pool, self.config.reduce_steps);
        self.terms.push(soup);
    }

    fn fission(&mut self, mut soup: Soup) {
        let starts = soup.top_level_atoms();
        if starts.len() < 2 {
            // single-atom members have nowhere to split
            self.terms.push(soup);
            return;
        }
        let pick = 1 + self.rng.gen_range(0, starts.len() as u32 - 1) as usize;
        let right = soup.split_at_atom(starts[pick]);
        self.terms.push(soup);
        self.terms.push(right);
    }

    fn shuffle(&mut self) {
        for i in (1..self.terms.len()).rev() {
            let j = self.rng.gen_range(0, i as u32 + 1) as usize;
            self.terms.swap(i, j);
        }
    }

    /// Occurrences of each tracked combinator across the population.
    fn census(&self) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for comb in &self.config.combinators {
            counts.insert(comb.as_char(), 0);
        }
        for soup in &self.terms {
            for b in soup.as_str().bytes() {
                if let Some(n) = counts.get_mut(&(b as char)) {
                    *n += 1;
                }
            }
        }
        counts
    }

    /// Re-seeds any combinator that fell below its pre-step count as fresh
    /// atoms. Surplus copies made by duplicating rules are kept.
    fn replenish(&mut self, before: &BTreeMap<char, usize>) {
        let after = self.census();
        for (&c, &had) in before {
            let have = after.get(&c).copied().unwrap_or(0);
            for _ in have..had {
                self.terms.push(Soup::from_term(&Term::leaf(c)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_seeds_single_atoms() {
        let chem = Chemistry::new(ChemistryConfig::default());
        assert_eq!(chem.terms().len(), 100);
        for soup in chem.terms() {
            assert_eq!(soup.len(), 1);
        }
    }

    #[test]
    fn test_parse_alphabet() {
        assert_eq!(
            parse_alphabet("SKI").unwrap(),
            vec![Combinator::S, Combinator::K, Combinator::I]
        );
        assert_eq!(parse_alphabet(""), Err(ParseError::Empty));
        // variables are term syntax but not reactor species
        assert_eq!(
            parse_alphabet("SaK"),
            Err(ParseError::InvalidCharacter { offset: 1 })
        );
        assert_eq!(
            parse_alphabet("SKX"),
            Err(ParseError::InvalidCharacter { offset: 2 })
        );
    }

    #[test]
    fn test_reduce_event_clears_nested_redexes() {
        let mut chem = Chemistry::new(ChemistryConfig {
            population: 0,
            p_action: 1.0,
            p_reduce: 1.0,
            p_fission: 0.0,
            p_fusion: 0.0,
            ..Default::default()
        });
        chem.terms.push(Soup::parse("Ia(Ib)").unwrap());
        chem.step();
        // one event runs the whole budget, so both I redexes fire
        assert_eq!(chem.terms()[0].as_str(), "ab");
        // the two consumed atoms come back as fresh seeds
        let seeds: Vec<&str> = chem.terms()[1..].iter().map(Soup::as_str).collect();
        assert_eq!(seeds, vec!["I", "I"]);
    }

    #[test]
    fn test_steps_are_deterministic() {
        let mut a = Chemistry::new(ChemistryConfig {
            seed: 5,
            ..Default::default()
        });
        let mut b = Chemistry::new(ChemistryConfig {
            seed: 5,
            ..Default::default()
        });
        for _ in 0..20 {
            a.step();
            b.step();
        }
        let sa: Vec<&str> = a.terms().iter().map(Soup::as_str).collect();
        let sb: Vec<&str> = b.terms().iter().map(Soup::as_str).collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_combinator_counts_never_drop() {
        let mut chem = Chemistry::new(ChemistryConfig {
            population: 40,
            seed: 11,
            ..Default::default()
        });
        let before = chem.stats().counts;
        for _ in 0..30 {
            chem.step();
        }
        let after = chem.stats().counts;
        for (c, had) in &before {
            assert!(after[c] >= *had, "species {c} fell below its seed count");
        }
    }

    #[test]
    fn test_members_stay_well_formed() {
        let mut chem = Chemistry::new(ChemistryConfig {
            population: 30,
            seed: 3,
            ..Default::default()
        });
        for _ in 0..25 {
            chem.step();
        }
        for soup in chem.terms() {
            let reparsed = Soup::parse(soup.as_str()).unwrap();
            assert_eq!(reparsed.as_str(), soup.as_str());
        }
    }

    #[test]
    fn test_stats_shape() {
        let mut chem = Chemistry::new(ChemistryConfig {
            population: 25,
            seed: 8,
            ..Default::default()
        });
        chem.step();
        let stats = chem.stats();
        assert_eq!(stats.step, 1);
        assert_eq!(stats.population, chem.terms().len());
        assert!(stats.total_atoms >= stats.population);
        assert!(stats.normal_forms <= stats.population);

        let line = serde_json::to_string(&stats).unwrap();
        assert!(line.contains("\"population\""));
        assert!(line.contains("\"counts\""));
    }
}
