//! Combinator reduction command line.
//!
//! Reduces single terms, lists redexes, canonicalizes input, and runs the
//! soup reactor with periodic JSONL statistics.

use clap::{Parser, Subcommand};
use comb_rs::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "comb")]
#[command(about = "Combinatory logic reduction and soup chemistry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a term to normal form, printing each step
    Reduce {
        /// Term over S K I B C W, variables a-z, and parentheses
        term: String,

        /// Step budget before giving up
        #[arg(long, default_value_t = 10_000)]
        max_steps: usize,

        /// Print only the final term
        #[arg(short, long)]
        quiet: bool,
    },

    /// List every redex of a term with its argument slices
    Redexes {
        /// Term to scan
        term: String,
    },

    /// Canonicalize a term without reducing it
    Normalize {
        /// Term to canonicalize
        term: String,
    },

    /// Run the soup reactor
    Soup {
        /// Number of seed atoms
        #[arg(short, long, default_value_t = 100)]
        population: usize,

        /// Combinators present in the reactor
        #[arg(short, long, default_value = "SKI")]
        alphabet: String,

        /// Reactor steps to run
        #[arg(short, long, default_value_t = 1000)]
        steps: usize,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Steps between statistics reports
        #[arg(long, default_value_t = 100)]
        report_every: usize,

        /// Statistics output file (JSONL format)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Reduce {
            term,
            max_steps,
            quiet,
        } => run_reduce(&term, max_steps, quiet),
        Commands::Redexes { term } => run_redexes(&term),
        Commands::Normalize { term } => run_normalize(&term),
        Commands::Soup {
            population,
            alphabet,
            steps,
            seed,
            report_every,
            output,
        } => run_soup(population, &alphabet, steps, seed, report_every, output.as_deref()),
    }
}

fn run_reduce(input: &str, max_steps: usize, quiet: bool) -> std::io::Result<()> {
    let term = parse_or_exit(input);
    let start = Instant::now();

    let mut current = term;
    let mut steps = 0;
    let mut converged = false;
    if !quiet {
        println!("{}", current);
    }
    loop {
        if steps >= max_steps {
            break;
        }
        match reduce_step(&current) {
            Some(next) => {
                current = next;
                steps += 1;
                if !quiet {
                    println!("  -> {}", current);
                }
            }
            None => {
                converged = true;
                break;
            }
        }
    }
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    if quiet {
        println!("{}", current);
    } else {
        eprintln!();
        eprintln!("  Steps: {}", steps);
        eprintln!("  Time: {:.3}ms", elapsed);
        if converged {
            eprintln!("  Normal form reached");
        } else {
            eprintln!("  Step budget exhausted");
        }
    }

    Ok(())
}

fn run_redexes(input: &str) -> std::io::Result<()> {
    let soup = match Soup::parse(input) {
        Ok(soup) => soup,
        Err(err) => {
            report_parse_error(input, err);
            std::process::exit(1);
        }
    };
    let mut pool = ScanPool::new();
    let found = soup.redexes(&mut pool);

    println!("{}", soup);
    if found.is_empty() {
        println!("  normal form");
        return Ok(());
    }
    for redex in found {
        print!("  {} at {:>3}:", redex.head, redex.head_pos());
        for (name, i) in ["x", "y", "z"].iter().zip(0..redex.head.arity()) {
            print!(" {}={}", name, &soup.as_str()[redex.arg(i)]);
        }
        let rest = redex.rest();
        if !rest.is_empty() {
            print!(" rest={}", &soup.as_str()[rest]);
        }
        println!();
    }

    Ok(())
}

fn run_normalize(input: &str) -> std::io::Result<()> {
    match normalize(input) {
        Ok(canonical) => {
            println!("{}", canonical);
            Ok(())
        }
        Err(err) => {
            report_parse_error(input, err);
            std::process::exit(1);
        }
    }
}

fn run_soup(
    population: usize,
    alphabet: &str,
    steps: usize,
    seed: u64,
    report_every: usize,
    output: Option<&str>,
) -> std::io::Result<()> {
    let combinators = match parse_alphabet(alphabet) {
        Ok(set) => set,
        Err(err) => {
            eprintln!("error: bad alphabet: {} (expected characters from S K I B C W)", err);
            std::process::exit(1);
        }
    };

    eprintln!("┌─────────────────────────────────────────────────────────┐");
    eprintln!("│   Combinator Soup                                       │");
    eprintln!("└─────────────────────────────────────────────────────────┘");
    eprintln!();
    eprintln!("Configuration:");
    eprintln!("  Population: {}", population);
    eprintln!("  Alphabet: {}", alphabet);
    eprintln!("  Steps: {}", steps);
    eprintln!("  Seed: {}", seed);
    eprintln!("  Output: {}", output.unwrap_or("none"));
    eprintln!();

    let report_every = report_every.max(1);
    let mut writer = match output {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    let mut chemistry = Chemistry::new(ChemistryConfig {
        population,
        combinators,
        seed,
        ..ChemistryConfig::default()
    });

    let start = Instant::now();
    for step in 1..=steps {
        chemistry.step();
        if step % report_every == 0 || step == steps {
            let stats = chemistry.stats();
            eprint!(
                "\r[step {:>6} | members {:>5} | atoms {:>7} | normal {:>5}]",
                stats.step, stats.population, stats.total_atoms, stats.normal_forms
            );
            let _ = std::io::stderr().flush();

            if let Some(writer) = writer.as_mut() {
                // Write as JSONL
                if let Ok(json) = serde_json::to_string(&stats) {
                    let _ = writeln!(writer, "{}", json);
                }
            }
        }
    }
    if let Some(writer) = writer.as_mut() {
        writer.flush()?;
    }
    let elapsed = start.elapsed().as_secs_f64();

    let finals = chemistry.stats();
    eprintln!("\n");
    eprintln!("┌─────────────────────────────────────────────────────────┐");
    eprintln!("│   Soup Complete                                         │");
    eprintln!("└─────────────────────────────────────────────────────────┘");
    eprintln!();
    eprintln!("Results:");
    eprintln!("  Members: {}", finals.population);
    eprintln!("  Atoms: {}", finals.total_atoms);
    eprintln!("  Normal forms: {}", finals.normal_forms);
    for (species, count) in &finals.counts {
        eprintln!("    {}: {}", species, count);
    }
    eprintln!("  Time: {:.2}s ({:.1} steps/s)", elapsed, steps as f64 / elapsed);
    if let Some(largest) = chemistry.terms().iter().max_by_key(|s| s.len()) {
        eprintln!("  Largest member: {}", clip(largest.as_str(), 60));
    }
    eprintln!();

    Ok(())
}

/// Shortens long buffers for terminal display.
fn clip(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        format!("{}... ({} bytes)", &s[..limit], s.len())
    }
}

fn parse_or_exit(input: &str) -> Term {
    match parse(input) {
        Ok(term) => term,
        Err(err) => {
            report_parse_error(input, err);
            std::process::exit(1);
        }
    }
}

/// Prints the error with a caret under the offending byte.
fn report_parse_error(input: &str, err: ParseError) {
    eprintln!("error: {}", err);
    let offset = match err {
        ParseError::InvalidCharacter { offset } => Some(offset),
        ParseError::UnbalancedParens { offset } => Some(offset),
        ParseError::Empty => None,
    };
    if let Some(offset) = offset {
        eprintln!("  {}", input);
        eprintln!("  {}^", " ".repeat(offset));
    }
}
