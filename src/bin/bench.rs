//! Dual-engine combinator reduction benchmark.
//!
//! Reduces a generated corpus with the tree rewriter and with the
//! flat-buffer splicer under the same step budget and redex selection
//! policy, then compares throughput. A scan mode times raw redex
//! enumeration over a fixed buffer instead.
//!
//! Usage:
//!   bench --terms 10000 --workers 16
//!   bench --scan-term "S(KI)(Ix)(Sxyz)" --iterations 1000000

use clap::Parser;
use comb_rs::{
    GeneratorConfig, Reducer, ScanPool, SimpleRng, Soup, Term, TermGenerator,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "comb-bench")]
#[command(about = "Combinator reduction throughput benchmark", long_about = None)]
struct Args {
    /// Number of terms to reduce
    #[arg(long, default_value = "1000")]
    terms: usize,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(long)]
    workers: Option<usize>,

    /// Maximum reduction steps per term
    #[arg(long, default_value = "1000")]
    max_steps: usize,

    /// Maximum term depth
    #[arg(long, default_value = "6")]
    max_depth: usize,

    /// Maximum term size
    #[arg(long, default_value = "40")]
    max_size: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output JSON results file
    #[arg(long)]
    output: Option<String>,

    /// Scan this term repeatedly instead of reducing a corpus
    #[arg(long)]
    scan_term: Option<String>,

    /// Scan iterations
    #[arg(long, default_value = "1000000")]
    iterations: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct BenchmarkResult {
    engine: String,
    total_terms: usize,
    total_steps: usize,
    total_time_ms: f64,
    avg_time_per_term_ms: f64,
    avg_steps_per_term: f64,
    throughput_terms_per_sec: f64,
    throughput_steps_per_sec: f64,
    convergence_rate: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ComparisonResult {
    tree: BenchmarkResult,
    soup: BenchmarkResult,
    speedup: f64,
    steps_agree: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(ref text) = args.scan_term {
        return run_scan_benchmark(text, args.iterations);
    }

    let workers = args.workers.unwrap_or_else(num_cpus::get);

    // Set up rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    println!("Combinator Reduction Benchmark");
    println!("==============================");
    println!("Workers: {}", workers);
    println!("Terms: {}", args.terms);
    println!("Max steps: {}", args.max_steps);
    println!();

    println!("Generating {} test terms...", args.terms);
    let terms = generate_terms(&args);
    if terms.is_empty() {
        return Err("generator produced no terms within the size budget".into());
    }
    println!("Generated {} terms\n", terms.len());

    println!("Running tree engine...");
    let tree = benchmark_tree(&terms, args.max_steps);
    print_result(&tree);

    println!("\nRunning soup engine...");
    let soup = benchmark_soup(&terms, args.max_steps);
    print_result(&soup);

    println!("\n=== COMPARISON ===");
    let speedup = tree.avg_time_per_term_ms / soup.avg_time_per_term_ms;
    println!("Speedup: {:.2}x (soup over tree)", speedup);
    if tree.total_steps == soup.total_steps {
        println!("Engines agree on {} total steps", tree.total_steps);
    } else {
        println!(
            "WARNING: engines disagree on steps (tree {}, soup {})",
            tree.total_steps, soup.total_steps
        );
    }

    if let Some(output_path) = args.output {
        let comparison = ComparisonResult {
            speedup,
            steps_agree: tree.total_steps == soup.total_steps,
            tree,
            soup,
        };
        let json = serde_json::to_string_pretty(&comparison)?;
        std::fs::write(&output_path, json)?;
        println!("\nResults saved to: {}", output_path);
    }

    Ok(())
}

fn generate_terms(args: &Args) -> Vec<Term> {
    let config = GeneratorConfig {
        max_depth: args.max_depth,
        min_depth: 2,
        max_size: args.max_size,
        ..GeneratorConfig::default()
    };
    let generator = TermGenerator::new(config);
    let mut rng = SimpleRng::seed_from_u64(args.seed);
    let mut terms = Vec::with_capacity(args.terms);

    // Oversample; an attempt can come back empty under a tight size budget
    for _ in 0..args.terms * 2 {
        if let Some(term) = generator.generate(&mut rng) {
            terms.push(term);
            if terms.len() >= args.terms {
                break;
            }
        }
    }
    terms
}

fn benchmark_tree(terms: &[Term], max_steps: usize) -> BenchmarkResult {
    let start = Instant::now();
    let total_steps = AtomicUsize::new(0);
    let converged_count = AtomicUsize::new(0);

    terms.par_iter().for_each(|term| {
        let reducer = Reducer::new(max_steps);
        let result = reducer.reduce(term);

        total_steps.fetch_add(result.steps, Ordering::Relaxed);
        if result.converged {
            converged_count.fetch_add(1, Ordering::Relaxed);
        }
    });

    finish("Tree", terms.len(), start, total_steps, converged_count)
}

fn benchmark_soup(terms: &[Term], max_steps: usize) -> BenchmarkResult {
    let start = Instant::now();
    let total_steps = AtomicUsize::new(0);
    let converged_count = AtomicUsize::new(0);

    // One scan pool per worker, reused across that worker's terms
    terms.par_iter().for_each_init(ScanPool::new, |pool, term| {
        let mut soup = Soup::from_term(term);
        let result = soup.reduce(pool, max_steps);

        total_steps.fetch_add(result.steps, Ordering::Relaxed);
        if result.converged {
            converged_count.fetch_add(1, Ordering::Relaxed);
        }
    });

    finish("Soup", terms.len(), start, total_steps, converged_count)
}

fn finish(
    engine: &str,
    total_terms: usize,
    start: Instant,
    total_steps: AtomicUsize,
    converged: AtomicUsize,
) -> BenchmarkResult {
    let total_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    let steps = total_steps.into_inner();
    let converged = converged.into_inner();

    BenchmarkResult {
        engine: engine.to_string(),
        total_terms,
        total_steps: steps,
        total_time_ms,
        avg_time_per_term_ms: total_time_ms / total_terms as f64,
        avg_steps_per_term: steps as f64 / total_terms as f64,
        throughput_terms_per_sec: total_terms as f64 / (total_time_ms / 1000.0),
        throughput_steps_per_sec: steps as f64 / (total_time_ms / 1000.0),
        convergence_rate: converged as f64 / total_terms as f64,
    }
}

fn run_scan_benchmark(text: &str, iterations: usize) -> Result<(), Box<dyn std::error::Error>> {
    let soup = Soup::parse(text)?;
    let mut pool = ScanPool::new();

    println!("Scan Throughput Benchmark");
    println!("=========================");
    println!("Buffer: {} ({} bytes)", soup, soup.len());
    println!("Iterations: {}", iterations);

    let start = Instant::now();
    let mut found_total = 0usize;
    for _ in 0..iterations {
        found_total += soup.redexes(&mut pool).len();
    }
    let elapsed = start.elapsed().as_secs_f64();

    println!();
    println!("  Redexes seen: {}", found_total);
    println!("  Time: {:.3}s", elapsed);
    println!("  Scans/s: {:.0}", iterations as f64 / elapsed);

    Ok(())
}

fn print_result(result: &BenchmarkResult) {
    println!("  Total time: {:.2}ms", result.total_time_ms);
    println!("  Avg time/term: {:.4}ms", result.avg_time_per_term_ms);
    println!("  Avg steps/term: {:.2}", result.avg_steps_per_term);
    println!(
        "  Throughput: {:.0} terms/s, {:.0} steps/s",
        result.throughput_terms_per_sec, result.throughput_steps_per_sec
    );
    println!("  Convergence: {:.1}%", result.convergence_rate * 100.0);
}
