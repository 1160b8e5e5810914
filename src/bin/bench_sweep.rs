//! Benchmark the sweep at various scales.
//!
//! Run with: cargo run --release --bin bench_sweep
//!
//! Usage:
//!   bench_sweep                 Run default size (100k)
//!   bench_sweep 10k 100k 1m     Run multiple sizes
//!   bench_sweep --lloyd 2       Relax points first (well-spaced input)
//!   bench_sweep -n 10           Run 10 iterations (for profiling)
//!   bench_sweep --batch 8       Compute 8 independent sets in parallel

use std::io::{self, Write};
use std::time::Instant;

use clap::Parser;
use fortune_voronoi::{compute_with, BoundingBox, VoronoiConfig, VoronoiOutput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use voronoi_lab::geometry::validation::{validate, validate_point_samples};
use voronoi_lab::geometry::{generate_points, lloyd_relax, PointDistribution};
use voronoi_lab::util::{format_num, format_rate, parse_count};

#[derive(Parser)]
#[command(name = "bench_sweep")]
#[command(about = "Benchmark Fortune's sweep at various scales")]
struct Args {
    /// Site counts to benchmark (e.g., 10k, 100k, 1m)
    #[arg(value_parser = parse_count)]
    sizes: Vec<usize>,

    /// Random seed
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Point distribution
    #[arg(long, value_enum, default_value_t = PointDistribution::Uniform)]
    distribution: PointDistribution,

    /// Lloyd relaxation iterations applied to the input
    #[arg(long, default_value_t = 0)]
    lloyd: usize,

    /// Validate structure and sample nearest-site queries (slow, max 100k)
    #[arg(long)]
    validate: bool,

    /// Skip coincident-site merging
    #[arg(long)]
    no_preprocess: bool,

    /// Number of iterations to run (useful for profiling)
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: usize,

    /// Compute this many independent point sets in parallel per size
    #[arg(long, default_value_t = 1)]
    batch: usize,
}

struct BenchResult {
    n: usize,
    time_ms: f64,
    num_vertices: usize,
    num_edges: usize,
    stale_events: usize,
}

fn unit_region(n: usize) -> BoundingBox {
    // Keep mean spacing near 1 so tolerances behave the same at every size.
    let side = (n.max(1) as f64).sqrt();
    BoundingBox::from_extents(0.0, side, 0.0, side)
}

fn config(args: &Args, region: BoundingBox) -> VoronoiConfig {
    VoronoiConfig {
        preprocess: !args.no_preprocess,
        ..VoronoiConfig::with_bounds(region)
    }
}

fn prepare_points(args: &Args, n: usize, seed: u64) -> Result<Vec<glam::DVec2>, fortune_voronoi::VoronoiError> {
    let region = unit_region(n);
    let mut points = generate_points(n, args.distribution, &region, seed);
    if args.lloyd > 0 {
        lloyd_relax(&mut points, region, args.lloyd)?;
    }
    Ok(points)
}

fn run_benchmark(points: &[glam::DVec2], config: VoronoiConfig) -> Result<(BenchResult, VoronoiOutput), fortune_voronoi::VoronoiError> {
    let t0 = Instant::now();
    let output = compute_with(points, config)?;
    let time_ms = t0.elapsed().as_secs_f64() * 1000.0;

    let result = BenchResult {
        n: points.len(),
        time_ms,
        num_vertices: output.diagram.num_vertices(),
        num_edges: output.diagram.num_edges(),
        stale_events: output.diagnostics.stale_events,
    };
    Ok((result, output))
}

fn run_validation(output: &VoronoiOutput, seed: u64) {
    println!("\nValidating...");
    let t0 = Instant::now();
    let result = validate(&output.diagram);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let samples = validate_point_samples(&output.diagram, 2_000, 1e-9, &mut rng);
    let time_ms = t0.elapsed().as_secs_f64() * 1000.0;

    println!("  Validation time: {:>8.1}ms", time_ms);
    println!(
        "  Structure:       {:>8}",
        if result.is_valid() { "VALID" } else { "INVALID" }
    );
    println!("  Max vertex err:  {:>8.2e}", result.max_vertex_error);
    println!(
        "  Samples:         {:>8} / {} ({:.2}%)",
        samples.correct,
        samples.num_samples,
        samples.accuracy() * 100.0
    );
    if !result.is_valid() {
        result.print_summary();
    }
}

fn run_batch(args: &Args, n: usize) -> Result<(), fortune_voronoi::VoronoiError> {
    let seeds: Vec<u64> = (0..args.batch as u64).map(|i| args.seed.wrapping_add(i)).collect();
    let sets = seeds
        .iter()
        .map(|&seed| prepare_points(args, n, seed))
        .collect::<Result<Vec<_>, _>>()?;

    let region = unit_region(n);
    let t0 = Instant::now();
    let results = sets
        .par_iter()
        .map(|points| run_benchmark(points, config(args, region)).map(|(r, _)| r))
        .collect::<Result<Vec<_>, _>>()?;
    let wall_ms = t0.elapsed().as_secs_f64() * 1000.0;

    let serial_ms: f64 = results.iter().map(|r| r.time_ms).sum();
    println!("\nBatch results ({} sets, {} threads):", args.batch, rayon::current_num_threads());
    println!("  Wall time:     {:>8.1}ms", wall_ms);
    println!("  Sum of times:  {:>8.1}ms", serial_ms);
    println!("  Parallelism:   {:>8.2}x", serial_ms / wall_ms.max(f64::MIN_POSITIVE));
    println!("  Throughput:    {:>8}", format_rate(n * args.batch, wall_ms));
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), fortune_voronoi::VoronoiError> {
    println!("Fortune Sweep Benchmark");
    println!("=======================\n");

    let sizes: Vec<usize> = if args.sizes.is_empty() {
        vec![100_000]
    } else {
        args.sizes.clone()
    };

    println!("Configuration:");
    println!("  seed = {}", args.seed);
    println!("  distribution = {}", args.distribution);
    if args.lloyd > 0 {
        println!("  lloyd = {} iterations", args.lloyd);
    }
    println!("  preprocess = {}", !args.no_preprocess);
    println!(
        "  sizes = {:?}",
        sizes.iter().map(|&n| format_num(n)).collect::<Vec<_>>()
    );
    if args.repeat > 1 {
        println!("  repeat = {}", args.repeat);
    }
    if args.batch > 1 {
        println!("  batch = {}", args.batch);
    }

    let mut results: Vec<BenchResult> = Vec::new();

    for &n in &sizes {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking n = {}", format_num(n));
        println!("{}", "=".repeat(60));

        if args.batch > 1 {
            run_batch(args, n)?;
            continue;
        }

        let t_gen = Instant::now();
        let points = prepare_points(args, n, args.seed)?;
        println!("Point generation: {:.1}ms", t_gen.elapsed().as_secs_f64() * 1000.0);

        let region = unit_region(n);
        let mut times: Vec<f64> = Vec::with_capacity(args.repeat);
        let mut last = None;

        for iter in 0..args.repeat.max(1) {
            if args.repeat > 1 {
                print!("  Iteration {}/{}... ", iter + 1, args.repeat);
                let _ = io::stdout().flush();
            }

            let (result, output) = run_benchmark(&points, config(args, region))?;
            times.push(result.time_ms);

            if args.repeat > 1 {
                println!("{:.1}ms", result.time_ms);
            }
            last = Some((result, output));
        }

        let Some((result, output)) = last else {
            continue;
        };

        println!("\nResults:");
        if args.repeat > 1 {
            let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg = times.iter().sum::<f64>() / times.len() as f64;
            println!("  Min time:      {:>8.1}ms", min);
            println!("  Max time:      {:>8.1}ms", max);
            println!("  Avg time:      {:>8.1}ms", avg);
            println!("  Throughput:    {:>8} (avg)", format_rate(result.n, avg));
        } else {
            println!("  Total time:    {:>8.1}ms", result.time_ms);
            println!("  Throughput:    {:>8}", format_rate(result.n, result.time_ms));
        }
        println!("  Vertices:      {:>8}", format_num(result.num_vertices));
        println!("  Edges:         {:>8}", format_num(result.num_edges));
        println!("  Stale events:  {:>8}", format_num(result.stale_events));

        if args.validate && n <= 100_000 {
            run_validation(&output, args.seed);
        } else if args.validate {
            println!("\n  (skipping validation for n > 100k - sampling is brute force)");
        }

        results.push(result);
    }

    if results.len() > 1 {
        println!("\n\n{}", "=".repeat(60));
        println!("SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "{:>10} | {:>10} | {:>12} | {:>10}",
            "n", "time", "throughput", "verts"
        );
        println!("{:-<10}-+-{:-<10}-+-{:-<12}-+-{:-<10}", "", "", "", "");

        for r in &results {
            println!(
                "{:>10} | {:>9.1}ms | {:>12} | {:>10}",
                format_num(r.n),
                r.time_ms,
                format_rate(r.n, r.time_ms),
                format_num(r.num_vertices)
            );
        }
    }

    println!("\nBenchmark complete.");
    Ok(())
}
