use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fortune_voronoi::{compute_with, BoundingBox, BoundsPolicy, VoronoiConfig, VoronoiOutput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use voronoi_lab::export::export_diagram;
use voronoi_lab::geometry::validation::{validate, validate_point_samples};
use voronoi_lab::geometry::{generate_points, lloyd_relax, PointDistribution};
use voronoi_lab::util::{format_num, parse_count, Timed};

/// Voronoi lab - planar Voronoi diagrams over generated point sets
#[derive(Parser, Debug)]
#[command(name = "voronoi-lab", version, about)]
struct Cli {
    /// Number of sites (e.g. 500, 10k, 1m)
    #[arg(short = 'c', long, value_parser = parse_count, default_value = "10k")]
    count: usize,

    /// Random seed for point generation
    #[arg(long)]
    seed: Option<u64>,

    /// Point distribution
    #[arg(long, value_enum, default_value_t = PointDistribution::Uniform)]
    distribution: PointDistribution,

    /// Width of the region points are generated in
    #[arg(long, default_value_t = 1000.0)]
    width: f64,

    /// Height of the region points are generated in
    #[arg(long, default_value_t = 1000.0)]
    height: f64,

    /// Clip to a box derived from the sites instead of the generation region
    #[arg(long)]
    auto_bounds: bool,

    /// Lloyd relaxation iterations before the final diagram
    #[arg(long, default_value_t = 0)]
    lloyd: usize,

    /// Check the diagram's structure and nearest-site property
    #[arg(long)]
    validate: bool,

    /// Skip merging of coincident sites (exact duplicates are still merged)
    #[arg(long)]
    no_preprocess: bool,

    /// Export diagram to file (supports .json and .json.gz)
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(valid) if valid => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the diagram passed validation (always true when not validating).
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let seed = cli.seed.unwrap_or_else(rand::random);
    let region = BoundingBox::from_extents(0.0, cli.width, 0.0, cli.height);
    if !region.is_valid() {
        return Err(format!("region {} x {} is empty", cli.width, cli.height).into());
    }
    let distribution = cli.distribution;

    println!(
        "Headless mode: n={}, seed={}, distribution={}",
        format_num(cli.count),
        seed,
        distribution
    );

    let mut points = {
        let _t = Timed::info("Generate points");
        generate_points(cli.count, distribution, &region, seed)
    };

    if cli.lloyd > 0 {
        let _t = Timed::info("Lloyd relaxation");
        lloyd_relax(&mut points, region, cli.lloyd)?;
    }

    let config = VoronoiConfig {
        bounds: if cli.auto_bounds {
            BoundsPolicy::default()
        } else {
            BoundsPolicy::Fixed(region)
        },
        preprocess: !cli.no_preprocess,
        ..Default::default()
    };

    let output = {
        let t = Timed::info("Voronoi");
        let output = compute_with(&points, config)?;
        println!("Voronoi computed in {:.1}ms", t.elapsed_ms());
        output
    };

    print_summary(&output);

    let mut valid = true;
    if cli.validate {
        let _t = Timed::info("Validation");
        let result = validate(&output.diagram);
        result.print_summary();

        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5eed);
        let samples = validate_point_samples(&output.diagram, 10_000.min(100 * cli.count.max(1)), 1e-9, &mut rng);
        println!(
            "Point samples: {} / {} correct ({:.4}%), {} outside all cells",
            samples.correct,
            samples.num_samples,
            samples.accuracy() * 100.0,
            samples.outside_all_cells
        );
        valid = result.is_valid() && samples.is_valid();
    }

    if let Some(path) = &cli.export {
        export_diagram(&output, Some(seed), path)?;
        println!("Exported to {}", path.display());
    }

    Ok(valid)
}

fn print_summary(output: &VoronoiOutput) {
    let diagram = &output.diagram;
    let d = &output.diagnostics;

    println!("Diagram:");
    println!("  Cells:         {:>8}", format_num(diagram.num_cells()));
    println!("  Vertices:      {:>8}", format_num(diagram.num_vertices()));
    println!("  Edges:         {:>8}", format_num(diagram.num_edges()));
    println!("  Segments:      {:>8}", format_num(diagram.segments().len()));
    println!(
        "  Bounds:        [{:.2}, {:.2}] x [{:.2}, {:.2}]",
        diagram.bounds.min.x, diagram.bounds.max.x, diagram.bounds.min.y, diagram.bounds.max.y
    );

    let circles = diagram.largest_empty_circles();
    if let Some(first) = circles.first() {
        println!(
            "  Largest empty circle: r={:.4} at ({:.4}, {:.4}) sites {:?}{}",
            first.radius,
            first.center.x,
            first.center.y,
            first.sites,
            if circles.len() > 1 {
                format!(" (+{} ties)", circles.len() - 1)
            } else {
                String::new()
            }
        );
    }

    println!("Diagnostics:");
    println!("  Site events:   {:>8}", d.site_events);
    println!("  Circle events: {:>8}", d.circle_events);
    println!("  Stale events:  {:>8}", d.stale_events);
    if !d.is_clean() || d.vertices_outside_bounds > 0 || d.merged_vertices > 0 {
        println!("  Degenerate triples:      {}", d.degenerate_triples);
        println!("  Merged sites:            {}", d.merged_sites);
        println!("  Merged vertices:         {}", d.merged_vertices);
        println!("  Vertices outside bounds: {}", d.vertices_outside_bounds);
        println!("  Empty cells:             {}", d.empty_cells);
        println!("  Clipped-away edges:      {}", d.clipped_edges);
        if d.insufficient_sites {
            println!("  (fewer than 2 distinct sites: single box cell)");
        }
    }
}
