use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, SystemTime};

use clap::Parser;
use density_tree::dataset::dataset_from_csv;
use density_tree::tree::{Region, Side};
use density_tree::{fit, BuildReport, DensityTree, DensityTreeParamsBuilder, ImprovementThreshold};
use log::error;

/// Partition a CSV of feature vectors into Gaussian-fitted regions.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file, one feature vector per line
    input: PathBuf,

    /// The first line holds column names
    #[arg(long)]
    header: bool,

    /// Grow until this many leaf regions exist
    #[arg(short = 'k', long, conflicts_with_all = ["max_depth", "min_fraction", "threshold"])]
    leaves: Option<usize>,

    #[arg(long, default_value_t = 4)]
    max_depth: usize,

    /// Smallest share of the dataset a node needs to be split further
    #[arg(long, default_value_t = 0.05)]
    min_fraction: f64,

    /// Minimum entropy reduction in nats, or `always`
    #[arg(long, default_value = "always")]
    threshold: ImprovementThreshold,

    /// Try at most this many random dimensions per split
    #[arg(long)]
    max_dims: Option<usize>,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Stop growing after this many seconds and keep the partial tree
    #[arg(long)]
    time_budget: Option<f64>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(&args.input)?;
    let x = dataset_from_csv(BufReader::new(file), args.header)?;
    println!("Read {} points in {} dimensions", x.nrows(), x.ncols());

    let mut builder = match args.leaves {
        Some(k) => DensityTreeParamsBuilder::new().n_leaves(k),
        None => DensityTreeParamsBuilder::new().bounded(
            args.max_depth,
            args.min_fraction,
            args.threshold,
        ),
    };
    if let Some(max_dims) = args.max_dims {
        builder = builder.max_dims(max_dims, args.seed);
    }
    if let Some(secs) = args.time_budget {
        builder = builder.time_budget(Duration::try_from_secs_f64(secs)?);
    }

    let start = SystemTime::now();
    let (report, tree) = fit(x.view(), &builder.build())?;
    println!("Time elapsed: {:?}", start.elapsed()?);

    print_tree(&tree);
    print_report(&report);
    Ok(())
}

fn print_tree(tree: &DensityTree) {
    for id in tree.preorder() {
        let node = tree.node(id);
        let indent = "  ".repeat(node.depth());
        let origin = match node.side() {
            Some(Side::Left) => "L",
            Some(Side::Right) => "R",
            None => "root",
        };
        match node.split() {
            Some(split) => println!(
                "{indent}[{id}] {origin} n={} h={:.4} x{} <= {:.6} | left {:.3} (h={:.4}) right {:.3} (h={:.4})",
                node.count(),
                node.entropy(),
                split.dimension,
                split.value,
                split.left.fraction,
                split.left.gaussian.entropy,
                split.right.fraction,
                split.right.gaussian.entropy,
            ),
            None => println!(
                "{indent}[{id}] {origin} n={} h={:.4} leaf",
                node.count(),
                node.entropy()
            ),
        }
    }

    println!("Leaf regions:");
    for region in tree.leaves() {
        let Region { node, side } = region;
        let gaussian = tree.region_gaussian(region);
        println!(
            "  node {node} {:<5} fraction {:.4} entropy {:.4} mean {:.4}",
            side.map_or("-".to_string(), |s| format!("{s:?}")),
            tree.region_fraction(region),
            gaussian.entropy,
            gaussian.mean,
        );
    }
}

fn print_report(report: &BuildReport) {
    println!(
        "Nodes: {}, leaves: {}, depth: {}, truncated branches: {}",
        report.n_nodes, report.n_leaves, report.max_depth, report.truncated_branches
    );
    if let Some(k) = report.requested_leaves {
        if report.under_target {
            println!("Requested {k} leaves but the data only supported {}", report.n_leaves);
        }
    }
    if report.cancelled {
        println!("Build stopped early, the tree is partial");
    }
}
