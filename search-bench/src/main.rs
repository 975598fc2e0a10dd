use std::{path::PathBuf, process::exit};

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use nsg_harness::{
    bench::{validate, validate_graph, BenchmarkRunner, DEFAULT_TRIALS},
    groundtruth::GroundTruthSet,
    nsg::NsgIndex,
    params::SearchParams,
    strategy::{Baseline, Optimized},
    vectors::VectorSet,
};

/// Measure recall and throughput of a persisted NSG graph, with and
/// without the optimized memory layout.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Command {
    /// persisted graph
    graph: PathBuf,
    /// base vectors (.fvecs)
    base: PathBuf,
    /// query vectors (.fvecs)
    query: PathBuf,
    /// groundtruth neighbor ids (.ivecs)
    groundtruth: PathBuf,
    /// candidate list size, must be at least the groundtruth's top_k;
    /// `--params` takes precedence when given
    search_l: usize,

    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,
    /// search params as json, e.g. '{"L_search": 200, "P_search": 200}'
    #[arg(long)]
    params: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
}

fn run(args: Command) -> anyhow::Result<()> {
    let base = VectorSet::load(&args.base).context("could not load base vectors")?;
    let queries = VectorSet::load(&args.query).context("could not load query vectors")?;
    let groundtruth =
        GroundTruthSet::load(&args.groundtruth).context("could not load groundtruth")?;

    println!("points_num: {}", base.num_vecs());
    println!("dim: {}", base.dim());
    println!("query_num: {}", queries.num_vecs());
    println!("query_dim: {}", queries.dim());
    println!("gt_num: {}", groundtruth.len());
    println!("top_k: {}", groundtruth.top_k());

    let mut sp = match args.params {
        Some(params) => serde_json::from_str::<SearchParams>(&params)
            .context("unable to parse search params")?,
        None => SearchParams::from_search_l(args.search_l),
    };
    if let Some(seed) = args.seed {
        sp.seed = seed;
    }

    println!("search_L: {}", sp.l_search);
    println!("search_K: {}", groundtruth.top_k());

    validate(&base, &queries, &groundtruth, sp.l_search)?;

    let mut index = NsgIndex::load(&args.graph).context("could not load graph")?;
    validate_graph(&index, &base)?;

    let runner = BenchmarkRunner::new(&queries, &groundtruth, sp);
    runner.run_trials(&Baseline::new(&index, &base), args.trials);
    runner.run_trials(&Optimized::prepare(&mut index, &base), args.trials);

    Ok(())
}

fn main() {
    let args = Command::parse();
    if let Err(e) = run(args) {
        eprintln!("{} {e:#}", "error:".bold().red());
        exit(1);
    }
}
