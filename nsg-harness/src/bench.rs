use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::{
    error::{HarnessError, Result},
    groundtruth::GroundTruthSet,
    index::GraphIndex,
    params::SearchParams,
    recall::recall_at_k,
    results::QueryResults,
    strategy::SearchStrategy,
    vectors::VectorSet,
};

pub const DEFAULT_TRIALS: usize = 5;

/// Checks the relationships between the inputs that have to hold before any
/// number coming out of a benchmark means something.
pub fn validate(
    base: &VectorSet,
    queries: &VectorSet,
    groundtruth: &GroundTruthSet,
    search_l: usize,
) -> Result<()> {
    if base.dim() != queries.dim() {
        return Err(HarnessError::DimensionMismatch {
            base: base.dim(),
            query: queries.dim(),
        });
    }
    if queries.num_vecs() != groundtruth.len() {
        return Err(HarnessError::QueryCountMismatch {
            queries: queries.num_vecs(),
            groundtruth: groundtruth.len(),
        });
    }
    let k = groundtruth.top_k();
    if search_l < k {
        return Err(HarnessError::SearchListTooSmall { search_l, k });
    }

    Ok(())
}

pub fn validate_graph<I: GraphIndex>(index: &I, base: &VectorSet) -> Result<()> {
    if index.num_nodes() != base.num_vecs() {
        return Err(HarnessError::GraphSizeMismatch {
            nodes: index.num_nodes(),
            points: base.num_vecs(),
        });
    }

    Ok(())
}

/// Timing and quality of one pass over all queries.
#[derive(Debug, Clone, Copy)]
pub struct TrialReport {
    pub trial: usize,
    pub k: usize,
    pub elapsed: Duration,
    pub elapsed_seconds: f64,
    pub qps: f64,
    pub recall: f32,
}

impl TrialReport {
    pub fn new(
        trial: usize,
        k: usize,
        num_queries: usize,
        elapsed: Duration,
        recall: f32,
    ) -> Self {
        let elapsed_seconds = elapsed.as_secs_f64();
        Self {
            trial,
            k,
            elapsed,
            elapsed_seconds,
            qps: num_queries as f64 / elapsed_seconds,
            recall,
        }
    }
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "loop: {}", self.trial)?;
        writeln!(f, "time: {} s", self.elapsed_seconds)?;
        writeln!(f, "qps: {}", self.qps)?;
        write!(f, "R@{}: {}", self.k, self.recall)
    }
}

/// Runs timed query batches against a strategy and scores them.
pub struct BenchmarkRunner<'a> {
    queries: &'a VectorSet,
    groundtruth: &'a GroundTruthSet,
    k: usize,
    sp: SearchParams,
}

impl<'a> BenchmarkRunner<'a> {
    /// `k` is taken from the groundtruth's neighbor count.
    pub fn new(
        queries: &'a VectorSet,
        groundtruth: &'a GroundTruthSet,
        sp: SearchParams,
    ) -> Self {
        Self::with_k(queries, groundtruth, groundtruth.top_k(), sp)
    }

    pub fn with_k(
        queries: &'a VectorSet,
        groundtruth: &'a GroundTruthSet,
        k: usize,
        sp: SearchParams,
    ) -> Self {
        assert_eq!(
            queries.num_vecs(),
            groundtruth.len(),
            "every query needs a groundtruth entry"
        );
        assert!(sp.l_search >= k, "search_L cannot be smaller than search_K!");
        Self {
            queries,
            groundtruth,
            k,
            sp,
        }
    }

    /// One sequential pass over all queries. Only the loop itself is timed.
    pub fn run_trial<S: SearchStrategy>(
        &self,
        strategy: &S,
        trial: usize,
    ) -> (QueryResults, TrialReport) {
        let mut results = QueryResults::new(self.queries.num_vecs(), self.k);

        let start = Instant::now();
        for (query, out) in self.queries.iter().zip(results.rows_mut()) {
            strategy.search(query, self.k, &self.sp, out);
        }
        let elapsed = start.elapsed();

        let recall = recall_at_k(&results, self.groundtruth, self.k);
        let report = TrialReport::new(trial, self.k, self.queries.num_vecs(), elapsed, recall);

        (results, report)
    }

    /// Runs `trial_count` trials, printing each report as it completes.
    pub fn run_trials<S: SearchStrategy>(
        &self,
        strategy: &S,
        trial_count: usize,
    ) -> Vec<TrialReport> {
        println!("\n### {}_search ###", strategy.name());
        (1..=trial_count)
            .map(|trial| {
                let (_results, report) = self.run_trial(strategy, trial);
                println!("\n{report}");
                report
            })
            .collect()
    }
}
