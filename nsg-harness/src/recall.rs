use std::collections::HashSet;

use crate::{groundtruth::GroundTruthSet, results::QueryResults};

/// Number of distinct returned ids that appear in the query's groundtruth.
pub fn matches(returned: &[u32], expected: &HashSet<u32>) -> usize {
    let found: HashSet<u32> = returned.iter().copied().collect();
    found.intersection(expected).count()
}

/// Recall@k over all queries: total matches divided by `queries * k`.
///
/// The denominator uses the caller's `k`, not the groundtruth's `top_k`, so
/// the value is only meaningful when the two agree.
pub fn recall_at_k(results: &QueryResults, groundtruth: &GroundTruthSet, k: usize) -> f32 {
    assert_eq!(
        results.num_queries(),
        groundtruth.len(),
        "results and groundtruth disagree on the number of queries"
    );
    assert_eq!(results.k(), k, "results hold {} ids per query", results.k());
    let num_queries = results.num_queries();
    if num_queries == 0 {
        return 0.0;
    }
    let total_matches: usize = results
        .rows()
        .enumerate()
        .map(|(query, row)| matches(row, groundtruth.neighbors(query)))
        .sum();

    total_matches as f32 / (num_queries * k) as f32
}
