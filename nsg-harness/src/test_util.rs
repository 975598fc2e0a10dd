use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{vecmath::squared_euclidean, vectors::VectorSet};

pub fn random_floats(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

pub fn random_vectors(num_vecs: usize, dimension: usize, seed: u64) -> VectorSet {
    VectorSet::new(random_floats(num_vecs * dimension, seed), dimension)
}

/// Every node linked to its `degree` nearest ring positions, half on each
/// side.
pub fn ring_graph(num_nodes: usize, degree: usize) -> Vec<Vec<u32>> {
    let half = (degree / 2).min(num_nodes.saturating_sub(1) / 2).max(1);
    (0..num_nodes)
        .map(|node| {
            (1..=half)
                .flat_map(|offset| {
                    [
                        (node + offset) % num_nodes,
                        (node + num_nodes - offset) % num_nodes,
                    ]
                })
                .map(|id| id as u32)
                .collect()
        })
        .collect()
}

/// Exact k nearest ids by squared euclidean distance, closest first.
pub fn brute_force_knn(base: &VectorSet, query: &[f32], k: usize) -> Vec<u32> {
    let mut pairs: Vec<(u32, f32)> = base
        .iter()
        .enumerate()
        .map(|(id, vector)| (id as u32, squared_euclidean(query, vector)))
        .collect();
    pairs.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    pairs.into_iter().take(k).map(|(id, _)| id).collect()
}
