use crate::{index::GraphIndex, params::SearchParams, vectors::VectorSet};

/// One way of answering a query with `k` ids.
pub trait SearchStrategy {
    fn name(&self) -> &str;
    fn search(&self, query: &[f32], k: usize, sp: &SearchParams, out: &mut [u32]);
}

/// Raw traversal, handing the base vectors to the index on every query.
pub struct Baseline<'a, I> {
    index: &'a I,
    base: &'a VectorSet,
}

impl<'a, I: GraphIndex> Baseline<'a, I> {
    pub fn new(index: &'a I, base: &'a VectorSet) -> Self {
        Self { index, base }
    }
}

impl<I: GraphIndex> SearchStrategy for Baseline<'_, I> {
    fn name(&self) -> &str {
        "unoptimized"
    }

    fn search(&self, query: &[f32], k: usize, sp: &SearchParams, out: &mut [u32]) {
        self.index.search(query, self.base, k, sp, out)
    }
}

/// Traversal over the prepared layout. Only obtainable through
/// [`Optimized::prepare`], so the layout always exists.
pub struct Optimized<'a, I> {
    index: &'a I,
}

impl<'a, I: GraphIndex> Optimized<'a, I> {
    pub fn prepare(index: &'a mut I, base: &VectorSet) -> Self {
        index.optimize_graph(base);
        Self { index }
    }
}

impl<I: GraphIndex> SearchStrategy for Optimized<'_, I> {
    fn name(&self) -> &str {
        "optimized"
    }

    fn search(&self, query: &[f32], k: usize, sp: &SearchParams, out: &mut [u32]) {
        self.index.search_with_opt_graph(query, k, sp, out)
    }
}

#[cfg(test)]
mod tests {
    use crate::nsg::NsgIndex;

    use super::*;

    #[test]
    fn strategies_route_to_their_entry_points() {
        let base = VectorSet::new(vec![0.0, 0.0, 1.0, 1.0], 2);
        let mut index = NsgIndex::new(1, 0, vec![vec![1], vec![0]]);
        let sp = SearchParams::from_search_l(2);
        let mut out = [0_u32; 1];

        let baseline = Baseline::new(&index, &base);
        baseline.search(&[0.9, 1.0], 1, &sp, &mut out);
        assert_eq!(out, [1]);
        assert_eq!(baseline.name(), "unoptimized");

        let optimized = Optimized::prepare(&mut index, &base);
        optimized.search(&[0.1, 0.0], 1, &sp, &mut out);
        assert_eq!(out, [0]);
        assert_eq!(optimized.name(), "optimized");
        assert!(index.is_optimized());
    }
}
