use crate::{params::SearchParams, vectors::VectorSet};

/// The graph index the benchmark drives.
///
/// Result buffers are written in place. Slots the index could not fill are
/// set to `u32::MAX`.
pub trait GraphIndex {
    fn num_nodes(&self) -> usize;

    /// Plain traversal. The base vectors are supplied on every call.
    fn search(
        &self,
        query: &[f32],
        base: &VectorSet,
        k: usize,
        sp: &SearchParams,
        out: &mut [u32],
    );

    /// Prepares the cache-friendly layout. Calling it again is a no-op.
    fn optimize_graph(&mut self, base: &VectorSet);

    fn is_optimized(&self) -> bool;

    /// Traversal over the prepared layout. Panics if `optimize_graph` has
    /// not run.
    fn search_with_opt_graph(&self, query: &[f32], k: usize, sp: &SearchParams, out: &mut [u32]);
}
