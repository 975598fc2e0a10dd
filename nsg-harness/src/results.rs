/// `k` result ids per query, packed into one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResults {
    ids: Vec<u32>,
    k: usize,
}

impl QueryResults {
    pub fn new(num_queries: usize, k: usize) -> Self {
        assert_ne!(k, 0, "cannot hold zero results per query");
        Self {
            ids: vec![u32::MAX; num_queries * k],
            k,
        }
    }

    pub fn from_rows(rows: &[Vec<u32>], k: usize) -> Self {
        let mut results = Self::new(rows.len(), k);
        for (dst, row) in results.rows_mut().zip(rows) {
            assert_eq!(row.len(), k, "every row needs exactly k ids");
            dst.copy_from_slice(row);
        }
        results
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn num_queries(&self) -> usize {
        self.ids.len() / self.k
    }

    pub fn row(&self, query: usize) -> &[u32] {
        &self.ids[query * self.k..(query + 1) * self.k]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.ids.chunks_exact(self.k)
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u32]> + '_ {
        self.ids.chunks_exact_mut(self.k)
    }
}
