//! Adapter for navigating spreading-out graphs persisted in the NSG format.
//!
//! On disk: `u32 width`, `u32 entry_point`, then for every node a `u32`
//! degree followed by that many neighbor ids, all little-endian, until end of
//! file. Building the graph is done elsewhere; this only loads and searches
//! it.
use std::{
    fs::File,
    io::{self, BufReader, ErrorKind, Read},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    bitmap::Bitmap,
    error::{HarnessError, Result},
    index::GraphIndex,
    params::SearchParams,
    vecmath::{dot_product, squared_euclidean, squared_norm},
    vectors::VectorSet,
};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: u32,
    distance: f32,
    unexpanded: bool,
}

/// Candidates ordered by ascending distance, never longer than `capacity`.
struct CandidatePool {
    candidates: Vec<Candidate>,
    capacity: usize,
}

impl CandidatePool {
    fn new(capacity: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    fn len(&self) -> usize {
        self.candidates.len()
    }

    fn is_full(&self) -> bool {
        self.candidates.len() >= self.capacity
    }

    fn worst_distance(&self) -> f32 {
        self.candidates.last().map_or(f32::MAX, |c| c.distance)
    }

    /// Returns the position the candidate landed at, or `None` if it did
    /// not make the cut.
    fn insert(&mut self, id: u32, distance: f32) -> Option<usize> {
        let position = self
            .candidates
            .partition_point(|c| c.distance <= distance);
        if position >= self.capacity {
            return None;
        }
        self.candidates.insert(
            position,
            Candidate {
                id,
                distance,
                unexpanded: true,
            },
        );
        self.candidates.truncate(self.capacity);
        Some(position)
    }

    fn write_ids(&self, out: &mut [u32]) {
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.candidates.get(i).map_or(u32::MAX, |c| c.id);
        }
    }
}

/// What a traversal needs from a graph representation.
trait Traversable {
    fn num_nodes(&self) -> usize;
    fn entry_point(&self) -> u32;
    fn neighbors(&self, node: u32) -> &[u32];
    /// Any distance that ranks nodes the same way squared euclidean does.
    fn distance(&self, query: &[f32], node: u32) -> f32;
}

struct RawGraph<'a> {
    index: &'a NsgIndex,
    base: &'a VectorSet,
}

impl Traversable for RawGraph<'_> {
    fn num_nodes(&self) -> usize {
        self.index.graph.len()
    }

    fn entry_point(&self) -> u32 {
        self.index.entry_point
    }

    fn neighbors(&self, node: u32) -> &[u32] {
        &self.index.graph[node as usize]
    }

    fn distance(&self, query: &[f32], node: u32) -> f32 {
        squared_euclidean(query, &self.base[node as usize])
    }
}

/// Every node packed into one stride: squared norm, vector, degree, then
/// the neighbor slots.
#[derive(Debug, Clone)]
struct OptimizedLayout {
    data: Vec<u32>,
    dim: usize,
    max_degree: usize,
    entry_point: u32,
}

impl OptimizedLayout {
    fn build(graph: &[Vec<u32>], entry_point: u32, base: &VectorSet) -> Self {
        let dim = base.dim();
        let max_degree = graph.iter().map(Vec::len).max().unwrap_or(0);
        let stride = 1 + dim + 1 + max_degree;
        let mut data = vec![0_u32; stride * graph.len()];
        for ((node, neighbors), chunk) in graph
            .iter()
            .enumerate()
            .zip(data.chunks_exact_mut(stride))
        {
            let vector = &base[node];
            chunk[0] = squared_norm(vector).to_bits();
            bytemuck::cast_slice_mut::<u32, f32>(&mut chunk[1..1 + dim])
                .copy_from_slice(vector);
            chunk[1 + dim] = neighbors.len() as u32;
            chunk[2 + dim..2 + dim + neighbors.len()].copy_from_slice(neighbors);
        }

        Self {
            data,
            dim,
            max_degree,
            entry_point,
        }
    }

    fn stride(&self) -> usize {
        self.dim + self.max_degree + 2
    }

    fn node(&self, node: u32) -> &[u32] {
        let offset = node as usize * self.stride();
        &self.data[offset..offset + self.stride()]
    }
}

impl Traversable for OptimizedLayout {
    fn num_nodes(&self) -> usize {
        self.data.len() / self.stride()
    }

    fn entry_point(&self) -> u32 {
        self.entry_point
    }

    fn neighbors(&self, node: u32) -> &[u32] {
        let chunk = self.node(node);
        let degree = chunk[1 + self.dim] as usize;
        &chunk[2 + self.dim..2 + self.dim + degree]
    }

    fn distance(&self, query: &[f32], node: u32) -> f32 {
        // |x|^2 - 2<x, q>, which is |x - q|^2 shifted by the constant |q|^2
        let chunk = self.node(node);
        let norm = f32::from_bits(chunk[0]);
        let vector: &[f32] = bytemuck::cast_slice(&chunk[1..1 + self.dim]);
        norm - 2.0 * dot_product(query, vector)
    }
}

/// Greedy best-first search. Returns the candidate pool, closest first.
fn traverse<G: Traversable>(graph: &G, query: &[f32], sp: &SearchParams) -> CandidatePool {
    let num_nodes = graph.num_nodes();
    let l = sp.l_search.min(num_nodes);
    let mut pool = CandidatePool::new(l);
    if l == 0 {
        return pool;
    }
    let mut visited = Bitmap::new(num_nodes);

    let mut initial = Vec::with_capacity(l);
    for &id in graph.neighbors(graph.entry_point()).iter() {
        if initial.len() == l {
            break;
        }
        if !visited.check_set(id as usize) {
            initial.push(id);
        }
    }
    let mut rng = StdRng::seed_from_u64(sp.seed);
    while initial.len() < l {
        let id = rng.gen_range(0..num_nodes as u32);
        if !visited.check_set(id as usize) {
            initial.push(id);
        }
    }
    for id in initial {
        pool.insert(id, graph.distance(query, id));
    }

    let mut k = 0;
    while k < pool.len() {
        let mut nk = pool.len();
        if pool.candidates[k].unexpanded {
            pool.candidates[k].unexpanded = false;
            let node = pool.candidates[k].id;
            for &id in graph.neighbors(node) {
                if visited.check_set(id as usize) {
                    continue;
                }
                let distance = graph.distance(query, id);
                if pool.is_full() && distance >= pool.worst_distance() {
                    continue;
                }
                if let Some(position) = pool.insert(id, distance) {
                    nk = nk.min(position);
                }
            }
        }
        if nk <= k {
            k = nk;
        } else {
            k += 1;
        }
    }

    pool
}

#[derive(Debug, Clone)]
pub struct NsgIndex {
    width: u32,
    entry_point: u32,
    graph: Vec<Vec<u32>>,
    layout: Option<OptimizedLayout>,
}

impl NsgIndex {
    pub fn new(width: u32, entry_point: u32, graph: Vec<Vec<u32>>) -> Self {
        assert!(
            (entry_point as usize) < graph.len(),
            "entry point {entry_point} outside of graph with {} nodes",
            graph.len()
        );
        Self {
            width,
            entry_point,
            graph,
            layout: None,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        eprintln!("loading graph from {path:?}");
        let file = File::open(path).map_err(|source| HarnessError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let invalid = |reason: String| HarnessError::InvalidGraph {
            path: path.to_path_buf(),
            reason,
        };
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let width = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| invalid(format!("missing width: {e}")))?;
        let entry_point = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| invalid(format!("missing entry point: {e}")))?;

        let mut graph = Vec::new();
        let mut position = 8_u64;
        while let Some(degree) = read_degree(&mut reader)? {
            position += 4;
            if degree > width {
                return Err(invalid(format!(
                    "node {} has degree {degree}, above width {width}",
                    graph.len()
                )));
            }
            let byte_len = degree as u64 * 4;
            if byte_len > file_size.saturating_sub(position) {
                return Err(invalid(format!(
                    "truncated node {}: {degree} neighbors past end of file",
                    graph.len()
                )));
            }
            position += byte_len;
            let mut neighbors = vec![0_u32; degree as usize];
            reader
                .read_u32_into::<LittleEndian>(&mut neighbors)
                .map_err(|e| invalid(format!("truncated node {}: {e}", graph.len())))?;
            graph.push(neighbors);
        }

        let num_nodes = graph.len();
        if entry_point as usize >= num_nodes {
            return Err(invalid(format!(
                "entry point {entry_point} outside of graph with {num_nodes} nodes"
            )));
        }
        if let Some((node, id)) = graph.iter().enumerate().find_map(|(node, neighbors)| {
            neighbors
                .iter()
                .find(|&&id| id as usize >= num_nodes)
                .map(|&id| (node, id))
        }) {
            return Err(invalid(format!("node {node} links to unknown node {id}")));
        }
        eprintln!("graph loaded: {num_nodes} nodes, width {width}, entry point {entry_point}");

        Ok(Self::new(width, entry_point, graph))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    pub fn neighbors(&self, node: u32) -> &[u32] {
        &self.graph[node as usize]
    }
}

fn read_degree<R: Read>(reader: &mut R) -> Result<Option<u32>> {
    match reader.read_u32::<LittleEndian>() {
        Ok(degree) => Ok(Some(degree)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(HarnessError::Io(e)),
    }
}

impl GraphIndex for NsgIndex {
    fn num_nodes(&self) -> usize {
        self.graph.len()
    }

    fn search(
        &self,
        query: &[f32],
        base: &VectorSet,
        k: usize,
        sp: &SearchParams,
        out: &mut [u32],
    ) {
        assert_eq!(
            base.num_vecs(),
            self.graph.len(),
            "base vectors do not match the graph"
        );
        let graph = RawGraph { index: self, base };
        traverse(&graph, query, sp).write_ids(&mut out[..k]);
    }

    fn optimize_graph(&mut self, base: &VectorSet) {
        if self.layout.is_some() {
            return;
        }
        assert_eq!(
            base.num_vecs(),
            self.graph.len(),
            "base vectors do not match the graph"
        );
        eprintln!("optimizing graph layout...");
        self.layout = Some(OptimizedLayout::build(&self.graph, self.entry_point, base));
    }

    fn is_optimized(&self) -> bool {
        self.layout.is_some()
    }

    fn search_with_opt_graph(&self, query: &[f32], k: usize, sp: &SearchParams, out: &mut [u32]) {
        let layout = self
            .layout
            .as_ref()
            .expect("search_with_opt_graph called before optimize_graph");
        traverse(layout, query, sp).write_ids(&mut out[..k]);
    }
}

/// Serializes a graph in the NSG format.
pub fn write_graph<W: io::Write>(
    writer: &mut W,
    width: u32,
    entry_point: u32,
    graph: &[Vec<u32>],
) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(width)?;
    writer.write_u32::<LittleEndian>(entry_point)?;
    for neighbors in graph {
        writer.write_u32::<LittleEndian>(neighbors.len() as u32)?;
        for &id in neighbors {
            writer.write_u32::<LittleEndian>(id)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::test_util::{brute_force_knn, random_vectors, ring_graph};

    use super::*;

    fn two_points() -> (NsgIndex, VectorSet) {
        let base = VectorSet::new(vec![0.0, 0.0, 1.0, 1.0], 2);
        let index = NsgIndex::new(1, 1, vec![vec![1], vec![0]]);
        (index, base)
    }

    #[test]
    fn finds_closest_of_two() {
        let (mut index, base) = two_points();
        let sp = SearchParams::from_search_l(2);
        let mut out = [u32::MAX; 1];
        index.search(&[0.1, 0.1], &base, 1, &sp, &mut out);
        assert_eq!(out, [0]);

        index.optimize_graph(&base);
        let mut out = [u32::MAX; 1];
        index.search_with_opt_graph(&[0.1, 0.1], 1, &sp, &mut out);
        assert_eq!(out, [0]);
    }

    #[test]
    fn unfillable_slots_are_max() {
        let (index, base) = two_points();
        let sp = SearchParams::from_search_l(5);
        let mut out = [7; 4];
        index.search(&[0.9, 0.9], &base, 4, &sp, &mut out);
        assert_eq!(out, [1, 0, u32::MAX, u32::MAX]);
    }

    #[test]
    #[should_panic(expected = "before optimize_graph")]
    fn optimized_search_needs_layout() {
        let (index, _) = two_points();
        let mut out = [0; 1];
        index.search_with_opt_graph(&[0.0, 0.0], 1, &SearchParams::from_search_l(1), &mut out);
    }

    #[test]
    fn optimize_is_idempotent() {
        let (mut index, base) = two_points();
        index.optimize_graph(&base);
        let first = index.layout.as_ref().unwrap().data.clone();
        index.optimize_graph(&base);
        assert_eq!(first, index.layout.as_ref().unwrap().data);
        assert!(index.is_optimized());
    }

    #[test]
    fn both_traversals_agree() {
        let base = random_vectors(500, 8, 0x533D);
        let queries = random_vectors(20, 8, 0x533E);
        let mut index = NsgIndex::new(16, 0, ring_graph(500, 16));
        let sp = SearchParams::from_search_l(500);
        let mut raw = vec![0_u32; 10];
        let mut packed = vec![0_u32; 10];
        index.optimize_graph(&base);
        for query in queries.iter() {
            index.search(query, &base, 10, &sp, &mut raw);
            index.search_with_opt_graph(query, 10, &sp, &mut packed);
            let mut raw_sorted = raw.clone();
            let mut packed_sorted = packed.clone();
            raw_sorted.sort();
            packed_sorted.sort();
            assert_eq!(raw_sorted, packed_sorted);
        }
    }

    #[test]
    fn wide_search_is_exact() {
        let base = random_vectors(200, 4, 7);
        let queries = random_vectors(10, 4, 8);
        let index = NsgIndex::new(12, 3, ring_graph(200, 12));
        let sp = SearchParams::from_search_l(200);
        let mut out = vec![0_u32; 5];
        for query in queries.iter() {
            index.search(query, &base, 5, &sp, &mut out);
            assert_eq!(out, brute_force_knn(&base, query, 5));
        }
    }

    #[test]
    fn load_graph_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.nsg");
        let graph = ring_graph(30, 4);
        let mut bytes = Vec::new();
        write_graph(&mut bytes, 4, 2, &graph).unwrap();
        fs::write(&path, bytes).unwrap();

        let index = NsgIndex::load(&path).unwrap();
        assert_eq!(index.num_nodes(), 30);
        assert_eq!(index.width(), 4);
        assert_eq!(index.entry_point(), 2);
        assert_eq!(index.neighbors(5), &graph[5][..]);
    }

    #[test]
    fn truncated_graph_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.nsg");
        let mut bytes = Vec::new();
        write_graph(&mut bytes, 2, 0, &[vec![1, 0], vec![0, 1]]).unwrap();
        bytes.truncate(bytes.len() - 2);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            NsgIndex::load(&path),
            Err(HarnessError::InvalidGraph { .. })
        ));
    }

    #[test]
    fn degree_above_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.nsg");
        let mut bytes = Vec::new();
        write_graph(&mut bytes, 1, 0, &[vec![1, 0], vec![0]]).unwrap();
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            NsgIndex::load(&path),
            Err(HarnessError::InvalidGraph { .. })
        ));
    }

    #[test]
    fn huge_degree_does_not_allocate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.nsg");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(&(u32::MAX - 1).to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let err = NsgIndex::load(&path).unwrap_err();
        assert!(err.to_string().contains("past end of file"), "{err}");
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.nsg");
        let mut bytes = Vec::new();
        write_graph(&mut bytes, 1, 0, &[vec![1], vec![2]]).unwrap();
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            NsgIndex::load(&path),
            Err(HarnessError::InvalidGraph { .. })
        ));
    }
}
