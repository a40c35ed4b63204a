//! Pruned Landmark Labeling (PLL) for directed reachability: 2-hop
//! IN/OUT label sets built over a DAG by pruned forward and backward
//! BFS from each landmark.

use std::collections::VecDeque;
use std::path::Path;

use fixedbitset::FixedBitSet;

use crate::cache;
use crate::error::{Error, Result};
use crate::graph::DiGraph;
use crate::util::{insert_sorted, intersects};
use crate::VertexId;

/// A directed 2-hop reachability index.
///
/// Every vertex `v` carries two ascending, deduplicated landmark lists:
/// `IN[v]` (landmarks that reach `v`) and `OUT[v]` (landmarks reachable
/// from `v`). `query(u, v)` holds iff `v ∈ OUT[u]`, `u ∈ IN[v]`, or
/// `OUT[u] ∩ IN[v]` is non-empty.
///
/// Construction requires an acyclic graph; condense strongly connected
/// components first (see the equivalence mapping in
/// [`crate::partition`]) or [`Pll::build`] fails with
/// [`Error::GraphHasCycle`].
#[derive(Debug, Clone)]
pub struct Pll {
    inn: Vec<Vec<VertexId>>,
    out: Vec<Vec<VertexId>>,
    has_out: FixedBitSet,
    has_in: FixedBitSet,
}

impl Pll {
    /// Build labels for `g`.
    ///
    /// Landmarks are processed by `(in_degree + 1) * (out_degree + 1)`
    /// descending, ties broken by ascending vertex id so rebuilds are
    /// reproducible. Each landmark runs a pruned BFS along out-edges
    /// (filling `IN`) and one along in-edges (filling `OUT`); a vertex
    /// whose labels already prove the hop is skipped without expansion
    /// of its label.
    pub fn build(g: &DiGraph) -> Result<Self> {
        if g.is_cyclic() {
            return Err(Error::GraphHasCycle);
        }
        let n = g.vertex_bound();
        let mut order: Vec<VertexId> = g.live_vertices().collect();
        order.sort_by_key(|&v| {
            (
                std::cmp::Reverse((g.in_degree(v) + 1) * (g.out_degree(v) + 1)),
                v,
            )
        });

        let mut inn: Vec<Vec<VertexId>> = vec![Vec::new(); n];
        let mut out: Vec<Vec<VertexId>> = vec![Vec::new(); n];
        let mut visited = FixedBitSet::with_capacity(n);
        let mut queue = VecDeque::new();

        for &lm in &order {
            // Forward pruned BFS: lm reaches x, so lm joins IN[x].
            visited.clear();
            queue.clear();
            visited.insert(lm);
            queue.push_back(lm);
            while let Some(x) = queue.pop_front() {
                if x != lm {
                    if intersects(&out[lm], &inn[x]) {
                        continue;
                    }
                    insert_sorted(&mut inn[x], lm);
                }
                for &nb in g.out_edges(x) {
                    if !visited.contains(nb) {
                        visited.insert(nb);
                        queue.push_back(nb);
                    }
                }
            }

            // Backward pruned BFS: x reaches lm, so lm joins OUT[x].
            visited.clear();
            queue.clear();
            visited.insert(lm);
            queue.push_back(lm);
            while let Some(x) = queue.pop_front() {
                if x != lm {
                    if intersects(&out[x], &inn[lm]) {
                        continue;
                    }
                    insert_sorted(&mut out[x], lm);
                }
                for &nb in g.in_edges(x) {
                    if !visited.contains(nb) {
                        visited.insert(nb);
                        queue.push_back(nb);
                    }
                }
            }
        }

        Ok(Pll {
            inn,
            out,
            has_out: Self::degree_bits(g, n, true),
            has_in: Self::degree_bits(g, n, false),
        })
    }

    fn degree_bits(g: &DiGraph, n: usize, outgoing: bool) -> FixedBitSet {
        let mut bits = FixedBitSet::with_capacity(n);
        for v in 0..n {
            let deg = if outgoing { g.out_degree(v) } else { g.in_degree(v) };
            if deg > 0 {
                bits.insert(v);
            }
        }
        bits
    }

    /// Number of label slots (one past the maximum vertex id at build).
    pub fn len(&self) -> usize {
        self.inn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inn.is_empty()
    }

    pub fn in_labels(&self, v: VertexId) -> &[VertexId] {
        self.inn.get(v).map_or(&[][..], |l| l)
    }

    pub fn out_labels(&self, v: VertexId) -> &[VertexId] {
        self.out.get(v).map_or(&[][..], |l| l)
    }

    /// Total number of stored label entries, IN plus OUT.
    pub fn label_entries(&self) -> usize {
        self.inn.iter().map(Vec::len).sum::<usize>() + self.out.iter().map(Vec::len).sum::<usize>()
    }

    /// Answer a reachability query from the labels alone.
    ///
    /// Out-of-range and tombstone endpoints answer `false`; a self query
    /// on a live vertex answers `true`.
    pub fn query(&self, u: VertexId, v: VertexId) -> bool {
        let n = self.len();
        if u >= n || v >= n {
            return false;
        }
        let u_dead = !self.has_out.contains(u) && !self.has_in.contains(u);
        let v_dead = !self.has_out.contains(v) && !self.has_in.contains(v);
        if u_dead || v_dead {
            return false;
        }
        if u == v {
            return true;
        }
        if !self.has_out.contains(u) || !self.has_in.contains(v) {
            return false;
        }
        self.out[u].binary_search(&v).is_ok()
            || self.inn[v].binary_search(&u).is_ok()
            || intersects(&self.out[u], &self.inn[v])
    }

    /// Write the labels as a text record (see [`crate::cache`]).
    pub fn save(&self, path: &Path) -> Result<()> {
        cache::save_hop_labels(path, &self.inn, &self.out)
    }

    /// Restore labels previously written by [`Pll::save`], bound to the
    /// same graph. Fails with a cache error when the record does not
    /// match `g`'s slot count.
    pub fn load(path: &Path, g: &DiGraph) -> Result<Self> {
        let n = g.vertex_bound();
        let (inn, out) = cache::load_hop_labels(path, n)?;
        Ok(Pll {
            inn,
            out,
            has_out: Self::degree_bits(g, n, true),
            has_in: Self::degree_bits(g, n, false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Pll;
    use crate::bibfs;
    use crate::graph::DiGraph;

    fn diamond() -> DiGraph {
        DiGraph::from_edges([(0, 1), (1, 2), (1, 3), (0, 4), (4, 3), (4, 5)])
    }

    #[test]
    fn rejects_cycles() {
        let g = DiGraph::from_edges([(0, 1), (1, 2), (2, 0)]);
        assert!(Pll::build(&g).is_err());
    }

    #[test]
    fn small_dag_queries() {
        let g = diamond();
        let pll = Pll::build(&g).unwrap();
        assert!(pll.query(0, 5));
        assert!(pll.query(4, 5));
        assert!(pll.query(4, 3));
        assert!(!pll.query(3, 4));
        assert!(pll.query(2, 2));
        assert!(!pll.query(0, 99));
    }

    #[test]
    fn labels_are_sorted_and_unique() {
        let g = diamond();
        let pll = Pll::build(&g).unwrap();
        for v in 0..pll.len() {
            assert!(pll.in_labels(v).windows(2).all(|w| w[0] < w[1]));
            assert!(pll.out_labels(v).windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn agrees_with_search_on_chain_of_diamonds() {
        let mut edges = Vec::new();
        for i in 0..5usize {
            let base = i * 3;
            edges.push((base, base + 1));
            edges.push((base, base + 2));
            edges.push((base + 1, base + 3));
            edges.push((base + 2, base + 3));
        }
        let g = DiGraph::from_edges(edges);
        let pll = Pll::build(&g).unwrap();
        for u in 0..g.vertex_bound() {
            for v in 0..g.vertex_bound() {
                assert_eq!(
                    pll.query(u, v),
                    bibfs::reachable(&g, u, v),
                    "disagrees on ({u}, {v})"
                );
            }
        }
    }
}
