//! A tagged selection of reachability algorithms behind one `query`
//! dispatch, replacing deep inheritance with a plain enum.

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;

use crate::bibfs;
use crate::csr::CsrGraph;
use crate::filters::{BloomFilter, TreeCover};
use crate::graph::DiGraph;
use crate::pll::Pll;
use crate::VertexId;

/// A dense reachability bitmatrix over the live vertices of a small
/// graph, with a compact vertex ↔ row mapping.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    ids: HashMap<VertexId, usize>,
    rows: Vec<FixedBitSet>,
}

impl DenseMatrix {
    /// Fill the matrix by a bidirectional BFS per ordered vertex pair.
    pub fn build(g: &DiGraph) -> Self {
        let members: Vec<VertexId> = g.live_vertices().collect();
        let ids: HashMap<VertexId, usize> =
            members.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let mut rows = vec![FixedBitSet::with_capacity(members.len()); members.len()];
        for (i, &u) in members.iter().enumerate() {
            for (j, &v) in members.iter().enumerate() {
                if i == j || bibfs::reachable(g, u, v) {
                    rows[i].insert(j);
                }
            }
        }
        DenseMatrix { ids, rows }
    }

    /// Constant-time lookup; vertices outside the mapping answer
    /// `false`.
    pub fn query(&self, u: VertexId, v: VertexId) -> bool {
        match (self.ids.get(&u), self.ids.get(&v)) {
            (Some(&i), Some(&j)) => self.rows[i].contains(j),
            _ => false,
        }
    }
}

/// The complement index: adjacency lists of the *unreachable* ordered
/// pairs among the live vertices of a graph. Effective when nearly
/// every pair is reachable.
#[derive(Debug, Clone)]
pub struct UnreachablePairs {
    ids: HashMap<VertexId, usize>,
    adj: Vec<Vec<usize>>,
}

impl UnreachablePairs {
    pub fn build(g: &DiGraph) -> Self {
        let members: Vec<VertexId> = g.live_vertices().collect();
        let ids: HashMap<VertexId, usize> =
            members.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let mut adj = vec![Vec::new(); members.len()];
        for (i, &u) in members.iter().enumerate() {
            for (j, &v) in members.iter().enumerate() {
                if i != j && !bibfs::reachable(g, u, v) {
                    adj[i].push(j);
                }
            }
        }
        UnreachablePairs { ids, adj }
    }

    /// `true` unless the pair is recorded unreachable. A vertex outside
    /// the mapping has no incident edges in the indexed graph, so only
    /// the self pair would be reachable and the lookup answers `false`.
    pub fn query(&self, u: VertexId, v: VertexId) -> bool {
        if u == v {
            return self.ids.contains_key(&u);
        }
        match (self.ids.get(&u), self.ids.get(&v)) {
            (Some(&i), Some(&j)) => !self.adj[i].contains(&j),
            _ => false,
        }
    }
}

/// One reachability algorithm, selected at build time.
///
/// Every variant owns whatever index it needs; `query` takes the graph
/// so the index-free searches have something to walk.
#[derive(Debug, Clone)]
pub enum ReachIndex {
    /// Plain bidirectional BFS on the adjacency graph; no index.
    BiBfs,
    /// Bidirectional BFS over an owned CSR copy of the graph.
    BiBfsCsr(CsrGraph),
    /// Directed 2-hop landmark labels.
    TwoHop(Pll),
    /// Dense reachability bitmatrix.
    DenseMatrix(DenseMatrix),
    /// Complement adjacency of unreachable pairs.
    UnreachablePairs(UnreachablePairs),
    /// DFS-forest interval cover (positive filter).
    TreeCover(TreeCover),
    /// Per-vertex Bloom sketch (negative filter).
    Bloom(BloomFilter),
}

impl ReachIndex {
    pub fn query(&self, g: &DiGraph, u: VertexId, v: VertexId) -> bool {
        match self {
            ReachIndex::BiBfs => bibfs::reachable(g, u, v),
            ReachIndex::BiBfsCsr(csr) => bibfs::reachable_csr(csr, u, v),
            ReachIndex::TwoHop(pll) => pll.query(u, v),
            ReachIndex::DenseMatrix(m) => m.query(u, v),
            ReachIndex::UnreachablePairs(up) => up.query(u, v),
            ReachIndex::TreeCover(tc) => tc.query(u, v),
            ReachIndex::Bloom(bloom) => bloom.query(u, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DiGraph;
    use crate::pll::Pll;

    fn dag() -> DiGraph {
        DiGraph::from_edges([(0, 1), (1, 2), (1, 3), (0, 4), (4, 3), (4, 5)])
    }

    #[test]
    fn exact_variants_agree() {
        let g = dag();
        let variants = [
            ReachIndex::BiBfs,
            ReachIndex::BiBfsCsr(CsrGraph::from_graph(&g)),
            ReachIndex::TwoHop(Pll::build(&g).unwrap()),
            ReachIndex::DenseMatrix(DenseMatrix::build(&g)),
            ReachIndex::UnreachablePairs(UnreachablePairs::build(&g)),
        ];
        for u in 0..6 {
            for v in 0..6 {
                let expected = bibfs::reachable(&g, u, v);
                for (i, variant) in variants.iter().enumerate() {
                    assert_eq!(
                        variant.query(&g, u, v),
                        expected,
                        "variant {i} disagrees on ({u}, {v})"
                    );
                }
            }
        }
    }

    #[test]
    fn filter_variants_keep_their_one_sided_guarantees() {
        let g = dag();
        let cover = ReachIndex::TreeCover(crate::filters::TreeCover::build(&g));
        let bloom = ReachIndex::Bloom(crate::filters::BloomFilter::build(&g));
        for u in 0..6 {
            for v in 0..6 {
                let exact = bibfs::reachable(&g, u, v);
                if cover.query(&g, u, v) {
                    assert!(exact, "tree cover unsound at ({u}, {v})");
                }
                if !bloom.query(&g, u, v) {
                    assert!(!exact, "bloom false negative at ({u}, {v})");
                }
            }
        }
    }

    #[test]
    fn unmapped_vertices_answer_false() {
        let g = dag();
        let dense = DenseMatrix::build(&g);
        let up = UnreachablePairs::build(&g);
        assert!(!dense.query(0, 77));
        assert!(!up.query(77, 0));
        assert!(!up.query(77, 77));
    }
}
