//! Lightweight reachability filters: a DFS-forest interval cover and a
//! per-vertex Bloom sketch of the reachable set.
//!
//! Both are heuristics. The tree cover only certifies reachability along
//! spanning-tree edges (a `true` is sound, a `false` is not a
//! refutation); the Bloom filter admits false positives but never false
//! negatives, so only its `false` answers are conclusive.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::bibfs;
use crate::graph::DiGraph;
use crate::VertexId;

#[derive(Debug, Clone, Copy)]
struct TreeNode {
    tree_id: i32,
    postorder: u32,
    min_postorder: u32,
}

/// Post-order interval index over a DFS spanning forest.
///
/// Every vertex gets `[min_postorder, postorder]` where `min_postorder`
/// is the smallest post-order number in its subtree; `query(u, v)` holds
/// when both vertices share a tree and `v`'s interval nests inside
/// `u`'s, which certifies a tree path from `u` down to `v`.
#[derive(Debug, Clone)]
pub struct TreeCover {
    nodes: Vec<TreeNode>,
}

impl TreeCover {
    pub fn build(g: &DiGraph) -> Self {
        let n = g.vertex_bound();
        let mut nodes = vec![
            TreeNode {
                tree_id: -1,
                postorder: 0,
                min_postorder: 0,
            };
            n
        ];

        let mut tree_count = 0;
        for root in 0..n {
            if !g.is_live(root) || nodes[root].tree_id != -1 {
                continue;
            }
            Self::post_traverse(g, root, tree_count, &mut nodes);
            tree_count += 1;
        }
        TreeCover { nodes }
    }

    // Iterative post-order DFS over the unvisited part of the graph,
    // numbering vertices and folding child minima upward.
    fn post_traverse(g: &DiGraph, root: VertexId, tree_id: i32, nodes: &mut [TreeNode]) {
        let mut order = 1u32;
        // (vertex, next out-edge offset)
        let mut stack: Vec<(VertexId, usize)> = vec![(root, 0)];
        nodes[root].tree_id = tree_id;
        nodes[root].min_postorder = u32::MAX;

        while let Some(&mut (v, ref mut edge)) = stack.last_mut() {
            let out = g.out_edges(v);
            if *edge < out.len() {
                let next = out[*edge];
                *edge += 1;
                if nodes[next].tree_id == -1 {
                    nodes[next].tree_id = tree_id;
                    nodes[next].min_postorder = u32::MAX;
                    stack.push((next, 0));
                }
                continue;
            }
            stack.pop();
            let subtree_min = nodes[v].min_postorder.min(order);
            nodes[v].postorder = order;
            nodes[v].min_postorder = subtree_min;
            order += 1;
            if let Some(&(parent, _)) = stack.last() {
                if subtree_min < nodes[parent].min_postorder {
                    nodes[parent].min_postorder = subtree_min;
                }
            }
        }
    }

    /// `true` certifies a spanning-tree path from `u` to `v`; `false`
    /// means the cover cannot decide.
    pub fn query(&self, u: VertexId, v: VertexId) -> bool {
        let (Some(su), Some(sv)) = (self.nodes.get(u), self.nodes.get(v)) else {
            return false;
        };
        su.tree_id != -1
            && su.tree_id == sv.tree_id
            && su.min_postorder <= sv.min_postorder
            && sv.postorder <= su.postorder
    }
}

const BLOOM_BITS: u32 = 64;
const BLOOM_HASHES: usize = 3;

/// One 64-bit Bloom filter per vertex summarizing its reachable set.
///
/// Built by an all-pairs bidirectional BFS sweep, so construction is
/// quadratic; the value is the constant-time `query` with one-sided
/// error.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    filters: Vec<u64>,
    inserted: Vec<u32>,
}

impl BloomFilter {
    pub fn build(g: &DiGraph) -> Self {
        let n = g.vertex_bound();
        let mut filters = vec![0u64; n];
        let mut inserted = vec![0u32; n];
        for u in g.live_vertices() {
            for v in g.live_vertices() {
                if bibfs::reachable(g, u, v) {
                    for bit in Self::probes(v) {
                        filters[u] |= 1 << bit;
                    }
                    inserted[u] += 1;
                }
            }
        }
        BloomFilter { filters, inserted }
    }

    fn probes(key: VertexId) -> [u32; BLOOM_HASHES] {
        let mut probes = [0u32; BLOOM_HASHES];
        let mut seed = key as u64;
        for probe in &mut probes {
            let mut hasher = DefaultHasher::new();
            seed.hash(&mut hasher);
            seed = hasher.finish();
            *probe = (seed % BLOOM_BITS as u64) as u32;
        }
        probes
    }

    /// `false` is conclusive; `true` means "possibly reachable".
    pub fn query(&self, u: VertexId, v: VertexId) -> bool {
        let Some(&filter) = self.filters.get(u) else {
            return false;
        };
        if v >= self.filters.len() {
            return false;
        }
        Self::probes(v).iter().all(|&bit| filter & (1 << bit) != 0)
    }

    /// Estimated false-positive rate of `u`'s filter,
    /// `(1 - e^(-kn/m))^k`.
    pub fn false_positive_rate(&self, u: VertexId) -> Option<f64> {
        let n = *self.inserted.get(u)? as f64;
        let k = BLOOM_HASHES as f64;
        let m = BLOOM_BITS as f64;
        Some((1.0 - (-k * n / m).exp()).powf(k))
    }
}

#[cfg(test)]
mod tests {
    use super::{BloomFilter, TreeCover};
    use crate::bibfs;
    use crate::graph::DiGraph;

    #[test]
    fn tree_cover_certifies_tree_paths() {
        // A pure out-tree: cover is exact.
        let g = DiGraph::from_edges([(0, 1), (0, 2), (1, 3), (1, 4), (2, 5)]);
        let tc = TreeCover::build(&g);
        for u in 0..6 {
            for v in 0..6 {
                assert_eq!(tc.query(u, v), bibfs::reachable(&g, u, v), "({u}, {v})");
            }
        }
    }

    #[test]
    fn tree_cover_is_sound_on_dags() {
        let g = DiGraph::from_edges([(0, 1), (1, 2), (0, 2), (3, 2)]);
        let tc = TreeCover::build(&g);
        for u in 0..4 {
            for v in 0..4 {
                if tc.query(u, v) {
                    assert!(bibfs::reachable(&g, u, v), "unsound at ({u}, {v})");
                }
            }
        }
    }

    #[test]
    fn bloom_has_no_false_negatives() {
        let g = DiGraph::from_edges([(0, 1), (1, 2), (2, 3), (4, 1)]);
        let bloom = BloomFilter::build(&g);
        for u in 0..5 {
            for v in 0..5 {
                if bibfs::reachable(&g, u, v) {
                    assert!(bloom.query(u, v), "false negative at ({u}, {v})");
                }
            }
        }
        assert!(bloom.false_positive_rate(0).unwrap() < 1.0);
    }
}
