//! Reachability-ratio computation: the fraction of ordered live vertex
//! pairs `(u, v)`, `u != v`, with `v` reachable from `u`.
//!
//! The CSR variant fans the per-source BFS out over a worker pool;
//! sources are split into index chunks, every worker accumulates into a
//! local counter, and the partial counts merge under one mutex at the
//! join point.

use std::collections::VecDeque;
use std::sync::Mutex;

use fixedbitset::FixedBitSet;
use rayon::prelude::*;

use crate::csr::CsrGraph;
use crate::graph::DiGraph;
use crate::{PartitionId, VertexId, UNASSIGNED};

// Forward BFS from `source`, counting reached live vertices (excluding
// the source). With `partition != UNASSIGNED` only vertices tagged with
// that id are expanded.
fn bfs_count(g: &DiGraph, source: VertexId, partition: PartitionId) -> u64 {
    let mut seen = FixedBitSet::with_capacity(g.vertex_bound());
    let mut queue = VecDeque::new();
    seen.insert(source);
    queue.push_back(source);
    let mut count = 0u64;
    while let Some(u) = queue.pop_front() {
        for &v in g.out_edges(u) {
            if partition != UNASSIGNED && g.partition(v) != partition {
                continue;
            }
            if !seen.contains(v) {
                seen.insert(v);
                queue.push_back(v);
                count += 1;
            }
        }
    }
    count
}

/// Number of ordered reachable pairs among live vertices, serial.
pub fn count_reachable_pairs(g: &DiGraph) -> u64 {
    g.live_vertices()
        .map(|u| bfs_count(g, u, UNASSIGNED))
        .sum()
}

/// Reachability ratio of the live part of `g`:
/// `reachable_pairs / (n * (n - 1))` for `n` live vertices.
pub fn reach_ratio(g: &DiGraph) -> f64 {
    let n = g.vertex_count() as u64;
    if n < 2 {
        return 0.0;
    }
    count_reachable_pairs(g) as f64 / (n * (n - 1)) as f64
}

/// Reachability ratio among the vertices tagged with `partition`, with
/// the search confined to that partition.
pub fn partition_reach_ratio(g: &DiGraph, partition: PartitionId) -> f64 {
    let members: Vec<VertexId> = g
        .live_vertices()
        .filter(|&v| g.partition(v) == partition)
        .collect();
    let n = members.len() as u64;
    if n < 2 {
        return 0.0;
    }
    let pairs: u64 = members.iter().map(|&u| bfs_count(g, u, partition)).sum();
    pairs as f64 / (n * (n - 1)) as f64
}

/// Reachable-pair count among the vertices tagged with `partition`,
/// fanned out over the worker pool; the per-chunk counts merge under
/// one mutex at the join point.
pub fn count_partition_pairs(g: &DiGraph, partition: PartitionId) -> u64 {
    let members: Vec<VertexId> = g
        .live_vertices()
        .filter(|&v| g.partition(v) == partition)
        .collect();
    if members.len() < 2 {
        return 0;
    }
    let workers = rayon::current_num_threads().max(1);
    let chunk = members.len().div_ceil(workers);
    let total = Mutex::new(0u64);
    members.par_chunks(chunk).for_each(|chunk_sources| {
        let local: u64 = chunk_sources
            .iter()
            .map(|&u| bfs_count(g, u, partition))
            .sum();
        *total.lock().expect("ratio merge mutex poisoned") += local;
    });
    total.into_inner().expect("ratio merge mutex poisoned")
}

/// Parallel reachable-pair count over the CSR store.
pub fn count_reachable_pairs_csr(csr: &CsrGraph) -> u64 {
    let sources: Vec<VertexId> = csr.live_vertices().collect();
    if sources.is_empty() {
        return 0;
    }
    let workers = rayon::current_num_threads().max(1);
    let chunk = sources.len().div_ceil(workers);
    let total = Mutex::new(0u64);
    sources.par_chunks(chunk).for_each(|chunk_sources| {
        let mut local = 0u64;
        let mut seen = FixedBitSet::with_capacity(csr.slots());
        let mut queue = VecDeque::new();
        for &source in chunk_sources {
            seen.clear();
            queue.clear();
            seen.insert(source);
            queue.push_back(source);
            while let Some(u) = queue.pop_front() {
                for &v in csr.out_edges(u) {
                    if !seen.contains(v) {
                        seen.insert(v);
                        queue.push_back(v);
                        local += 1;
                    }
                }
            }
        }
        *total.lock().expect("ratio merge mutex poisoned") += local;
    });
    total.into_inner().expect("ratio merge mutex poisoned")
}

/// Reachability ratio over the CSR store, computed in parallel.
pub fn reach_ratio_csr(csr: &CsrGraph) -> f64 {
    let n = csr.vertex_count() as u64;
    if n < 2 {
        return 0.0;
    }
    count_reachable_pairs_csr(csr) as f64 / (n * (n - 1)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::CsrGraph;
    use crate::graph::DiGraph;

    #[test]
    fn chain_ratio() {
        // 0 -> 1 -> 2 -> 3: 6 reachable pairs of 12 ordered pairs.
        let g = DiGraph::from_edges([(0, 1), (1, 2), (2, 3)]);
        assert_eq!(count_reachable_pairs(&g), 6);
        assert!((reach_ratio(&g) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn csr_matches_serial() {
        let g = DiGraph::from_edges([(0, 1), (1, 2), (2, 3), (0, 4), (4, 3), (5, 6)]);
        let csr = CsrGraph::from_graph(&g);
        assert_eq!(count_reachable_pairs(&g), count_reachable_pairs_csr(&csr));
        assert!((reach_ratio(&g) - reach_ratio_csr(&csr)).abs() < 1e-9);
    }

    #[test]
    fn partition_restricted() {
        let mut g = DiGraph::from_edges([(0, 1), (1, 2), (2, 3)]);
        for v in 0..2 {
            g.set_partition(v, 1);
        }
        for v in 2..4 {
            g.set_partition(v, 2);
        }
        // Within partition 1 only 0 -> 1 is reachable: 1 of 2 pairs.
        assert!((partition_reach_ratio(&g, 1) - 0.5).abs() < 1e-9);
        assert!((partition_reach_ratio(&g, 2) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn degenerate_graphs() {
        let empty = DiGraph::new();
        assert_eq!(reach_ratio(&empty), 0.0);
        let single = DiGraph::from_edges([(0, 1)]);
        assert_eq!(count_reachable_pairs(&single), 1);
    }
}
