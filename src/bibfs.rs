//! Bidirectional breadth-first search on the adjacency graph and on the
//! CSR store, with path reconstruction and a partition-restricted
//! variant.

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;

use crate::csr::CsrGraph;
use crate::graph::DiGraph;
use crate::{PartitionId, VertexId, UNASSIGNED};

// Pop one frontier entry and expand it; reports a meet as soon as a
// neighbor is already seen by the opposite side.
fn step<'a>(
    queue: &mut VecDeque<VertexId>,
    visited: &mut FixedBitSet,
    opposite: &FixedBitSet,
    neighbors: impl Fn(VertexId) -> &'a [VertexId],
) -> bool {
    let Some(current) = queue.pop_front() else {
        return false;
    };
    for &n in neighbors(current) {
        if opposite.contains(n) {
            return true;
        }
        if !visited.contains(n) {
            visited.insert(n);
            queue.push_back(n);
        }
    }
    false
}

/// Whether `target` is reachable from `source`, meeting forward and
/// backward frontiers in the middle.
///
/// A self-query is `true`; out-of-range and tombstone endpoints are
/// `false`.
pub fn reachable(g: &DiGraph, source: VertexId, target: VertexId) -> bool {
    if source == target {
        return true;
    }
    if !g.is_live(source) || !g.is_live(target) {
        return false;
    }
    let bound = g.vertex_bound();
    let mut fwd_seen = FixedBitSet::with_capacity(bound);
    let mut bwd_seen = FixedBitSet::with_capacity(bound);
    let mut fwd = VecDeque::new();
    let mut bwd = VecDeque::new();
    fwd.push_back(source);
    fwd_seen.insert(source);
    bwd.push_back(target);
    bwd_seen.insert(target);

    while !fwd.is_empty() && !bwd.is_empty() {
        if step(&mut fwd, &mut fwd_seen, &bwd_seen, |v| g.out_edges(v)) {
            return true;
        }
        if step(&mut bwd, &mut bwd_seen, &fwd_seen, |v| g.in_edges(v)) {
            return true;
        }
    }
    false
}

/// Bidirectional reachability over the CSR store.
pub fn reachable_csr(csr: &CsrGraph, source: VertexId, target: VertexId) -> bool {
    if source == target {
        return true;
    }
    if !csr.is_live(source) || !csr.is_live(target) {
        return false;
    }
    let bound = csr.slots();
    let mut fwd_seen = FixedBitSet::with_capacity(bound);
    let mut bwd_seen = FixedBitSet::with_capacity(bound);
    let mut fwd = VecDeque::new();
    let mut bwd = VecDeque::new();
    fwd.push_back(source);
    fwd_seen.insert(source);
    bwd.push_back(target);
    bwd_seen.insert(target);

    while !fwd.is_empty() && !bwd.is_empty() {
        if step(&mut fwd, &mut fwd_seen, &bwd_seen, |v| csr.out_edges(v)) {
            return true;
        }
        if step(&mut bwd, &mut bwd_seen, &fwd_seen, |v| csr.in_edges(v)) {
            return true;
        }
    }
    false
}

/// Find a path from `source` to `target`, recording predecessors on both
/// sides and stitching them at the meeting vertex.
///
/// With `partition != UNASSIGNED`, any neighbor tagged with a different
/// partition id is skipped, so the path stays inside that partition.
pub fn find_path(
    g: &DiGraph,
    source: VertexId,
    target: VertexId,
    partition: PartitionId,
) -> Option<Vec<VertexId>> {
    if source == target {
        return Some(vec![source]);
    }
    if g.out_degree(source) == 0 || g.in_degree(target) == 0 {
        return None;
    }
    if g.contains_edge(source, target) {
        return Some(vec![source, target]);
    }

    let bound = g.vertex_bound();
    let mut fwd_seen = FixedBitSet::with_capacity(bound);
    let mut bwd_seen = FixedBitSet::with_capacity(bound);
    let mut fwd_parent: HashMap<VertexId, VertexId> = HashMap::new();
    let mut bwd_parent: HashMap<VertexId, VertexId> = HashMap::new();
    let mut fwd = VecDeque::new();
    let mut bwd = VecDeque::new();
    fwd.push_back(source);
    fwd_seen.insert(source);
    bwd.push_back(target);
    bwd_seen.insert(target);

    let mut meeting: Option<VertexId> = None;
    'search: while !fwd.is_empty() && !bwd.is_empty() {
        let current = fwd.pop_front().expect("checked non-empty");
        for &n in g.out_edges(current) {
            if partition != UNASSIGNED && g.partition(n) != partition {
                continue;
            }
            if !fwd_seen.contains(n) {
                fwd_seen.insert(n);
                fwd_parent.insert(n, current);
                fwd.push_back(n);
                if bwd_seen.contains(n) {
                    meeting = Some(n);
                    break 'search;
                }
            }
        }

        let current = match bwd.pop_front() {
            Some(v) => v,
            None => break,
        };
        for &n in g.in_edges(current) {
            if partition != UNASSIGNED && g.partition(n) != partition {
                continue;
            }
            if !bwd_seen.contains(n) {
                bwd_seen.insert(n);
                bwd_parent.insert(n, current);
                bwd.push_back(n);
                if fwd_seen.contains(n) {
                    meeting = Some(n);
                    break 'search;
                }
            }
        }
    }

    let meeting = meeting?;
    let mut path = Vec::new();
    let mut node = Some(meeting);
    while let Some(v) = node {
        path.push(v);
        node = fwd_parent.get(&v).copied();
    }
    path.reverse();
    let mut node = bwd_parent.get(&meeting).copied();
    while let Some(v) = node {
        path.push(v);
        node = bwd_parent.get(&v).copied();
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DiGraph;

    fn diamond() -> DiGraph {
        DiGraph::from_edges([(0, 1), (1, 2), (1, 3), (0, 4), (4, 3), (4, 5)])
    }

    #[test]
    fn reachable_basics() {
        let g = diamond();
        assert!(reachable(&g, 0, 5));
        assert!(reachable(&g, 4, 3));
        assert!(!reachable(&g, 3, 4));
        assert!(reachable(&g, 2, 2));
        assert!(!reachable(&g, 0, 99));
    }

    #[test]
    fn csr_agrees_with_adjacency() {
        let g = diamond();
        let csr = crate::csr::CsrGraph::from_graph(&g);
        for u in 0..6 {
            for v in 0..6 {
                assert_eq!(reachable(&g, u, v), reachable_csr(&csr, u, v), "({u}, {v})");
            }
        }
    }

    #[test]
    fn path_endpoints_and_edges() {
        let g = DiGraph::from_edges([(0, 1), (1, 2), (2, 3), (3, 4), (0, 5), (5, 4)]);
        let path = find_path(&g, 0, 4, UNASSIGNED).unwrap();
        assert_eq!(*path.first().unwrap(), 0);
        assert_eq!(*path.last().unwrap(), 4);
        for w in path.windows(2) {
            assert!(g.contains_edge(w[0], w[1]));
        }
        assert!(find_path(&g, 4, 0, UNASSIGNED).is_none());
    }

    #[test]
    fn partition_restricted_path() {
        let mut g = DiGraph::from_edges([(0, 1), (1, 2), (0, 3), (3, 2)]);
        for v in [0, 1, 2] {
            g.set_partition(v, 7);
        }
        g.set_partition(3, 8);
        let path = find_path(&g, 0, 2, 7).unwrap();
        assert_eq!(path, vec![0, 1, 2]);
        // Through 3 only, once 1 moves out of partition 7.
        g.set_partition(1, 8);
        assert!(find_path(&g, 0, 2, 7).is_none());
    }
}
