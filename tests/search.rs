use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use reachgraph::bibfs;
use reachgraph::csr::CsrGraph;
use reachgraph::graph::DiGraph;
use reachgraph::UNASSIGNED;

// Reference: plain forward BFS.
fn bfs_reachable(g: &DiGraph, source: usize, target: usize) -> bool {
    if source == target {
        return g.is_live(source);
    }
    let mut seen = vec![false; g.vertex_bound()];
    let mut queue = VecDeque::new();
    if source >= g.vertex_bound() {
        return false;
    }
    seen[source] = true;
    queue.push_back(source);
    while let Some(u) = queue.pop_front() {
        for &v in g.out_edges(u) {
            if v == target {
                return true;
            }
            if !seen[v] {
                seen[v] = true;
                queue.push_back(v);
            }
        }
    }
    false
}

fn random_graph(seed: u64, n: usize, edges: usize) -> DiGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = DiGraph::new();
    for _ in 0..edges {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        g.add_edge(u, v);
    }
    g
}

#[test]
fn bidirectional_agrees_with_unidirectional() {
    for seed in 0..4u64 {
        let g = random_graph(seed, 30, 60);
        for u in 0..30 {
            for v in 0..30 {
                if u == v {
                    continue;
                }
                assert_eq!(
                    bibfs::reachable(&g, u, v),
                    bfs_reachable(&g, u, v),
                    "seed {seed}, pair ({u}, {v})"
                );
            }
        }
    }
}

#[test]
fn csr_search_agrees_with_adjacency_search() {
    let g = random_graph(11, 40, 90);
    let csr = CsrGraph::from_graph(&g);
    for u in 0..40 {
        for v in 0..40 {
            assert_eq!(
                bibfs::reachable(&g, u, v),
                bibfs::reachable_csr(&csr, u, v),
                "({u}, {v})"
            );
        }
    }
}

#[test]
fn recovered_paths_are_walkable() {
    let g = random_graph(5, 25, 50);
    for u in 0..25 {
        for v in 0..25 {
            match bibfs::find_path(&g, u, v, UNASSIGNED) {
                Some(path) => {
                    assert_eq!(path[0], u);
                    assert_eq!(*path.last().unwrap(), v);
                    for w in path.windows(2) {
                        assert!(g.contains_edge(w[0], w[1]), "broken hop {:?}", w);
                    }
                }
                None => assert!(u == v || !bibfs::reachable(&g, u, v)),
            }
        }
    }
}

#[test]
fn boundary_queries() {
    let g = DiGraph::from_edges([(0, 1)]);
    // Self queries hold, tombstones and out-of-range ids do not.
    assert!(bibfs::reachable(&g, 0, 0));
    assert!(!bibfs::reachable(&g, 7, 7));
    assert!(!bibfs::reachable(&g, 0, 7));
    let empty = DiGraph::new();
    assert!(!bibfs::reachable(&empty, 0, 1));
}
