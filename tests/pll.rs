use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use reachgraph::bibfs;
use reachgraph::cache::{self, SUFFIX_HOP};
use reachgraph::graph::DiGraph;
use reachgraph::pll::Pll;
use reachgraph::Error;

// Random DAG: edges only from lower to higher ids.
fn random_dag(seed: u64, n: usize, edges: usize) -> DiGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = DiGraph::new();
    while g.edge_count() < edges {
        let u = rng.gen_range(0..n - 1);
        let v = rng.gen_range(u + 1..n);
        g.add_edge(u, v);
    }
    g
}

#[test]
fn small_dag_scenario() {
    let g = DiGraph::from_edges([(0, 1), (1, 2), (1, 3), (0, 4), (4, 3), (4, 5)]);
    let pll = Pll::build(&g).unwrap();
    assert!(pll.query(0, 5));
    assert!(pll.query(4, 5));
    assert!(pll.query(4, 3));
    assert!(!pll.query(3, 4));
}

#[test]
fn matches_transitive_closure_on_random_dags() {
    for seed in 0..5u64 {
        let g = random_dag(seed, 40, 80);
        let pll = Pll::build(&g).unwrap();
        for u in 0..40 {
            for v in 0..40 {
                if u == v {
                    continue;
                }
                assert_eq!(
                    pll.query(u, v),
                    bibfs::reachable(&g, u, v),
                    "seed {seed}, pair ({u}, {v})"
                );
            }
        }
    }
}

#[test]
fn cyclic_graph_is_rejected() {
    let g = DiGraph::from_edges([(0, 1), (1, 2), (2, 0), (2, 3)]);
    assert!(matches!(Pll::build(&g), Err(Error::GraphHasCycle)));
}

#[test]
fn boundary_queries() {
    let g = DiGraph::from_edges([(0, 1), (2, 3)]);
    let pll = Pll::build(&g).unwrap();
    assert!(pll.query(0, 0));
    assert!(!pll.query(0, 99));
    assert!(!pll.query(99, 0));
    assert!(!pll.query(0, 2));
    // A graph with a single live pair answers only along the edge.
    assert!(pll.query(0, 1));
    assert!(!pll.query(1, 0));
}

#[test]
fn save_load_answers_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = cache::with_suffix(&dir.path().join("dag"), SUFFIX_HOP);
    let g = random_dag(21, 30, 55);
    let pll = Pll::build(&g).unwrap();
    pll.save(&path).unwrap();
    let restored = Pll::load(&path, &g).unwrap();
    for u in 0..30 {
        for v in 0..30 {
            assert_eq!(pll.query(u, v), restored.query(u, v), "({u}, {v})");
        }
    }
}

#[test]
fn load_against_wrong_graph_misses() {
    let dir = tempfile::tempdir().unwrap();
    let path = cache::with_suffix(&dir.path().join("dag"), SUFFIX_HOP);
    let mut g = random_dag(3, 20, 30);
    g.add_edge(0, 19);
    Pll::build(&g).unwrap().save(&path).unwrap();
    let mut other = random_dag(4, 25, 30);
    other.add_edge(0, 24);
    assert!(matches!(
        Pll::load(&path, &other),
        Err(Error::CacheMismatch { .. })
    ));
}
