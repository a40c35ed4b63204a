use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use reachgraph::cache::{self, SUFFIX_PLL};
use reachgraph::weighted::WeightedGraph;
use reachgraph::weighted_pll::WeightedPll;
use reachgraph::Error;

fn random_weighted(seed: u64, n: usize, edges: usize) -> WeightedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = WeightedGraph::new(n, 2);
    for _ in 0..edges {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        if u != v {
            g.add_edge(u, v, rng.gen_range(1..=8)).unwrap();
        }
    }
    g
}

#[test]
fn bottleneck_labels_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = cache::with_suffix(&dir.path().join("web"), SUFFIX_PLL);

    let g = random_weighted(1, 30, 60);
    let pll = WeightedPll::build(&g);
    pll.save(&path).unwrap();
    let restored = WeightedPll::load(&path, g.vertex_count()).unwrap();

    for u in 0..30 {
        for v in 0..30 {
            for k in 1..=8 {
                assert_eq!(
                    pll.reachable(u, v, k).unwrap(),
                    restored.reachable(u, v, k).unwrap(),
                    "({u}, {v}) at k={k}"
                );
            }
        }
    }
}

#[test]
fn adjacency_and_disjoint_set_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let adj_path = dir.path().join("g_adj.idx");
    let ds_path = dir.path().join("g_ds.idx");

    let mut g = random_weighted(2, 25, 50);
    g.build_indices();
    g.save_adjacency(&adj_path).unwrap();
    g.save_disjoint_sets(&ds_path).unwrap();

    let mut restored = WeightedGraph::new(25, 2);
    restored.load_adjacency(&adj_path).unwrap();
    restored.load_disjoint_sets(&ds_path).unwrap();

    for u in 0..25 {
        for v in 0..25 {
            assert_eq!(
                g.ds_reachable(u, v).unwrap(),
                restored.ds_reachable(u, v).unwrap(),
                "({u}, {v})"
            );
        }
        assert_eq!(g.neighbors(u), restored.neighbors(u));
    }
}

#[test]
fn loading_into_wrong_size_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let adj_path = dir.path().join("g_adj.idx");
    let g = random_weighted(3, 10, 20);
    g.save_adjacency(&adj_path).unwrap();

    let mut wrong = WeightedGraph::new(11, 2);
    assert!(matches!(
        wrong.load_adjacency(&adj_path),
        Err(Error::CacheMismatch { .. })
    ));
}

#[test]
fn missing_files_are_io_misses() {
    let dir = tempfile::tempdir().unwrap();
    let mut g = WeightedGraph::new(4, 1);
    let missing = dir.path().join("nothing_here.idx");
    assert!(matches!(g.load_adjacency(&missing), Err(Error::Io(_))));
    assert!(matches!(g.load_disjoint_sets(&missing), Err(Error::Io(_))));
    assert!(matches!(
        WeightedPll::load(&missing, 4),
        Err(Error::Io(_))
    ));
}

#[test]
fn saving_unbuilt_indices_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let g = WeightedGraph::new(4, 1);
    assert!(matches!(
        g.save_disjoint_sets(&dir.path().join("ds.idx")),
        Err(Error::LayerUnavailable(_))
    ));
}
