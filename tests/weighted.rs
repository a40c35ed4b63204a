use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use reachgraph::weighted::WeightedGraph;
use reachgraph::weighted_pll::WeightedPll;

fn chain_and_cycle() -> WeightedGraph {
    // Chain 5-6-7-8-9-10-20-21 (all weight 19) plus the weight-19 cycle
    // 11-12-13-14-15-11, threshold 5. Vertices 0..=4 and 16..=19 stay
    // isolated.
    let mut g = WeightedGraph::new(22, 5);
    for &(u, v) in &[(5, 6), (6, 7), (7, 8), (8, 9), (9, 10), (10, 20), (20, 21)] {
        g.add_edge(u, v, 19).unwrap();
    }
    for &(u, v) in &[(11, 12), (12, 13), (13, 14), (14, 15), (15, 11)] {
        g.add_edge(u, v, 19).unwrap();
    }
    g
}

#[test]
fn landmark_scenario() {
    let mut g = chain_and_cycle();
    g.build_indices();
    g.build_landmark_labels();
    assert!(g.landmark_reachable(5, 21).unwrap());
    assert!(g.landmark_reachable(11, 14).unwrap());
    assert!(!g.landmark_reachable(0, 5).unwrap());
}

#[test]
fn disjoint_set_matches_components_under_threshold() {
    let mut g = chain_and_cycle();
    // Edges below the threshold connect nothing.
    g.add_edge(5, 11, 4).unwrap();
    g.add_edge(0, 1, 1).unwrap();
    g.build_indices();
    assert!(g.ds_reachable(5, 21).unwrap());
    assert!(!g.ds_reachable(5, 11).unwrap());
    assert!(!g.ds_reachable(0, 1).unwrap());

    let components = g.components().unwrap();
    for component in &components {
        for &a in component {
            for &b in component {
                assert!(g.ds_reachable(a, b).unwrap());
            }
        }
    }
    let total: usize = components.iter().map(Vec::len).sum();
    assert_eq!(total, g.vertex_count());
}

fn random_weighted(seed: u64, n: usize, edges: usize, max_w: u32) -> WeightedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = WeightedGraph::new(n, 0);
    for _ in 0..edges {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        if u != v {
            g.add_edge(u, v, rng.gen_range(1..=max_w)).unwrap();
        }
    }
    g
}

#[test]
fn bottleneck_labels_match_thresholded_components() {
    for seed in 0..4u64 {
        let g = random_weighted(seed, 24, 40, 6);
        let pll = WeightedPll::build(&g);
        for k in 1..=7u32 {
            // Ground truth: union-find over edges of weight >= k.
            let mut filtered = WeightedGraph::new(24, k);
            for u in 0..24 {
                for &(v, w) in g.neighbors(u) {
                    if u < v && w >= k {
                        filtered.add_edge(u, v, w).unwrap();
                    }
                }
            }
            filtered.build_indices();
            for u in 0..24 {
                for v in 0..24 {
                    assert_eq!(
                        pll.reachable(u, v, k).unwrap(),
                        filtered.ds_reachable(u, v).unwrap(),
                        "seed {seed}, pair ({u}, {v}), k={k}"
                    );
                }
            }
        }
    }
}

#[test]
fn label_lists_sorted_with_self_entry() {
    let g = random_weighted(9, 18, 30, 5);
    let pll = WeightedPll::build(&g);
    for v in 0..pll.len() {
        let labels = pll.labels(v);
        assert!(labels.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(labels.iter().any(|&(lm, bw)| lm == v && bw == u32::MAX));
    }
}

#[test]
fn landmark_labels_agree_with_disjoint_set() {
    let mut g = random_weighted(14, 20, 35, 4);
    g.build_indices();
    g.build_landmark_labels();
    for u in 0..20 {
        for v in 0..20 {
            assert_eq!(
                g.landmark_reachable(u, v).unwrap(),
                g.ds_reachable(u, v).unwrap(),
                "({u}, {v})"
            );
        }
    }
}
