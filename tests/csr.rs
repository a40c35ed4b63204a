use reachgraph::bibfs;
use reachgraph::csr::CsrGraph;
use reachgraph::graph::DiGraph;

#[test]
fn sparse_chain_layout() {
    let csr = CsrGraph::from_edge_list(&[(1, 2), (2, 3), (3, 4), (4, 100)]);
    assert_eq!(csr.max_vertex_id(), Some(100));
    assert_eq!(csr.edge_count(), 4);
    assert_eq!(csr.vertex_count(), 5);
    assert_eq!(csr.out_degree(1), 1);
    assert_eq!(csr.out_degree(4), 1);
    assert_eq!(csr.in_degree(100), 1);
    for v in 5..100 {
        assert!(!csr.is_live(v));
        assert!(csr.out_edges(v).is_empty());
        assert!(csr.in_edges(v).is_empty());
    }

    assert!(bibfs::reachable_csr(&csr, 1, 4));
    assert!(bibfs::reachable_csr(&csr, 1, 100));
    assert!(!bibfs::reachable_csr(&csr, 43, 1));
}

#[test]
fn rows_stay_consistent_under_edits() {
    let mut csr = CsrGraph::from_edge_list(&[(0, 1), (1, 2), (2, 3), (0, 3), (3, 5)]);

    assert!(csr.add_edge(1, 3).unwrap());
    assert!(csr.add_edge(5, 2).unwrap());
    assert!(!csr.add_edge(0, 1).unwrap());
    assert!(csr.remove_edge(0, 3).unwrap());
    assert!(!csr.remove_edge(0, 3).unwrap());

    // Rows sorted ascending, duals symmetric, counters agreeing.
    let slots = csr.max_vertex_id().unwrap() + 1;
    let mut out_edges = Vec::new();
    let mut in_edges = Vec::new();
    for v in 0..slots {
        assert!(csr.out_edges(v).windows(2).all(|w| w[0] < w[1]));
        assert!(csr.in_edges(v).windows(2).all(|w| w[0] < w[1]));
        for &t in csr.out_edges(v) {
            out_edges.push((v, t));
        }
        for &s in csr.in_edges(v) {
            in_edges.push((s, v));
        }
    }
    out_edges.sort_unstable();
    in_edges.sort_unstable();
    assert_eq!(out_edges, in_edges);
    assert_eq!(out_edges.len(), csr.edge_count());
}

#[test]
fn vertex_removal_shrinks_tail() {
    let mut csr = CsrGraph::from_edge_list(&[(0, 1), (1, 2), (2, 9), (9, 4)]);
    assert!(csr.remove_vertex(9).unwrap());
    assert_eq!(csr.max_vertex_id(), Some(2));
    assert_eq!(csr.edge_count(), 2);
    assert!(!csr.is_live(4));
    assert!(csr.remove_vertex(1).is_ok());
    assert!(csr.remove_vertex(77).is_err());
}

#[test]
fn from_graph_carries_partitions() {
    let mut g = DiGraph::from_edges([(0, 1), (1, 2), (2, 0)]);
    g.set_partition(0, 3);
    g.set_partition(1, 3);
    g.set_partition(2, 4);
    let mut csr = CsrGraph::from_graph(&g);
    assert_eq!(csr.partition(0), 3);
    assert_eq!(csr.partition(2), 4);
    assert!(csr.set_partition(1, 9));
    assert_eq!(csr.partition(1), 9);
    assert!(!csr.set_partition(50, 1));
    assert_eq!(csr.edge_count(), 3);
    for v in 0..3 {
        assert_eq!(csr.out_edges(v), g.out_edges(v));
        assert_eq!(csr.in_edges(v), g.in_edges(v));
    }
}

#[test]
fn memory_usage_is_positive_and_monotone() {
    let small = CsrGraph::from_edge_list(&[(0, 1)]);
    let large = CsrGraph::from_edge_list(&(0..100).map(|i| (i, i + 1)).collect::<Vec<_>>());
    assert!(small.memory_usage() > 0);
    assert!(large.memory_usage() > small.memory_usage());
}
