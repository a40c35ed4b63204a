//! Bottleneck 2-hop labels on an undirected weighted graph: every label
//! entry `(landmark, bottleneck)` records the best minimum edge weight
//! over some path between the landmark and the vertex.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::Path;

use crate::cache;
use crate::error::{Error, Result};
use crate::weighted::{Weight, WeightedGraph};
use crate::VertexId;

/// A weighted (bottleneck) Pruned Landmark Labeling index.
///
/// `reachable(u, v, k)` holds iff some path between `u` and `v` uses
/// only edges of weight `>= k`, decided by merging the two label lists
/// and looking for a common landmark whose pair of bottlenecks both
/// reach `k`. Every vertex carries the self entry `(v, Weight::MAX)`.
#[derive(Debug, Clone, Default)]
pub struct WeightedPll {
    labels: Vec<Vec<(VertexId, Weight)>>,
}

impl WeightedPll {
    /// Build labels for `g`. Landmarks are processed in descending
    /// degree order (ascending id on ties); each runs a Dijkstra-style
    /// widest-path search carrying the running bottleneck, so a vertex
    /// is settled with its true maximum bottleneck from the landmark.
    /// Expansion is pruned where the existing labels already witness an
    /// equal-or-better bottleneck. Edge weights are not thresholded
    /// here; the query threshold decides.
    pub fn build(g: &WeightedGraph) -> Self {
        let n = g.vertex_count();
        let mut labels: Vec<Vec<(VertexId, Weight)>> = vec![Vec::new(); n];

        let mut order: Vec<VertexId> = (0..n).collect();
        order.sort_by_key(|&v| (std::cmp::Reverse(g.neighbors(v).len()), v));

        let mut settled = vec![false; n];
        // Max-heap on the bottleneck; ascending vertex id on ties keeps
        // rebuilds reproducible.
        let mut heap: BinaryHeap<(Weight, Reverse<VertexId>)> = BinaryHeap::new();
        for &lm in &order {
            settled.iter_mut().for_each(|b| *b = false);
            heap.clear();
            heap.push((Weight::MAX, Reverse(lm)));
            while let Some((bw, Reverse(x))) = heap.pop() {
                if settled[x] {
                    continue;
                }
                settled[x] = true;
                if x != lm {
                    if hop_bottleneck(&labels[lm], &labels[x], bw) {
                        continue;
                    }
                    insert_or_update(&mut labels[x], lm, bw);
                }
                for &(nb, w) in g.neighbors(x) {
                    if !settled[nb] {
                        heap.push((bw.min(w), Reverse(nb)));
                    }
                }
            }
        }

        for (v, label) in labels.iter_mut().enumerate() {
            insert_or_update(label, v, Weight::MAX);
        }
        WeightedPll { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self, v: VertexId) -> &[(VertexId, Weight)] {
        self.labels.get(v).map_or(&[][..], |l| l)
    }

    /// Total number of stored label entries.
    pub fn label_entries(&self) -> usize {
        self.labels.iter().map(Vec::len).sum()
    }

    /// Whether a path of bottleneck `>= threshold` connects `u` and `v`.
    pub fn reachable(&self, u: VertexId, v: VertexId, threshold: Weight) -> Result<bool> {
        let n = self.labels.len();
        if u >= n {
            return Err(Error::InvalidVertex(u));
        }
        if v >= n {
            return Err(Error::InvalidVertex(v));
        }
        if u == v {
            return Ok(true);
        }
        Ok(intersect_with_threshold(
            &self.labels[u],
            &self.labels[v],
            threshold,
        ))
    }

    /// Write the labels as a text record (see [`crate::cache`]).
    pub fn save(&self, path: &Path) -> Result<()> {
        cache::save_weighted_labels(path, &self.labels)
    }

    /// Restore labels for a graph with `expected_len` vertices.
    pub fn load(path: &Path, expected_len: usize) -> Result<Self> {
        let labels = cache::load_weighted_labels(path, expected_len)?;
        Ok(WeightedPll { labels })
    }
}

// Insert `(landmark, bw)` keeping the list sorted by landmark and
// retaining the maximum bottleneck per landmark.
fn insert_or_update(label: &mut Vec<(VertexId, Weight)>, landmark: VertexId, bw: Weight) {
    match label.binary_search_by_key(&landmark, |&(lm, _)| lm) {
        Ok(i) => {
            if bw > label[i].1 {
                label[i].1 = bw;
            }
        }
        Err(i) => label.insert(i, (landmark, bw)),
    }
}

// Whether the labels witness a common landmark with both bottlenecks at
// or above `threshold`.
fn intersect_with_threshold(
    a: &[(VertexId, Weight)],
    b: &[(VertexId, Weight)],
    threshold: Weight,
) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].0 == b[j].0 {
            if a[i].1.min(b[j].1) >= threshold {
                return true;
            }
            i += 1;
            j += 1;
        } else if a[i].0 < b[j].0 {
            i += 1;
        } else {
            j += 1;
        }
    }
    false
}

// Prune test during construction: true when the labels already witness
// a bottleneck `>= candidate` between the landmark and `node`.
fn hop_bottleneck(
    lm_label: &[(VertexId, Weight)],
    node_label: &[(VertexId, Weight)],
    candidate: Weight,
) -> bool {
    intersect_with_threshold(lm_label, node_label, candidate)
}
