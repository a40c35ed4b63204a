//! Undirected weighted multigraph with an embedded union-find over the
//! edges at or above a weight threshold, and optional landmark labels.

use std::path::Path;

use crate::cache;
use crate::error::{Error, Result};
use crate::unionfind::UnionFind;
use crate::util::{insert_sorted, intersects};
use crate::VertexId;

/// Edge weight. `Weight::MAX` doubles as the +∞ bottleneck of a
/// zero-length path.
pub type Weight = u32;

/// An undirected weighted graph: `adj[v]` is an unordered list of
/// `(neighbor, weight)` pairs, each edge stored in both endpoint lists.
///
/// The graph carries a fixed `min_weight` threshold chosen at
/// construction. [`WeightedGraph::build_indices`] derives a union-find
/// over the edges with `weight >= min_weight`;
/// [`WeightedGraph::build_landmark_labels`] additionally derives 2-hop
/// landmark labels over the same thresholded edge set. Any mutation
/// invalidates both until the next rebuild.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    adj: Vec<Vec<(VertexId, Weight)>>,
    min_weight: Weight,
    ds: Option<UnionFind>,
    labels: Option<Vec<Vec<VertexId>>>,
    fresh: bool,
}

impl WeightedGraph {
    pub fn new(num_vertices: usize, min_weight: Weight) -> Self {
        WeightedGraph {
            adj: vec![Vec::new(); num_vertices],
            min_weight,
            ds: None,
            labels: None,
            fresh: false,
        }
    }

    pub fn min_weight(&self) -> Weight {
        self.min_weight
    }

    pub fn vertex_count(&self) -> usize {
        self.adj.len()
    }

    /// Undirected edge count; each stored pair is counted once.
    pub fn edge_count(&self) -> usize {
        self.adj
            .iter()
            .enumerate()
            .map(|(u, nbrs)| nbrs.iter().filter(|&&(v, _)| u < v).count())
            .sum()
    }

    /// Append a vertex, returning its id.
    pub fn add_vertex(&mut self) -> VertexId {
        self.fresh = false;
        self.adj.push(Vec::new());
        self.adj.len() - 1
    }

    pub fn add_vertices(&mut self, count: usize) {
        self.fresh = false;
        self.adj.resize_with(self.adj.len() + count, Vec::new);
    }

    /// Add the undirected edge `{u, v}` with the given weight. Parallel
    /// edges are allowed.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId, weight: Weight) -> Result<()> {
        let n = self.adj.len();
        if u >= n {
            return Err(Error::InvalidVertex(u));
        }
        if v >= n {
            return Err(Error::InvalidVertex(v));
        }
        self.fresh = false;
        self.adj[u].push((v, weight));
        self.adj[v].push((u, weight));
        Ok(())
    }

    /// Neighbors of `v` with weights; empty for out-of-range ids.
    pub fn neighbors(&self, v: VertexId) -> &[(VertexId, Weight)] {
        self.adj.get(v).map_or(&[][..], |n| n)
    }

    /// Rebuild the union-find over edges with `weight >= min_weight`,
    /// then compress it so queries are read-only.
    pub fn build_indices(&mut self) {
        let mut ds = UnionFind::new(self.adj.len());
        for (u, nbrs) in self.adj.iter().enumerate() {
            for &(v, w) in nbrs {
                if u < v && w >= self.min_weight {
                    ds.union(u, v);
                }
            }
        }
        ds.compress();
        self.ds = Some(ds);
        self.fresh = true;
    }

    /// Whether `u` and `v` are connected through edges at or above the
    /// weight threshold. Requires [`WeightedGraph::build_indices`].
    pub fn ds_reachable(&self, u: VertexId, v: VertexId) -> Result<bool> {
        let n = self.adj.len();
        if u >= n {
            return Err(Error::InvalidVertex(u));
        }
        if v >= n {
            return Err(Error::InvalidVertex(v));
        }
        if u == v {
            return Ok(true);
        }
        match (&self.ds, self.fresh) {
            (Some(ds), true) => Ok(ds.find(u) == ds.find(v)),
            _ => Err(Error::LayerUnavailable(self.min_weight)),
        }
    }

    /// Rebuild the landmark labels: vertices in descending degree order
    /// (ascending id on ties) each run a BFS that ignores edges below
    /// the weight threshold and prunes where the existing labels already
    /// connect the pair.
    pub fn build_landmark_labels(&mut self) {
        let n = self.adj.len();
        let mut labels: Vec<Vec<VertexId>> = vec![Vec::new(); n];
        let mut order: Vec<VertexId> = (0..n).collect();
        order.sort_by_key(|&v| (std::cmp::Reverse(self.adj[v].len()), v));

        let mut visited = vec![false; n];
        let mut queue = std::collections::VecDeque::new();
        for &lm in &order {
            visited.iter_mut().for_each(|b| *b = false);
            queue.clear();
            visited[lm] = true;
            queue.push_back(lm);
            while let Some(x) = queue.pop_front() {
                if x != lm {
                    if intersects(&labels[lm], &labels[x]) {
                        continue;
                    }
                    insert_sorted(&mut labels[x], lm);
                }
                for &(nb, w) in &self.adj[x] {
                    if w >= self.min_weight && !visited[nb] {
                        visited[nb] = true;
                        queue.push_back(nb);
                    }
                }
            }
        }
        for (v, label) in labels.iter_mut().enumerate() {
            insert_sorted(label, v);
        }
        self.labels = Some(labels);
    }

    /// Whether `u` and `v` share a landmark label. Requires
    /// [`WeightedGraph::build_landmark_labels`].
    pub fn landmark_reachable(&self, u: VertexId, v: VertexId) -> Result<bool> {
        let n = self.adj.len();
        if u >= n {
            return Err(Error::InvalidVertex(u));
        }
        if v >= n {
            return Err(Error::InvalidVertex(v));
        }
        if u == v {
            return Ok(true);
        }
        let labels = self
            .labels
            .as_ref()
            .ok_or(Error::LayerUnavailable(self.min_weight))?;
        Ok(intersects(&labels[u], &labels[v]))
    }

    /// Connected components under the weight threshold. Requires
    /// [`WeightedGraph::build_indices`].
    pub fn components(&self) -> Result<Vec<Vec<VertexId>>> {
        let ds = match (&self.ds, self.fresh) {
            (Some(ds), true) => ds,
            _ => return Err(Error::LayerUnavailable(self.min_weight)),
        };
        let n = self.adj.len();
        let mut index_of_root = vec![usize::MAX; n];
        let mut components: Vec<Vec<VertexId>> = Vec::new();
        for v in 0..n {
            let root = ds.find(v);
            if index_of_root[root] == usize::MAX {
                index_of_root[root] = components.len();
                components.push(Vec::new());
            }
            components[index_of_root[root]].push(v);
        }
        Ok(components)
    }

    /// Bytes held by the adjacency lists.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;
        self.adj
            .iter()
            .map(|n| n.capacity() * size_of::<(VertexId, Weight)>())
            .sum()
    }

    /// Write the adjacency record (see [`crate::cache`]).
    pub fn save_adjacency(&self, path: &Path) -> Result<()> {
        cache::save_weighted_adjacency(path, &self.adj)
    }

    /// Replace the adjacency from a cache record; the record's vertex
    /// count must match this graph's. Clears derived indices.
    pub fn load_adjacency(&mut self, path: &Path) -> Result<()> {
        let adj = cache::load_weighted_adjacency(path, self.adj.len())?;
        self.adj = adj;
        self.ds = None;
        self.labels = None;
        self.fresh = false;
        Ok(())
    }

    /// Write the union-find record. Requires built indices.
    pub fn save_disjoint_sets(&self, path: &Path) -> Result<()> {
        let ds = self
            .ds
            .as_ref()
            .ok_or(Error::LayerUnavailable(self.min_weight))?;
        cache::save_disjoint_sets(path, ds)
    }

    /// Restore the union-find from a cache record sized to this graph.
    pub fn load_disjoint_sets(&mut self, path: &Path) -> Result<()> {
        let ds = cache::load_disjoint_sets(path, self.adj.len())?;
        self.ds = Some(ds);
        self.fresh = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::WeightedGraph;

    fn chain_and_cycle() -> WeightedGraph {
        // Chain 5-6-7-8-9-10-20-21 and cycle 11-12-13-14-15-11, all
        // edges weight 19; threshold 5.
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
    fn ds_reachability_respects_threshold() {
        let mut g = chain_and_cycle();
        g.add_edge(5, 11, 2).unwrap(); // below threshold, ignored
        g.build_indices();
        assert!(g.ds_reachable(5, 21).unwrap());
        assert!(g.ds_reachable(11, 14).unwrap());
        assert!(!g.ds_reachable(5, 11).unwrap());
        assert!(!g.ds_reachable(0, 5).unwrap());
        assert!(g.ds_reachable(3, 3).unwrap());
        assert!(g.ds_reachable(99, 0).is_err());
    }

    #[test]
    fn landmark_labels_agree_with_components() {
        let mut g = chain_and_cycle();
        g.build_indices();
        g.build_landmark_labels();
        assert!(g.landmark_reachable(5, 21).unwrap());
        assert!(g.landmark_reachable(11, 14).unwrap());
        assert!(!g.landmark_reachable(0, 5).unwrap());
        for u in 0..22 {
            for v in 0..22 {
                assert_eq!(
                    g.ds_reachable(u, v).unwrap(),
                    g.landmark_reachable(u, v).unwrap(),
                    "({u}, {v})"
                );
            }
        }
    }

    #[test]
    fn mutation_invalidates_indices() {
        let mut g = chain_and_cycle();
        g.build_indices();
        assert!(g.ds_reachable(5, 6).unwrap());
        g.add_edge(0, 1, 9).unwrap();
        assert!(g.ds_reachable(5, 6).is_err());
        g.build_indices();
        assert!(g.ds_reachable(0, 1).unwrap());
    }

    #[test]
    fn components_partition_vertices() {
        let mut g = chain_and_cycle();
        g.build_indices();
        let comps = g.components().unwrap();
        let total: usize = comps.iter().map(Vec::len).sum();
        assert_eq!(total, g.vertex_count());
        let chain = comps.iter().find(|c| c.contains(&5)).unwrap();
        assert_eq!(chain, &vec![5, 6, 7, 8, 9, 10, 20, 21]);
    }
}
