//! A mutable directed graph over a dense vertex-id space, with sorted
//! per-vertex adjacency and partition tags.

use crate::{PartitionId, VertexId, UNASSIGNED};

/// Per-vertex record: partition tag plus dual sorted adjacency.
///
/// A slot with no incident edges is a *tombstone*: addressable, but
/// skipped by iteration and reported dead by [`DiGraph::is_live`].
#[derive(Debug, Clone)]
pub struct Vertex {
    pub partition: PartitionId,
    out: Vec<VertexId>,
    inn: Vec<VertexId>,
}

impl Default for Vertex {
    fn default() -> Self {
        Vertex {
            partition: UNASSIGNED,
            out: Vec::new(),
            inn: Vec::new(),
        }
    }
}

/// A directed graph keeping, for every vertex, its out- and in-neighbor
/// lists sorted ascending, a partition id, and live-vertex/edge counters.
///
/// Vertex ids are dense `usize` values; adding an edge grows the slot
/// space as needed. Self loops are rejected. Duplicate edges are no-ops.
#[derive(Debug, Clone, Default)]
pub struct DiGraph {
    vertices: Vec<Vertex>,
    edge_count: usize,
    live_count: usize,
}

impl DiGraph {
    pub fn new() -> Self {
        DiGraph::default()
    }

    /// Create a graph with `n` pre-allocated tombstone slots.
    pub fn with_capacity(n: usize) -> Self {
        DiGraph {
            vertices: vec![Vertex::default(); n],
            edge_count: 0,
            live_count: 0,
        }
    }

    /// Build a graph from an edge iterator. Self loops are dropped.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (VertexId, VertexId)>,
    {
        let mut g = DiGraph::new();
        for (u, v) in edges {
            g.add_edge(u, v);
        }
        g
    }

    /// Number of addressable slots (one past the maximum vertex id).
    pub fn vertex_bound(&self) -> usize {
        self.vertices.len()
    }

    /// Number of live (non-tombstone) vertices.
    pub fn vertex_count(&self) -> usize {
        self.live_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether the slot exists and has at least one incident edge.
    pub fn is_live(&self, v: VertexId) -> bool {
        self.vertices
            .get(v)
            .map_or(false, |vx| !vx.out.is_empty() || !vx.inn.is_empty())
    }

    /// Iterate the ids of all live vertices, ascending.
    pub fn live_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).filter(move |&v| self.is_live(v))
    }

    /// Out-neighbors of `v`, sorted ascending. Empty for tombstones and
    /// out-of-range ids.
    pub fn out_edges(&self, v: VertexId) -> &[VertexId] {
        self.vertices.get(v).map_or(&[][..], |vx| &vx.out)
    }

    /// In-neighbors of `v`, sorted ascending.
    pub fn in_edges(&self, v: VertexId) -> &[VertexId] {
        self.vertices.get(v).map_or(&[][..], |vx| &vx.inn)
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.out_edges(v).len()
    }

    pub fn in_degree(&self, v: VertexId) -> usize {
        self.in_edges(v).len()
    }

    /// Computes in **O(log deg)** time.
    pub fn contains_edge(&self, u: VertexId, v: VertexId) -> bool {
        self.vertices
            .get(u)
            .map_or(false, |vx| vx.out.binary_search(&v).is_ok())
    }

    /// Add the edge `u -> v`, keeping both adjacency lists sorted.
    ///
    /// Returns `true` if the edge was added; `false` for self loops and
    /// duplicates. Grows the slot space when `u` or `v` is out of range.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> bool {
        if u == v {
            return false;
        }
        let needed = u.max(v) + 1;
        if needed > self.vertices.len() {
            self.vertices.resize_with(needed, Vertex::default);
        }
        let pos = match self.vertices[u].out.binary_search(&v) {
            Ok(_) => return false,
            Err(i) => i,
        };
        let u_was_live = self.is_live(u);
        let v_was_live = self.is_live(v);
        self.vertices[u].out.insert(pos, v);
        let pos = self.vertices[v]
            .inn
            .binary_search(&u)
            .expect_err("out/in lists out of sync");
        self.vertices[v].inn.insert(pos, u);
        self.edge_count += 1;
        if !u_was_live {
            self.live_count += 1;
        }
        if !v_was_live {
            self.live_count += 1;
        }
        true
    }

    /// Remove the edge `u -> v`. Returns `true` if it was present.
    pub fn remove_edge(&mut self, u: VertexId, v: VertexId) -> bool {
        if u >= self.vertices.len() || v >= self.vertices.len() {
            return false;
        }
        let pos = match self.vertices[u].out.binary_search(&v) {
            Ok(i) => i,
            Err(_) => return false,
        };
        self.vertices[u].out.remove(pos);
        let pos = self.vertices[v]
            .inn
            .binary_search(&u)
            .expect("out/in lists out of sync");
        self.vertices[v].inn.remove(pos);
        self.edge_count -= 1;
        if !self.is_live(u) {
            self.live_count -= 1;
        }
        if !self.is_live(v) {
            self.live_count -= 1;
        }
        true
    }

    /// Remove every edge incident to `v`, turning the slot into a
    /// tombstone. The slot itself stays addressable.
    pub fn remove_vertex(&mut self, v: VertexId) {
        if !self.is_live(v) {
            return;
        }
        for u in std::mem::take(&mut self.vertices[v].out) {
            let pos = self.vertices[u]
                .inn
                .binary_search(&v)
                .expect("out/in lists out of sync");
            self.vertices[u].inn.remove(pos);
            self.edge_count -= 1;
            if !self.is_live(u) {
                self.live_count -= 1;
            }
        }
        for u in std::mem::take(&mut self.vertices[v].inn) {
            let pos = self.vertices[u]
                .out
                .binary_search(&v)
                .expect("out/in lists out of sync");
            self.vertices[u].out.remove(pos);
            self.edge_count -= 1;
            if !self.is_live(u) {
                self.live_count -= 1;
            }
        }
        self.live_count -= 1;
    }

    pub fn partition(&self, v: VertexId) -> PartitionId {
        self.vertices.get(v).map_or(UNASSIGNED, |vx| vx.partition)
    }

    /// Tag `v` with a partition id. Returns `false` if `v` is out of
    /// range.
    pub fn set_partition(&mut self, v: VertexId, partition: PartitionId) -> bool {
        match self.vertices.get_mut(v) {
            Some(vx) => {
                vx.partition = partition;
                true
            }
            None => false,
        }
    }

    /// Grow the slot space to at least `n` slots.
    pub fn ensure_slots(&mut self, n: usize) {
        if n > self.vertices.len() {
            self.vertices.resize_with(n, Vertex::default);
        }
    }

    /// Whether the graph contains a directed cycle, by Kahn's algorithm
    /// over the live vertices.
    pub fn is_cyclic(&self) -> bool {
        let n = self.vertices.len();
        let mut in_deg = vec![0usize; n];
        let mut live = 0usize;
        for v in 0..n {
            if !self.is_live(v) {
                continue;
            }
            live += 1;
            in_deg[v] = self.in_degree(v);
        }
        let mut queue: Vec<VertexId> = (0..n)
            .filter(|&v| self.is_live(v) && in_deg[v] == 0)
            .collect();
        let mut seen = 0usize;
        while let Some(v) = queue.pop() {
            seen += 1;
            for &w in self.out_edges(v) {
                in_deg[w] -= 1;
                if in_deg[w] == 0 {
                    queue.push(w);
                }
            }
        }
        seen != live
    }
}
