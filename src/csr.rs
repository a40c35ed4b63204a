//! Compressed Sparse Row (CSR) storage for a directed graph, with dual
//! out/in rows, partition tags and an incremental edit protocol.

use crate::error::{Error, Result};
use crate::graph::DiGraph;
use crate::{PartitionId, VertexId, UNASSIGNED};

const BINARY_SEARCH_CUTOFF: usize = 32;

/// A packed directed graph using **O(|E| + |V|)** space.
///
/// Both the out-edge and the in-edge sides are stored: `out_row` /
/// `in_row` hold prefix sums sized one past the slot count, and
/// `out_col` / `in_col` hold neighbor columns **sorted ascending within
/// each row**. The two sides are dual: every `(u, v)` present under
/// `u`'s out-row has a matching `u` under `v`'s in-row.
///
/// Slots with no incident edges are tombstones; they stay addressable
/// but iteration skips them. Self loops are never stored.
///
/// Single-edge edits shift the column arrays and are linear in `|E|`;
/// prefer a bulk rebuild over long edit sequences.
#[derive(Debug, Clone, Default)]
pub struct CsrGraph {
    out_row: Vec<usize>,
    out_col: Vec<VertexId>,
    in_row: Vec<usize>,
    in_col: Vec<VertexId>,
    partitions: Vec<PartitionId>,
    edge_count: usize,
    vertex_count: usize,
}

impl CsrGraph {
    /// Create an empty store with `n` tombstone slots.
    pub fn with_slots(n: usize) -> Self {
        CsrGraph {
            out_row: vec![0; n + 1],
            out_col: Vec::new(),
            in_row: vec![0; n + 1],
            in_col: Vec::new(),
            partitions: vec![UNASSIGNED; n],
            edge_count: 0,
            vertex_count: 0,
        }
    }

    /// Build from an edge list. Self loops and duplicate edges are
    /// dropped. Computes in **O(|E| log |E| + |V|)** time.
    pub fn from_edge_list(edges: &[(VertexId, VertexId)]) -> Self {
        let mut kept: Vec<(VertexId, VertexId)> =
            edges.iter().copied().filter(|&(u, v)| u != v).collect();
        kept.sort_unstable();
        kept.dedup();

        let slots = kept
            .iter()
            .map(|&(u, v)| u.max(v) + 1)
            .max()
            .unwrap_or(0);
        let mut csr = CsrGraph::with_slots(slots);

        let mut out_counts = vec![0usize; slots];
        let mut in_counts = vec![0usize; slots];
        for &(u, v) in &kept {
            out_counts[u] += 1;
            in_counts[v] += 1;
        }
        for i in 0..slots {
            csr.out_row[i + 1] = csr.out_row[i] + out_counts[i];
            csr.in_row[i + 1] = csr.in_row[i] + in_counts[i];
        }

        csr.out_col = vec![0; kept.len()];
        csr.in_col = vec![0; kept.len()];
        let mut out_off = vec![0usize; slots];
        let mut in_off = vec![0usize; slots];
        for &(u, v) in &kept {
            csr.out_col[csr.out_row[u] + out_off[u]] = v;
            out_off[u] += 1;
            csr.in_col[csr.in_row[v] + in_off[v]] = u;
            in_off[v] += 1;
        }
        // The scatter preserves source order for out rows; in rows still
        // need sorting.
        for i in 0..slots {
            let (s, e) = (csr.in_row[i], csr.in_row[i + 1]);
            csr.in_col[s..e].sort_unstable();
            let (s, e) = (csr.out_row[i], csr.out_row[i + 1]);
            csr.out_col[s..e].sort_unstable();
        }

        csr.edge_count = kept.len();
        csr.vertex_count = (0..slots).filter(|&v| csr.is_live(v)).count();
        csr
    }

    /// Build from an adjacency graph, carrying over partition tags.
    pub fn from_graph(g: &DiGraph) -> Self {
        let mut edges = Vec::with_capacity(g.edge_count());
        for u in g.live_vertices() {
            for &v in g.out_edges(u) {
                edges.push((u, v));
            }
        }
        let mut csr = CsrGraph::from_edge_list(&edges);
        for v in 0..csr.slots().min(g.vertex_bound()) {
            csr.partitions[v] = g.partition(v);
        }
        csr
    }

    /// Number of addressable slots (one past the maximum vertex id).
    pub fn slots(&self) -> usize {
        self.partitions.len()
    }

    /// The maximum addressable vertex id (inclusive), or `None` for an
    /// empty store.
    pub fn max_vertex_id(&self) -> Option<VertexId> {
        self.slots().checked_sub(1)
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of live (non-tombstone) slots.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Whether the slot exists and has an edge on either side.
    pub fn is_live(&self, v: VertexId) -> bool {
        v < self.slots()
            && (self.out_row[v] != self.out_row[v + 1] || self.in_row[v] != self.in_row[v + 1])
    }

    pub fn live_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.slots()).filter(move |&v| self.is_live(v))
    }

    /// Out-neighbors of `v`, sorted ascending. Computes in **O(1)**.
    pub fn out_edges(&self, v: VertexId) -> &[VertexId] {
        if v >= self.slots() {
            return &[];
        }
        &self.out_col[self.out_row[v]..self.out_row[v + 1]]
    }

    /// In-neighbors of `v`, sorted ascending. Computes in **O(1)**.
    pub fn in_edges(&self, v: VertexId) -> &[VertexId] {
        if v >= self.slots() {
            return &[];
        }
        &self.in_col[self.in_row[v]..self.in_row[v + 1]]
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.out_edges(v).len()
    }

    pub fn in_degree(&self, v: VertexId) -> usize {
        self.in_edges(v).len()
    }

    /// Computes in **O(log deg)** time.
    pub fn contains_edge(&self, u: VertexId, v: VertexId) -> bool {
        Self::find_pos(self.out_edges(u), v).is_ok()
    }

    // Position of `x` in a sorted row, or the insertion point. Linear
    // scan below the cutoff, binary search above it.
    fn find_pos(row: &[VertexId], x: VertexId) -> std::result::Result<usize, usize> {
        if row.len() < BINARY_SEARCH_CUTOFF {
            for (i, &elt) in row.iter().enumerate() {
                if elt == x {
                    return Ok(i);
                } else if elt > x {
                    return Err(i);
                }
            }
            Err(row.len())
        } else {
            row.binary_search(&x)
        }
    }

    /// Insert the edge `u -> v` at its sorted position in both column
    /// arrays, shifting tails and bumping the following row pointers.
    ///
    /// Returns `Ok(false)` for self loops and existing edges. Both
    /// endpoints must be in range.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> Result<bool> {
        let slots = self.slots();
        if u >= slots {
            return Err(Error::InvalidVertex(u));
        }
        if v >= slots {
            return Err(Error::InvalidVertex(v));
        }
        if u == v {
            return Ok(false);
        }
        let out_pos = match Self::find_pos(self.out_edges(u), v) {
            Ok(_) => return Ok(false),
            Err(i) => self.out_row[u] + i,
        };
        let u_was_live = self.is_live(u);
        let v_was_live = self.is_live(v);

        self.out_col.insert(out_pos, v);
        for r in &mut self.out_row[u + 1..] {
            *r += 1;
        }
        let in_pos = match Self::find_pos(self.in_edges(v), u) {
            Ok(_) => unreachable!("out/in columns out of sync"),
            Err(i) => self.in_row[v] + i,
        };
        self.in_col.insert(in_pos, u);
        for r in &mut self.in_row[v + 1..] {
            *r += 1;
        }

        self.edge_count += 1;
        if !u_was_live {
            self.vertex_count += 1;
        }
        if !v_was_live {
            self.vertex_count += 1;
        }
        Ok(true)
    }

    /// Remove the edge `u -> v` with the symmetric dual deletion.
    ///
    /// Returns `Ok(false)` if the edge does not exist.
    pub fn remove_edge(&mut self, u: VertexId, v: VertexId) -> Result<bool> {
        let slots = self.slots();
        if u >= slots {
            return Err(Error::InvalidVertex(u));
        }
        if v >= slots {
            return Err(Error::InvalidVertex(v));
        }
        let out_pos = match Self::find_pos(self.out_edges(u), v) {
            Ok(i) => self.out_row[u] + i,
            Err(_) => return Ok(false),
        };
        self.out_col.remove(out_pos);
        for r in &mut self.out_row[u + 1..] {
            *r -= 1;
        }
        let in_pos = Self::find_pos(self.in_edges(v), u)
            .expect("out/in columns out of sync")
            + self.in_row[v];
        self.in_col.remove(in_pos);
        for r in &mut self.in_row[v + 1..] {
            *r -= 1;
        }
        self.edge_count -= 1;
        if !self.is_live(u) {
            self.vertex_count -= 1;
        }
        if !self.is_live(v) {
            self.vertex_count -= 1;
        }
        Ok(true)
    }

    /// Delete every `(v, *)` and `(*, v)` edge, leaving `v` a tombstone.
    /// Shrinks the slot space when the tail slots become tombstones.
    ///
    /// Returns `Ok(false)` if `v` was already a tombstone.
    pub fn remove_vertex(&mut self, v: VertexId) -> Result<bool> {
        if v >= self.slots() {
            return Err(Error::InvalidVertex(v));
        }
        if !self.is_live(v) {
            return Ok(false);
        }
        let outs: Vec<VertexId> = self.out_edges(v).to_vec();
        for t in outs {
            self.remove_edge(v, t)?;
        }
        let ins: Vec<VertexId> = self.in_edges(v).to_vec();
        for s in ins {
            self.remove_edge(s, v)?;
        }

        // Shrink trailing tombstones away.
        let mut slots = self.slots();
        while slots > 0 && !self.is_live(slots - 1) {
            slots -= 1;
        }
        self.out_row.truncate(slots + 1);
        self.in_row.truncate(slots + 1);
        self.partitions.truncate(slots);
        Ok(true)
    }

    pub fn partition(&self, v: VertexId) -> PartitionId {
        self.partitions.get(v).copied().unwrap_or(UNASSIGNED)
    }

    pub fn set_partition(&mut self, v: VertexId, partition: PartitionId) -> bool {
        match self.partitions.get_mut(v) {
            Some(p) => {
                *p = partition;
                true
            }
            None => false,
        }
    }

    /// Total bytes held by the backing arrays (capacities, not lengths).
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;
        (self.out_col.capacity() + self.in_col.capacity()) * size_of::<VertexId>()
            + (self.out_row.capacity() + self.in_row.capacity()) * size_of::<usize>()
            + self.partitions.capacity() * size_of::<PartitionId>()
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let n = self.slots();
        assert_eq!(self.out_row.len(), n + 1);
        assert_eq!(self.in_row.len(), n + 1);
        assert_eq!(self.out_row[n], self.edge_count);
        assert_eq!(self.in_row[n], self.edge_count);
        assert_eq!(self.out_col.len(), self.edge_count);
        assert_eq!(self.in_col.len(), self.edge_count);
        assert!(self.out_row.windows(2).all(|w| w[0] <= w[1]));
        assert!(self.in_row.windows(2).all(|w| w[0] <= w[1]));
        for v in 0..n {
            assert!(self.out_edges(v).windows(2).all(|w| w[0] < w[1]));
            assert!(self.in_edges(v).windows(2).all(|w| w[0] < w[1]));
            for &t in self.out_edges(v) {
                assert_ne!(v, t);
                assert!(Self::find_pos(self.in_edges(t), v).is_ok());
            }
            for &s in self.in_edges(v) {
                assert!(Self::find_pos(self.out_edges(s), v).is_ok());
            }
        }
    }
}
