//! Partition bookkeeping: the vertex → partition mapping, the
//! cross-partition edge registry, the partition meta-graph and the
//! per-partition induced subgraphs.

pub mod partitioner;

use std::path::Path;

use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::error::{Error, Result};
use crate::graph::DiGraph;
use crate::io;
use crate::{PartitionId, VertexId};

/// The recorded connection between an ordered pair of partitions: the
/// original cross-partition edges (deduplicated) and their count.
#[derive(Debug, Clone, Default)]
pub struct PartitionEdge {
    pub original_edges: Vec<(VertexId, VertexId)>,
    pub edge_count: usize,
}

/// Owns the partitioned view of a graph.
///
/// Derived artefacts (the mapping, the registry, the meta-graph
/// `part_g` whose vertices are partition ids, and the induced
/// subgraphs) are rebuilt by [`PartitionManager::build_partition_graph`]
/// and marked stale by any partition change; call
/// [`PartitionManager::ensure_fresh`] before querying them.
#[derive(Debug)]
pub struct PartitionManager {
    graph: DiGraph,
    mapping: IndexMap<PartitionId, IndexSet<VertexId>>,
    partition_adjacency: HashMap<(PartitionId, PartitionId), PartitionEdge>,
    part_g: DiGraph,
    subgraphs: HashMap<PartitionId, DiGraph>,
    equivalence: Option<Vec<VertexId>>,
    dirty: bool,
}

impl PartitionManager {
    pub fn new(graph: DiGraph) -> Self {
        PartitionManager {
            graph,
            mapping: IndexMap::new(),
            partition_adjacency: HashMap::new(),
            part_g: DiGraph::new(),
            subgraphs: HashMap::new(),
            equivalence: None,
            dirty: true,
        }
    }

    pub fn graph(&self) -> &DiGraph {
        &self.graph
    }

    /// Mutable access to the underlying graph. Any use marks the
    /// derived artefacts stale.
    pub fn graph_mut(&mut self) -> &mut DiGraph {
        self.dirty = true;
        &mut self.graph
    }

    pub fn set_partition(&mut self, v: VertexId, partition: PartitionId) -> bool {
        self.dirty = true;
        self.graph.set_partition(v, partition)
    }

    pub fn partition_of(&self, v: VertexId) -> PartitionId {
        self.graph.partition(v)
    }

    /// The partition meta-graph: one vertex per partition id, one edge
    /// `pu -> pv` when any cross-partition edge goes that way.
    pub fn part_graph(&self) -> &DiGraph {
        &self.part_g
    }

    pub fn subgraph(&self, partition: PartitionId) -> Option<&DiGraph> {
        self.subgraphs.get(&partition)
    }

    pub fn partitions(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.mapping.keys().copied()
    }

    pub fn vertices_in(&self, partition: PartitionId) -> Option<&IndexSet<VertexId>> {
        self.mapping.get(&partition)
    }

    pub fn partition_edges(&self, pu: PartitionId, pv: PartitionId) -> Option<&PartitionEdge> {
        self.partition_adjacency.get(&(pu, pv))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the derived artefacts if anything changed since the last
    /// build.
    pub fn ensure_fresh(&mut self) {
        if self.dirty {
            self.build_partition_graph();
        }
    }

    /// Record every cross-partition edge `(u, v)` under
    /// `(partition(u), partition(v))`, deduplicated by pair. Edges
    /// touching an unassigned endpoint are ignored.
    pub fn update_partition_connections(&mut self) {
        self.partition_adjacency.clear();
        for u in 0..self.graph.vertex_bound() {
            let pu = self.graph.partition(u);
            if pu < 0 || !self.graph.is_live(u) {
                continue;
            }
            for &v in self.graph.out_edges(u) {
                let pv = self.graph.partition(v);
                if pv < 0 || pv == pu {
                    continue;
                }
                let entry = self.partition_adjacency.entry((pu, pv)).or_default();
                if !entry.original_edges.contains(&(u, v)) {
                    entry.original_edges.push((u, v));
                    entry.edge_count += 1;
                }
            }
        }
    }

    /// Derive every partition artefact from the current tags: the
    /// mapping, the cross-partition registry, the meta-graph and the
    /// induced subgraphs (internal edges only).
    pub fn build_partition_graph(&mut self) {
        self.mapping.clear();
        for v in 0..self.graph.vertex_bound() {
            if self.graph.is_live(v) {
                self.mapping
                    .entry(self.graph.partition(v))
                    .or_default()
                    .insert(v);
            }
        }

        self.update_partition_connections();

        self.part_g = DiGraph::new();
        for &(pu, pv) in self.partition_adjacency.keys() {
            self.part_g.add_edge(pu as VertexId, pv as VertexId);
        }

        self.subgraphs.clear();
        for (&partition, members) in &self.mapping {
            let mut sub = DiGraph::new();
            for &u in members {
                for &v in self.graph.out_edges(u) {
                    if self.graph.partition(v) == partition {
                        sub.add_edge(u, v);
                    }
                }
            }
            self.subgraphs.insert(partition, sub);
        }

        self.dirty = false;
        debug!(
            "partition artefacts rebuilt: {} partitions, {} cross links",
            self.mapping.len(),
            self.partition_adjacency.len()
        );
    }

    /// Move `v` from partition `old` to `new`, rewriting the incident
    /// cross-partition entries and the meta-graph edges whose counts
    /// transition to or from zero. Subgraphs are left stale.
    pub fn move_vertex(&mut self, v: VertexId, old: PartitionId, new: PartitionId) -> Result<()> {
        if self.graph.partition(v) != old {
            return Err(Error::InvalidVertex(v));
        }
        if old == new || old < 0 || new < 0 {
            return Ok(());
        }
        self.graph.set_partition(v, new);

        if let Some(members) = self.mapping.get_mut(&old) {
            members.swap_remove(&v);
            if members.is_empty() {
                self.mapping.swap_remove(&old);
            }
        }
        self.mapping.entry(new).or_default().insert(v);

        let out: Vec<VertexId> = self.graph.out_edges(v).to_vec();
        for x in out {
            let px = self.graph.partition(x);
            if px < 0 {
                continue;
            }
            if px != old {
                self.unrecord_edge((old, px), (v, x));
            }
            if px != new {
                self.record_edge((new, px), (v, x));
            }
        }
        let inn: Vec<VertexId> = self.graph.in_edges(v).to_vec();
        for x in inn {
            let px = self.graph.partition(x);
            if px < 0 {
                continue;
            }
            if px != old {
                self.unrecord_edge((px, old), (x, v));
            }
            if px != new {
                self.record_edge((px, new), (x, v));
            }
        }

        // Subgraphs for both partitions are stale now.
        self.dirty = true;
        Ok(())
    }

    fn record_edge(&mut self, key: (PartitionId, PartitionId), edge: (VertexId, VertexId)) {
        let entry = self.partition_adjacency.entry(key).or_default();
        if entry.original_edges.is_empty() {
            self.part_g.add_edge(key.0 as VertexId, key.1 as VertexId);
        }
        if !entry.original_edges.contains(&edge) {
            entry.original_edges.push(edge);
            entry.edge_count += 1;
        }
    }

    fn unrecord_edge(&mut self, key: (PartitionId, PartitionId), edge: (VertexId, VertexId)) {
        let Some(entry) = self.partition_adjacency.get_mut(&key) else {
            return;
        };
        if let Some(pos) = entry.original_edges.iter().position(|&e| e == edge) {
            entry.original_edges.remove(pos);
            entry.edge_count -= 1;
        }
        if entry.edge_count == 0 {
            self.partition_adjacency.remove(&key);
            self.part_g.remove_edge(key.0 as VertexId, key.1 as VertexId);
        }
    }

    /// Load a vertex → equivalence-class table. Vertices beyond the
    /// current slot space extend it; unlisted vertices map to
    /// themselves.
    pub fn read_equivalence_info(&mut self, path: &Path) -> Result<()> {
        let pairs = io::read_equivalence(path)?;
        let needed = pairs
            .iter()
            .map(|&(node, class)| node.max(class) + 1)
            .max()
            .unwrap_or(0);
        self.graph.ensure_slots(needed);

        let bound = self.graph.vertex_bound();
        let mut table: Vec<VertexId> = (0..bound).collect();
        for (node, class) in pairs {
            table[node] = class;
        }
        self.equivalence = Some(table);
        Ok(())
    }

    /// The equivalence-class representative of `v`; identity without a
    /// loaded mapping.
    pub fn representative(&self, v: VertexId) -> VertexId {
        match &self.equivalence {
            Some(table) => table.get(v).copied().unwrap_or(v),
            None => v,
        }
    }

    pub fn has_equivalence(&self) -> bool {
        self.equivalence.is_some()
    }
}
