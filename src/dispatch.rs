//! The partitioned query dispatcher: an offline phase partitions the
//! graph and gives every partition the per-partition index its size and
//! reachability density call for; the online phase routes each query
//! within or across partitions.

use std::path::PathBuf;

use hashbrown::HashMap;
use log::debug;

use crate::algorithm::{DenseMatrix, ReachIndex, UnreachablePairs};
use crate::bibfs;
use crate::error::Result;
use crate::graph::DiGraph;
use crate::partition::partitioner::{PartitionOptions, PartitionerKind};
use crate::partition::PartitionManager;
use crate::pll::Pll;
use crate::ratio;
use crate::{PartitionId, VertexId, UNASSIGNED};

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Partitioning strategy for the offline phase.
    pub partitioner: PartitionerKind,
    /// Below this live-vertex count a partition stores the dense
    /// reachability bitmatrix.
    pub num_vertices_t: usize,
    /// At or above `num_vertices_t`, a partition whose reachability
    /// ratio is below this threshold stores 2-hop labels; otherwise it
    /// stores the unreachable-pair index.
    pub ratio_t: f64,
    /// Whether per-partition indices are consulted at all; with `false`
    /// every within-partition query is a plain restricted search.
    pub is_index: bool,
    /// Optional vertex → equivalence-class mapping applied before
    /// partitioning, for graphs condensed from their strongly connected
    /// components.
    pub equivalence_path: Option<PathBuf>,
    /// Strategy knobs passed through to the partitioner.
    pub partition: PartitionOptions,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            partitioner: PartitionerKind::Traverse,
            num_vertices_t: 32,
            ratio_t: 0.5,
            is_index: true,
            equivalence_path: None,
            partition: PartitionOptions::default(),
        }
    }
}

/// Partitioned reachability search over a directed graph.
///
/// [`PartitionedSearch::build`] runs the offline phase; afterwards
/// [`PartitionedSearch::reach`] answers queries without touching the
/// configuration again. Build errors abort; query errors degrade to
/// `false`.
#[derive(Debug)]
pub struct PartitionedSearch {
    pm: PartitionManager,
    options: SearchOptions,
    indexes: HashMap<PartitionId, ReachIndex>,
}

impl PartitionedSearch {
    pub fn new(graph: DiGraph, options: SearchOptions) -> Self {
        PartitionedSearch {
            pm: PartitionManager::new(graph),
            options,
            indexes: HashMap::new(),
        }
    }

    pub fn manager(&self) -> &PartitionManager {
        &self.pm
    }

    /// Offline phase: load the equivalence mapping if configured, run
    /// the partitioner, then build one index per partition:
    /// bitmatrix below `num_vertices_t` live vertices, 2-hop labels
    /// below `ratio_t`, the unreachable-pair index otherwise.
    pub fn build(&mut self) -> Result<()> {
        if let Some(path) = self.options.equivalence_path.clone() {
            self.pm.read_equivalence_info(&path)?;
        }
        self.options
            .partitioner
            .partition(&mut self.pm, &self.options.partition)?;

        self.indexes.clear();
        if !self.options.is_index {
            return Ok(());
        }
        let partitions: Vec<PartitionId> = self
            .pm
            .partitions()
            .filter(|&p| p >= 0)
            .collect();
        for partition in partitions {
            let sub = match self.pm.subgraph(partition) {
                Some(sub) if sub.vertex_count() > 1 => sub,
                _ => continue,
            };
            let index = if sub.vertex_count() < self.options.num_vertices_t {
                ReachIndex::DenseMatrix(DenseMatrix::build(sub))
            } else if ratio::reach_ratio(sub) < self.options.ratio_t {
                ReachIndex::TwoHop(Pll::build(sub)?)
            } else {
                ReachIndex::UnreachablePairs(UnreachablePairs::build(sub))
            };
            self.indexes.insert(partition, index);
        }
        debug!("per-partition indices built: {}", self.indexes.len());
        Ok(())
    }

    /// Online reachability query.
    pub fn reach(&self, u: VertexId, v: VertexId) -> bool {
        let u = self.pm.representative(u);
        let v = self.pm.representative(v);
        if u == v {
            return true;
        }
        let g = self.pm.graph();
        if !g.is_live(u) || !g.is_live(v) {
            return false;
        }
        if g.out_degree(u) == 0 || g.in_degree(v) == 0 {
            return false;
        }

        let pu = g.partition(u);
        let pv = g.partition(v);
        if pu == pv {
            if self.within_partition(u, v, pu) {
                return true;
            }
            // Same-partition vertices may still be linked only through
            // other partitions; fall back to a search over the whole
            // graph.
            return bibfs::reachable(g, u, v);
        }
        if pu < 0 || pv < 0 {
            return false;
        }
        self.cross_partitions(u, pu, v, pv)
    }

    // Within-partition lookup: the partition's index when one exists,
    // otherwise a search restricted to the induced subgraph.
    fn within_partition(&self, u: VertexId, v: VertexId, partition: PartitionId) -> bool {
        if u == v {
            return true;
        }
        let g = self.pm.graph();
        if g.partition(u) != g.partition(v) {
            return false;
        }
        if g.out_degree(u) == 0 || g.in_degree(v) == 0 {
            return false;
        }
        let sub = self.pm.subgraph(partition);
        match (self.indexes.get(&partition), sub) {
            (Some(index), Some(sub)) => index.query(sub, u, v),
            (None, Some(sub)) => bibfs::reachable(sub, u, v),
            _ => false,
        }
    }

    // Find a partition path `pu -> … -> pv` in the meta-graph, then
    // chain the recorded cross-partition edges along it.
    fn cross_partitions(&self, u: VertexId, pu: PartitionId, v: VertexId, pv: PartitionId) -> bool {
        let Some(path) = bibfs::find_path(
            self.pm.part_graph(),
            pu as VertexId,
            pv as VertexId,
            UNASSIGNED,
        ) else {
            return false;
        };
        let path: Vec<PartitionId> = path.into_iter().map(|p| p as PartitionId).collect();
        self.partition_chain(u, &path, v)
    }

    // Walk one hop of the partition path: for every recorded edge
    // `(a, b)` between the first two partitions, require `u` to reach
    // `a` inside the current partition, then either finish inside the
    // target partition or recurse from `b`. The first complete chain
    // wins; a failing edge falls through to the next.
    fn partition_chain(&self, u: VertexId, path: &[PartitionId], target: VertexId) -> bool {
        debug_assert_eq!(self.pm.graph().partition(u), path[0]);
        let (current, next) = (path[0], path[1]);
        let Some(pe) = self.pm.partition_edges(current, next) else {
            return false;
        };
        let target_partition = self.pm.graph().partition(target);
        for &(a, b) in &pe.original_edges {
            if !self.within_partition(u, a, current) {
                continue;
            }
            if next == target_partition {
                if self.within_partition(b, target, next) {
                    return true;
                }
            } else if self.partition_chain(b, &path[1..], target) {
                return true;
            }
        }
        false
    }
}
