//! The partitioning strategies, modeled as a sealed enumeration with a
//! uniform contract: tag every live vertex with a partition id, then
//! derive the partition artefacts.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::partition::PartitionManager;
use crate::ratio;
use crate::unionfind::UnionFind;
use crate::{PartitionId, VertexId};

/// Which partitioning strategy the dispatcher runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionerKind {
    /// Local-move modularity optimization.
    Louvain,
    /// Assignment produced by an external Infomap run, read from the
    /// configured assignment file.
    Infomap,
    /// Uniform random assignment over `num_partitions` ids.
    Random,
    /// Weakly-connected components, then randomized-contraction splits
    /// of oversized components.
    MultiCut,
    /// Local refinement of the within-partition reachable-pair
    /// objective.
    ReachRatio,
    /// Depth-bounded traversal from high-degree roots.
    Traverse,
    /// Assignment read verbatim from the configured assignment file.
    Import,
}

impl FromStr for PartitionerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Louvain" => Ok(PartitionerKind::Louvain),
            "Infomap" => Ok(PartitionerKind::Infomap),
            "Random" => Ok(PartitionerKind::Random),
            "MultiCut" => Ok(PartitionerKind::MultiCut),
            "ReachRatio" => Ok(PartitionerKind::ReachRatio),
            "Traverse" => Ok(PartitionerKind::Traverse),
            "Import" => Ok(PartitionerKind::Import),
            other => Err(Error::UnsupportedPartitioner(other.to_string())),
        }
    }
}

/// Strategy knobs shared by all partitioners.
#[derive(Debug, Clone)]
pub struct PartitionOptions {
    /// Target partition count for the random strategy.
    pub num_partitions: usize,
    /// RNG seed for the randomized strategies; entropy when unset.
    pub seed: Option<u64>,
    /// Partition assignment file for `Import` and `Infomap`.
    pub assignment_path: Option<PathBuf>,
    /// Traversal depth bound for `Traverse`.
    pub max_depth: usize,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        PartitionOptions {
            num_partitions: 8,
            seed: None,
            assignment_path: None,
            max_depth: 3,
        }
    }
}

impl PartitionerKind {
    /// Run the strategy over the manager's graph and rebuild the
    /// partition artefacts.
    pub fn partition(self, pm: &mut PartitionManager, opts: &PartitionOptions) -> Result<()> {
        match self {
            PartitionerKind::Louvain => louvain(pm),
            PartitionerKind::Infomap | PartitionerKind::Import => import(pm, opts)?,
            PartitionerKind::Random => random(pm, opts),
            PartitionerKind::MultiCut => multicut(pm, opts),
            PartitionerKind::ReachRatio => reach_ratio(pm, opts),
            PartitionerKind::Traverse => traverse(pm, opts),
        }
        pm.build_partition_graph();
        Ok(())
    }
}

fn rng_from(opts: &PartitionOptions) -> StdRng {
    match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn random(pm: &mut PartitionManager, opts: &PartitionOptions) {
    let mut rng = rng_from(opts);
    let high = opts.num_partitions.max(1) as PartitionId;
    let vertices: Vec<VertexId> = pm.graph().live_vertices().collect();
    for v in vertices {
        let partition = rng.gen_range(1..=high);
        pm.set_partition(v, partition);
    }
}

fn import(pm: &mut PartitionManager, opts: &PartitionOptions) -> Result<()> {
    let path = opts.assignment_path.as_ref().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no partition assignment file configured",
        ))
    })?;
    for (node, partition) in crate::io::read_partition_assignments(path)? {
        if !pm.set_partition(node, partition) {
            warn!("partition assignment for unknown vertex {node} ignored");
        }
    }
    Ok(())
}

fn traverse(pm: &mut PartitionManager, opts: &PartitionOptions) {
    let g = pm.graph();
    let bound = g.vertex_bound();
    let mut order: Vec<VertexId> = g.live_vertices().collect();
    order.sort_by_key(|&v| (Reverse(g.out_degree(v) + g.in_degree(v)), v));

    let mut assignment: Vec<Option<PartitionId>> = vec![None; bound];
    let mut stack: Vec<(VertexId, usize)> = Vec::new();
    for &root in &order {
        if assignment[root].is_some() {
            continue;
        }
        stack.clear();
        stack.push((root, 0));
        while let Some((v, depth)) = stack.pop() {
            if depth > opts.max_depth || assignment[v].is_some() {
                continue;
            }
            assignment[v] = Some(root as PartitionId);
            for &n in g.out_edges(v).iter().chain(g.in_edges(v)) {
                if assignment[n].is_none() {
                    stack.push((n, depth + 1));
                }
            }
        }
    }

    for (v, partition) in assignment.into_iter().enumerate() {
        if let Some(partition) = partition {
            pm.set_partition(v, partition);
        }
    }
}

fn louvain(pm: &mut PartitionManager) {
    let g = pm.graph();
    let bound = g.vertex_bound();
    let m = g.edge_count() as f64;
    if m == 0.0 {
        return;
    }
    let degree = |v: VertexId| (g.out_degree(v) + g.in_degree(v)) as f64;

    let mut community: Vec<PartitionId> = (0..bound).map(|v| v as PartitionId).collect();
    let mut sum_tot: BTreeMap<PartitionId, f64> = BTreeMap::new();
    for v in g.live_vertices() {
        sum_tot.insert(v as PartitionId, degree(v));
    }

    const MAX_PASSES: usize = 10;
    for _ in 0..MAX_PASSES {
        let mut improved = false;
        for v in g.live_vertices() {
            let current = community[v];
            let k_v = degree(v);

            // Links from v into each neighboring community.
            let mut links: BTreeMap<PartitionId, f64> = BTreeMap::new();
            for &n in g.out_edges(v).iter().chain(g.in_edges(v)) {
                *links.entry(community[n]).or_insert(0.0) += 1.0;
            }

            *sum_tot.get_mut(&current).expect("community total missing") -= k_v;

            let gain_for = |c: PartitionId| {
                let l = links.get(&c).copied().unwrap_or(0.0);
                let tot = sum_tot.get(&c).copied().unwrap_or(0.0);
                l / m - k_v * tot / (2.0 * m * m)
            };
            let mut best = current;
            let mut best_gain = gain_for(current);
            for &c in links.keys() {
                let gain = gain_for(c);
                if gain > best_gain + f64::EPSILON {
                    best = c;
                    best_gain = gain;
                }
            }

            *sum_tot.entry(best).or_insert(0.0) += k_v;
            if best != current {
                community[v] = best;
                improved = true;
            }
        }
        if !improved {
            break;
        }
    }

    let assignments: Vec<(VertexId, PartitionId)> =
        g.live_vertices().map(|v| (v, community[v])).collect();
    for (v, c) in assignments {
        pm.set_partition(v, c);
    }
}

// Constants carried from the multi-cut heuristic: bounds on partition
// count, split size and acceptable cut width.
const MULTICUT_MAX_PARTITIONS: usize = 6;
const MULTICUT_MIN_SIZE: usize = 20;
const MULTICUT_MAX_CUT_EDGES: usize = 20;
const MULTICUT_TRIALS: usize = 50;

fn multicut(pm: &mut PartitionManager, opts: &PartitionOptions) {
    let mut rng = rng_from(opts);
    let g = pm.graph();
    let bound = g.vertex_bound();

    // Weakly-connected components seed the partitioning.
    let mut uf = UnionFind::new(bound);
    for u in g.live_vertices() {
        for &v in g.out_edges(u) {
            uf.union(u, v);
        }
    }
    let mut assignment: Vec<PartitionId> = (0..bound)
        .map(|v| uf.find(v) as PartitionId)
        .collect();
    let mut partition_count = {
        let mut roots: Vec<PartitionId> =
            g.live_vertices().map(|v| assignment[v]).collect();
        roots.sort_unstable();
        roots.dedup();
        roots.len()
    };

    while partition_count < MULTICUT_MAX_PARTITIONS {
        // Largest splittable partition.
        let mut sizes: BTreeMap<PartitionId, usize> = BTreeMap::new();
        for v in g.live_vertices() {
            *sizes.entry(assignment[v]).or_insert(0) += 1;
        }
        let Some((&target, _)) = sizes
            .iter()
            .filter(|&(_, &size)| size >= 2 * MULTICUT_MIN_SIZE)
            .max_by_key(|&(&p, &size)| (size, Reverse(p)))
        else {
            break;
        };

        let members: Vec<VertexId> = g
            .live_vertices()
            .filter(|&v| assignment[v] == target)
            .collect();
        let internal: Vec<(VertexId, VertexId)> = members
            .iter()
            .flat_map(|&u| {
                g.out_edges(u)
                    .iter()
                    .filter(|&&v| assignment[v] == target)
                    .map(move |&v| (u, v))
            })
            .collect();
        if internal.is_empty() {
            break;
        }

        // Karger-style randomized contraction down to two groups; keep
        // the narrowest cut over the trial budget.
        let mut best: Option<(usize, UnionFind)> = None;
        for _ in 0..MULTICUT_TRIALS {
            let mut contract = UnionFind::new(bound);
            let mut groups = members.len();
            let mut budget = internal.len() * 4;
            while groups > 2 && budget > 0 {
                budget -= 1;
                let &(u, v) = &internal[rng.gen_range(0..internal.len())];
                if contract.union(u, v) {
                    groups -= 1;
                }
            }
            if groups != 2 {
                continue;
            }
            let cut = internal
                .iter()
                .filter(|&&(u, v)| !contract.equiv(u, v))
                .count();
            if best.as_ref().map_or(true, |&(best_cut, _)| cut < best_cut) {
                best = Some((cut, contract));
            }
        }
        let Some((cut, contract)) = best else { break };
        if cut > MULTICUT_MAX_CUT_EDGES {
            break;
        }

        let side_root = contract.find(members[0]);
        let moved: Vec<VertexId> = members
            .iter()
            .copied()
            .filter(|&v| contract.find(v) != side_root)
            .collect();
        if moved.is_empty() || moved.len() == members.len() {
            break;
        }
        let fresh = moved[0] as PartitionId;
        for &v in &moved {
            assignment[v] = fresh;
        }
        partition_count += 1;
    }

    let assignments: Vec<(VertexId, PartitionId)> =
        g.live_vertices().map(|v| (v, assignment[v])).collect();
    for (v, p) in assignments {
        pm.set_partition(v, p);
    }
}

// Penalty multiplier balancing within-partition reachability against
// the number of cross-partition edges a vertex carries.
const REACH_RATIO_BETA: f64 = 5.0;

fn reach_ratio(pm: &mut PartitionManager, opts: &PartitionOptions) {
    // Seed with the traversal strategy, then refine with local moves.
    traverse(pm, opts);

    let order: Vec<VertexId> = {
        let g = pm.graph();
        let mut order: Vec<VertexId> = g.live_vertices().collect();
        order.sort_by_key(|&v| (Reverse(g.out_degree(v) + g.in_degree(v)), v));
        order
    };

    for v in order {
        let old = pm.graph().partition(v);
        let mut candidates: Vec<PartitionId> = {
            let g = pm.graph();
            g.out_edges(v)
                .iter()
                .chain(g.in_edges(v))
                .map(|&n| g.partition(n))
                .filter(|&p| p != old)
                .collect()
        };
        candidates.sort_unstable();
        candidates.dedup();

        for candidate in candidates {
            let before = move_objective(pm.graph(), v, old, candidate);
            pm.set_partition(v, candidate);
            let after = move_objective(pm.graph(), v, old, candidate);
            if after < before {
                break;
            }
            pm.set_partition(v, old);
        }
    }
}

// Objective around a candidate move of `v`: reachable pairs confined to
// the two affected partitions, plus a penalty on v's cross edges.
fn move_objective(
    g: &crate::graph::DiGraph,
    v: VertexId,
    old: PartitionId,
    new: PartitionId,
) -> f64 {
    let pairs =
        ratio::count_partition_pairs(g, old) as f64 + ratio::count_partition_pairs(g, new) as f64;
    let own = g.partition(v);
    let cross = g
        .out_edges(v)
        .iter()
        .chain(g.in_edges(v))
        .filter(|&&n| g.partition(n) != own)
        .count() as f64;
    pairs + REACH_RATIO_BETA * cross
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DiGraph;
    use crate::partition::PartitionManager;

    fn sample_graph() -> DiGraph {
        // Two dense clusters joined by one edge.
        DiGraph::from_edges([
            (0, 1),
            (1, 2),
            (2, 0),
            (0, 2),
            (3, 4),
            (4, 5),
            (5, 3),
            (3, 5),
            (2, 3),
        ])
    }

    #[test]
    fn names_parse() {
        for name in [
            "Louvain",
            "Infomap",
            "Random",
            "MultiCut",
            "ReachRatio",
            "Traverse",
            "Import",
        ] {
            assert!(name.parse::<PartitionerKind>().is_ok());
        }
        assert!(matches!(
            "Metis".parse::<PartitionerKind>(),
            Err(Error::UnsupportedPartitioner(_))
        ));
    }

    #[test]
    fn every_strategy_tags_all_live_vertices() {
        let dir = tempfile::tempdir().unwrap();
        let assignment = dir.path().join("parts.txt");
        std::fs::write(&assignment, "0 1\n1 1\n2 1\n3 2\n4 2\n5 2\n").unwrap();
        let opts = PartitionOptions {
            num_partitions: 3,
            seed: Some(7),
            assignment_path: Some(assignment),
            ..PartitionOptions::default()
        };
        for kind in [
            PartitionerKind::Louvain,
            PartitionerKind::Infomap,
            PartitionerKind::Random,
            PartitionerKind::MultiCut,
            PartitionerKind::ReachRatio,
            PartitionerKind::Traverse,
            PartitionerKind::Import,
        ] {
            let mut pm = PartitionManager::new(sample_graph());
            kind.partition(&mut pm, &opts).unwrap();
            for v in 0..6 {
                assert_ne!(
                    pm.graph().partition(v),
                    crate::UNASSIGNED,
                    "{kind:?} left vertex {v} unassigned"
                );
            }
        }
    }

    #[test]
    fn import_without_path_errors() {
        let mut pm = PartitionManager::new(sample_graph());
        let err = PartitionerKind::Import
            .partition(&mut pm, &PartitionOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn louvain_groups_clusters() {
        let mut pm = PartitionManager::new(sample_graph());
        PartitionerKind::Louvain
            .partition(&mut pm, &PartitionOptions::default())
            .unwrap();
        let g = pm.graph();
        assert_eq!(g.partition(0), g.partition(1));
        assert_eq!(g.partition(1), g.partition(2));
        assert_eq!(g.partition(3), g.partition(4));
        assert_eq!(g.partition(4), g.partition(5));
    }

    #[test]
    fn random_is_seed_reproducible() {
        let opts = PartitionOptions {
            seed: Some(42),
            ..PartitionOptions::default()
        };
        let mut a = PartitionManager::new(sample_graph());
        let mut b = PartitionManager::new(sample_graph());
        PartitionerKind::Random.partition(&mut a, &opts).unwrap();
        PartitionerKind::Random.partition(&mut b, &opts).unwrap();
        for v in 0..6 {
            assert_eq!(a.graph().partition(v), b.graph().partition(v));
        }
    }
}
