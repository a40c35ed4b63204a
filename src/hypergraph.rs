//! The hypergraph engine: reduces k-intersection reachability to
//! disjoint-set or bottleneck-label queries on weighted graphs derived
//! from pairwise hyperedge intersections.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::cache;
use crate::error::{Error, Result};
use crate::unionfind::UnionFind;
use crate::util::intersection_size;
use crate::weighted::{Weight, WeightedGraph};
use crate::weighted_pll::WeightedPll;
use crate::VertexId;

/// Highest intersection-size layer that gets its own derived weighted
/// graph; queries beyond it clamp to this layer.
pub const MAX_INTERSECTION_SIZE: Weight = 10;

/// A hypergraph over a dense vertex-id space.
///
/// `hyperedges[e]` is the (ascending, deduplicated) vertex list of
/// hyperedge `e`; `incidence[v]` lists the hyperedges containing `v`.
///
/// [`Hypergraph::build_indices`] derives, possibly from cache: a
/// vertex-level disjoint set, one weighted graph per intersection layer
/// `k ∈ 1..=MAX_INTERSECTION_SIZE` over hyperedge ids (edge weight =
/// exact intersection size), and a bottleneck-label index over the
/// single all-intersections graph. Any mutation invalidates the derived
/// structures until the next build.
#[derive(Debug, Default)]
pub struct Hypergraph {
    hyperedges: Vec<Vec<VertexId>>,
    incidence: Vec<Vec<usize>>,
    vertex_ds: Option<UnionFind>,
    intersections: Vec<(usize, usize, Weight)>,
    layers: Vec<WeightedGraph>,
    pll_graph: Option<WeightedGraph>,
    pll: Option<WeightedPll>,
    fresh: bool,
}

impl Hypergraph {
    pub fn new() -> Self {
        Hypergraph::default()
    }

    pub fn with_capacity(vertices: usize, hyperedges: usize) -> Self {
        let mut hg = Hypergraph::default();
        hg.incidence.reserve(vertices);
        hg.hyperedges.reserve(hyperedges);
        hg
    }

    /// Load from the hypergraph text format: one hyperedge per line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let edges = crate::io::read_hyperedges(path)?;
        let mut hg = Hypergraph::with_capacity(0, edges.len());
        for edge in &edges {
            for &v in edge {
                hg.ensure_vertex(v);
            }
        }
        for edge in edges {
            hg.add_hyperedge(&edge)?;
        }
        Ok(hg)
    }

    pub fn vertex_count(&self) -> usize {
        self.incidence.len()
    }

    pub fn hyperedge_count(&self) -> usize {
        self.hyperedges.len()
    }

    /// Append a vertex, returning its id.
    pub fn add_vertex(&mut self) -> VertexId {
        self.invalidate();
        self.incidence.push(Vec::new());
        self.incidence.len() - 1
    }

    /// Append `count` vertices, returning the new vertex count.
    pub fn add_vertices(&mut self, count: usize) -> usize {
        self.invalidate();
        self.incidence
            .resize_with(self.incidence.len() + count, Vec::new);
        self.incidence.len()
    }

    /// Make sure `vertex` is addressable, extending the space if needed.
    pub fn ensure_vertex(&mut self, vertex: VertexId) {
        if vertex >= self.incidence.len() {
            self.invalidate();
            self.incidence.resize_with(vertex + 1, Vec::new);
        }
    }

    /// Add a hyperedge over existing vertices, returning its id. The
    /// vertex list is stored sorted and deduplicated.
    pub fn add_hyperedge(&mut self, vertices: &[VertexId]) -> Result<usize> {
        for &v in vertices {
            if v >= self.incidence.len() {
                return Err(Error::InvalidVertex(v));
            }
        }
        self.invalidate();
        let mut members = vertices.to_vec();
        members.sort_unstable();
        members.dedup();
        let edge_id = self.hyperedges.len();
        for &v in &members {
            self.incidence[v].push(edge_id);
        }
        self.hyperedges.push(members);
        Ok(edge_id)
    }

    /// Place a hyperedge at a caller-chosen id, extending the edge and
    /// vertex spaces as needed. An existing edge at that id is
    /// replaced.
    pub fn add_hyperedge_with_id(&mut self, edge_id: usize, vertices: &[VertexId]) -> Result<()> {
        self.invalidate();
        if edge_id >= self.hyperedges.len() {
            self.hyperedges.resize_with(edge_id + 1, Vec::new);
        }
        for old in std::mem::take(&mut self.hyperedges[edge_id]) {
            self.incidence[old].retain(|&e| e != edge_id);
        }
        let mut members = vertices.to_vec();
        members.sort_unstable();
        members.dedup();
        for &v in &members {
            self.ensure_vertex(v);
            self.incidence[v].push(edge_id);
        }
        self.hyperedges[edge_id] = members;
        Ok(())
    }

    /// Remove `vertex` from every hyperedge containing it, leaving a
    /// logical hole at its id.
    pub fn remove_vertex(&mut self, vertex: VertexId) -> Result<()> {
        if vertex >= self.incidence.len() {
            return Err(Error::InvalidVertex(vertex));
        }
        self.invalidate();
        for edge_id in std::mem::take(&mut self.incidence[vertex]) {
            self.hyperedges[edge_id].retain(|&v| v != vertex);
        }
        Ok(())
    }

    pub fn hyperedge(&self, edge_id: usize) -> Result<&[VertexId]> {
        self.hyperedges
            .get(edge_id)
            .map(Vec::as_slice)
            .ok_or(Error::InvalidVertex(edge_id))
    }

    /// Hyperedges containing `vertex`.
    pub fn incident_edges(&self, vertex: VertexId) -> Result<&[usize]> {
        self.incidence
            .get(vertex)
            .map(Vec::as_slice)
            .ok_or(Error::InvalidVertex(vertex))
    }

    /// Number of vertices shared by two hyperedges.
    pub fn intersection_size(&self, e1: usize, e2: usize) -> Result<usize> {
        Ok(intersection_size(self.hyperedge(e1)?, self.hyperedge(e2)?))
    }

    // Every mutation drops the derived artefacts' claim to freshness,
    // including the memoized intersection list.
    fn invalidate(&mut self) {
        self.fresh = false;
        self.intersections.clear();
    }

    // Vertex-level disjoint set: all vertices of a hyperedge share a
    // component.
    fn derive_vertex_ds(&self) -> UnionFind {
        let mut ds = UnionFind::new(self.incidence.len());
        for edge in &self.hyperedges {
            let Some(&first) = edge.first() else { continue };
            for &v in &edge[1..] {
                ds.union(first, v);
            }
        }
        ds.compress();
        ds
    }

    /// Compute all hyperedge pairs with a non-empty intersection,
    /// splitting the outer index range over the worker pool; thread
    /// results merge under one mutex at the join point and the merged
    /// list is sorted for reproducibility.
    fn compute_intersections(&mut self) {
        if !self.intersections.is_empty() {
            return;
        }
        let ne = self.hyperedges.len();
        let workers = rayon::current_num_threads().max(1);
        let chunk = ne.div_ceil(workers).max(1);
        let merged: Mutex<Vec<(usize, usize, Weight)>> = Mutex::new(Vec::new());

        (0..workers).into_par_iter().for_each(|w| {
            let start = w * chunk;
            let end = ((w + 1) * chunk).min(ne);
            let mut local = Vec::new();
            for i in start..end {
                if self.hyperedges[i].is_empty() {
                    continue;
                }
                for j in (i + 1)..ne {
                    if self.hyperedges[j].is_empty() {
                        continue;
                    }
                    let size = intersection_size(&self.hyperedges[i], &self.hyperedges[j]);
                    if size > 0 {
                        local.push((i, j, size as Weight));
                    }
                }
            }
            merged
                .lock()
                .expect("intersection merge mutex poisoned")
                .extend(local);
        });

        let mut intersections = merged
            .into_inner()
            .expect("intersection merge mutex poisoned");
        intersections.sort_unstable();
        debug!(
            "{} intersecting hyperedge pairs of {} hyperedges",
            intersections.len(),
            ne
        );
        self.intersections = intersections;
    }

    /// Offline phase: derive the vertex disjoint set, the layered
    /// weighted graphs and the bottleneck-label index, loading and
    /// saving each artefact through the cache prefix when one is given.
    /// Cache failures degrade to a rebuild, never an error.
    pub fn build_indices(&mut self, cache_prefix: Option<&Path>) -> Result<()> {
        self.build_vertex_ds(cache_prefix);
        self.build_layers(cache_prefix);
        self.build_pll(cache_prefix)?;
        self.fresh = true;
        Ok(())
    }

    fn build_vertex_ds(&mut self, cache_prefix: Option<&Path>) {
        if let Some(prefix) = cache_prefix {
            let path = cache::with_suffix(prefix, cache::SUFFIX_HG_DS);
            match cache::load_disjoint_sets(&path, self.incidence.len()) {
                Ok(ds) => {
                    info!("hypergraph disjoint set loaded from {}", path.display());
                    self.vertex_ds = Some(ds);
                    return;
                }
                Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("hypergraph disjoint set cache unusable: {e}"),
            }
        }
        let ds = self.derive_vertex_ds();
        if let Some(prefix) = cache_prefix {
            let path = cache::with_suffix(prefix, cache::SUFFIX_HG_DS);
            if let Err(e) = cache::save_disjoint_sets(&path, &ds) {
                warn!("failed to save hypergraph disjoint set: {e}");
            }
        }
        self.vertex_ds = Some(ds);
    }

    fn build_layers(&mut self, cache_prefix: Option<&Path>) {
        let ne = self.hyperedges.len();

        // All layers restore from cache or none do; a partial set would
        // mix epochs.
        if let Some(prefix) = cache_prefix {
            let mut loaded = Vec::with_capacity(MAX_INTERSECTION_SIZE as usize);
            for k in 1..=MAX_INTERSECTION_SIZE {
                let adj_path = cache::with_suffix(prefix, &cache::layer_adj_suffix(k));
                let ds_path = cache::with_suffix(prefix, &cache::layer_ds_suffix(k));
                let mut layer = WeightedGraph::new(ne, k);
                let restored = layer
                    .load_adjacency(&adj_path)
                    .and_then(|()| layer.load_disjoint_sets(&ds_path));
                match restored {
                    Ok(()) => loaded.push(layer),
                    Err(e) => {
                        debug!("layer k={k} cache miss: {e}");
                        break;
                    }
                }
            }
            if loaded.len() == MAX_INTERSECTION_SIZE as usize {
                info!("layered graphs loaded from cache prefix");
                self.layers = loaded;
                return;
            }
        }

        self.compute_intersections();
        let mut layers = Vec::with_capacity(MAX_INTERSECTION_SIZE as usize);
        for k in 1..=MAX_INTERSECTION_SIZE {
            let mut layer = WeightedGraph::new(ne, k);
            for &(i, j, size) in &self.intersections {
                if size >= k {
                    layer
                        .add_edge(i, j, size)
                        .expect("hyperedge ids bound the layer");
                }
            }
            layer.build_indices();
            if let Some(prefix) = cache_prefix {
                let adj_path = cache::with_suffix(prefix, &cache::layer_adj_suffix(k));
                let ds_path = cache::with_suffix(prefix, &cache::layer_ds_suffix(k));
                if let Err(e) = layer
                    .save_adjacency(&adj_path)
                    .and_then(|()| layer.save_disjoint_sets(&ds_path))
                {
                    warn!("failed to save layer k={k}: {e}");
                }
            }
            layers.push(layer);
        }
        self.layers = layers;
    }

    fn build_pll(&mut self, cache_prefix: Option<&Path>) -> Result<()> {
        let ne = self.hyperedges.len();
        let mut pll_graph = WeightedGraph::new(ne, 1);
        self.compute_intersections();
        for &(i, j, size) in &self.intersections {
            pll_graph.add_edge(i, j, size)?;
        }

        if let Some(prefix) = cache_prefix {
            let path = cache::with_suffix(prefix, cache::SUFFIX_PLL);
            match WeightedPll::load(&path, ne) {
                Ok(pll) => {
                    info!("bottleneck labels loaded from {}", path.display());
                    self.pll_graph = Some(pll_graph);
                    self.pll = Some(pll);
                    return Ok(());
                }
                Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("bottleneck label cache unusable: {e}"),
            }
        }

        let pll = WeightedPll::build(&pll_graph);
        if let Some(prefix) = cache_prefix {
            let path = cache::with_suffix(prefix, cache::SUFFIX_PLL);
            if let Err(e) = pll.save(&path) {
                warn!("failed to save bottleneck labels: {e}");
            }
        }
        self.pll_graph = Some(pll_graph);
        self.pll = Some(pll);
        Ok(())
    }

    fn check_vertex(&self, v: VertexId) -> Result<()> {
        if v >= self.incidence.len() {
            return Err(Error::InvalidVertex(v));
        }
        Ok(())
    }

    // Effective layer: `k <= 0` behaves as 1, `k > MAX` clamps to MAX.
    fn clamp_layer(k: Weight) -> Weight {
        k.clamp(1, MAX_INTERSECTION_SIZE)
    }

    /// Unconstrained reachability: whether `u` and `v` share a
    /// connected component of the vertex-level disjoint set. Falls back
    /// to a freshly derived set when the index is stale.
    pub fn reachable(&self, u: VertexId, v: VertexId) -> Result<bool> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        if u == v {
            return Ok(true);
        }
        match (&self.vertex_ds, self.fresh) {
            (Some(ds), true) => Ok(ds.find(u) == ds.find(v)),
            _ => {
                let ds = self.derive_vertex_ds();
                Ok(ds.find(u) == ds.find(v))
            }
        }
    }

    // Shared-edge shortcut used by every constrained query path.
    fn share_hyperedge(&self, u: VertexId, v: VertexId) -> bool {
        self.incidence[u]
            .iter()
            .any(|e| self.incidence[v].contains(e))
    }

    /// k-intersection reachability through the layered disjoint sets:
    /// true when `u` and `v` share a hyperedge, or when some incident
    /// hyperedge pair is connected in layer `clamp(k, 1, MAX)`.
    pub fn reachable_via_layers(&self, u: VertexId, v: VertexId, k: Weight) -> Result<bool> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        if u == v {
            return Ok(true);
        }
        let layer_k = Self::clamp_layer(k);
        let layer = self
            .layers
            .get(layer_k as usize - 1)
            .ok_or(Error::LayerUnavailable(layer_k))?;
        if self.incidence[u].is_empty() || self.incidence[v].is_empty() {
            return Ok(false);
        }
        if self.share_hyperedge(u, v) {
            return Ok(true);
        }
        for &eu in &self.incidence[u] {
            for &ev in &self.incidence[v] {
                if layer.ds_reachable(eu, ev)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// k-intersection reachability through the bottleneck labels; the
    /// label index answers any `k` exactly.
    pub fn reachable_via_pll(&self, u: VertexId, v: VertexId, k: Weight) -> Result<bool> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        if u == v {
            return Ok(true);
        }
        let pll = self.pll.as_ref().ok_or(Error::LayerUnavailable(1))?;
        if self.incidence[u].is_empty() || self.incidence[v].is_empty() {
            return Ok(false);
        }
        if self.share_hyperedge(u, v) {
            return Ok(true);
        }
        let threshold = k.max(1);
        for &eu in &self.incidence[u] {
            for &ev in &self.incidence[v] {
                if pll.reachable(eu, ev, threshold)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Bidirectional BFS over the vertex–hyperedge structure. With
    /// `min_intersection > 0`, consecutive hyperedges along each
    /// direction of the search must share at least that many vertices.
    pub fn reachable_bibfs(
        &self,
        source: VertexId,
        target: VertexId,
        min_intersection: Weight,
    ) -> Result<bool> {
        self.check_vertex(source)?;
        self.check_vertex(target)?;
        if source == target {
            return Ok(true);
        }
        if self.share_hyperedge(source, target) {
            return Ok(true);
        }
        if min_intersection == 0 {
            return Ok(self.plain_bibfs(source, target));
        }
        Ok(self.constrained_bibfs(source, target, min_intersection))
    }

    // Frontier-meeting BFS where a step is "hop through any shared
    // hyperedge".
    fn plain_bibfs(&self, source: VertexId, target: VertexId) -> bool {
        let n = self.incidence.len();
        let mut fwd_seen = vec![false; n];
        let mut bwd_seen = vec![false; n];
        let mut fwd = VecDeque::new();
        let mut bwd = VecDeque::new();
        fwd_seen[source] = true;
        fwd.push_back(source);
        bwd_seen[target] = true;
        bwd.push_back(target);

        while !fwd.is_empty() && !bwd.is_empty() {
            let level = fwd.len();
            for _ in 0..level {
                let Some(current) = fwd.pop_front() else { break };
                for &edge_id in &self.incidence[current] {
                    for &next in &self.hyperedges[edge_id] {
                        if bwd_seen[next] {
                            return true;
                        }
                        if !fwd_seen[next] {
                            fwd_seen[next] = true;
                            fwd.push_back(next);
                        }
                    }
                }
            }

            let level = bwd.len();
            for _ in 0..level {
                let Some(current) = bwd.pop_front() else { break };
                for &edge_id in &self.incidence[current] {
                    for &next in &self.hyperedges[edge_id] {
                        if fwd_seen[next] {
                            return true;
                        }
                        if !bwd_seen[next] {
                            bwd_seen[next] = true;
                            bwd.push_back(next);
                        }
                    }
                }
            }
        }
        false
    }

    // Constrained variant: tracks the hyperedge each vertex was entered
    // through; a hyperedge is taken only when it intersects the
    // predecessor hyperedge in at least `min_intersection` vertices,
    // and a meeting point counts only when its two entry hyperedges
    // also satisfy the constraint.
    fn constrained_bibfs(&self, source: VertexId, target: VertexId, min_intersection: Weight) -> bool {
        let n = self.incidence.len();
        let mut pred_fwd: Vec<Option<usize>> = vec![None; n];
        let mut pred_bwd: Vec<Option<usize>> = vec![None; n];
        let mut dist_fwd = vec![usize::MAX; n];
        let mut dist_bwd = vec![usize::MAX; n];
        let mut fwd = VecDeque::new();
        let mut bwd = VecDeque::new();
        dist_fwd[source] = 0;
        fwd.push_back(source);
        dist_bwd[target] = 0;
        bwd.push_back(target);

        let mut meetings: Vec<(usize, usize)> = Vec::new();
        while !fwd.is_empty() && !bwd.is_empty() {
            let level = fwd.len();
            for _ in 0..level {
                let Some(current) = fwd.pop_front() else { break };
                for &edge_id in &self.incidence[current] {
                    let admissible = match pred_fwd[current] {
                        None => true,
                        Some(pred) => {
                            intersection_size(&self.hyperedges[pred], &self.hyperedges[edge_id])
                                >= min_intersection as usize
                        }
                    };
                    if !admissible {
                        continue;
                    }
                    for &next in &self.hyperedges[edge_id] {
                        if dist_fwd[next] == usize::MAX {
                            dist_fwd[next] = dist_fwd[current] + 1;
                            pred_fwd[next] = Some(edge_id);
                            fwd.push_back(next);
                            if dist_bwd[next] != usize::MAX {
                                if let Some(bwd_edge) = pred_bwd[next] {
                                    meetings.push((edge_id, bwd_edge));
                                }
                            }
                        }
                    }
                }
            }

            let level = bwd.len();
            for _ in 0..level {
                let Some(current) = bwd.pop_front() else { break };
                for &edge_id in &self.incidence[current] {
                    let admissible = match pred_bwd[current] {
                        None => true,
                        Some(pred) => {
                            intersection_size(&self.hyperedges[pred], &self.hyperedges[edge_id])
                                >= min_intersection as usize
                        }
                    };
                    if !admissible {
                        continue;
                    }
                    for &next in &self.hyperedges[edge_id] {
                        if dist_bwd[next] == usize::MAX {
                            dist_bwd[next] = dist_bwd[current] + 1;
                            pred_bwd[next] = Some(edge_id);
                            bwd.push_back(next);
                            if dist_fwd[next] != usize::MAX {
                                if let Some(fwd_edge) = pred_fwd[next] {
                                    meetings.push((fwd_edge, edge_id));
                                }
                            }
                        }
                    }
                }
            }

            for &(fwd_edge, bwd_edge) in &meetings {
                if fwd_edge == bwd_edge
                    || intersection_size(&self.hyperedges[fwd_edge], &self.hyperedges[bwd_edge])
                        >= min_intersection as usize
                {
                    return true;
                }
            }
            meetings.clear();
        }
        false
    }

    /// Connected components of the vertex-level disjoint set, each
    /// listed ascending. Works from the built index when fresh and from
    /// a derived one otherwise.
    pub fn components(&self) -> Vec<Vec<VertexId>> {
        let derived;
        let ds = match (&self.vertex_ds, self.fresh) {
            (Some(ds), true) => ds,
            _ => {
                derived = self.derive_vertex_ds();
                &derived
            }
        };
        let n = self.incidence.len();
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
        components
    }

    /// The derived weighted graph of layer `k`, when built.
    pub fn layer(&self, k: Weight) -> Result<&WeightedGraph> {
        let layer_k = Self::clamp_layer(k);
        self.layers
            .get(layer_k as usize - 1)
            .ok_or(Error::LayerUnavailable(layer_k))
    }

    /// The bottleneck-label index, when built.
    pub fn labels(&self) -> Option<&WeightedPll> {
        self.pll.as_ref()
    }
}
