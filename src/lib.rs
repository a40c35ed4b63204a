//! **reachgraph** answers reachability queries on large directed graphs
//! and on hypergraphs under an intersection-size constraint.
//!
//! Naïve per-query BFS does not scale to graphs with millions of
//! vertices, so the crate is organized around an offline phase that
//! builds indices (possibly restoring them from an on-disk cache) and
//! an online phase that answers queries from those indices:
//!
//! - [`csr::CsrGraph`] and [`graph::DiGraph`] store the graph packed or
//!   mutable, both with dual sorted adjacency and partition tags.
//! - [`pll::Pll`] builds directed 2-hop IN/OUT landmark labels over a
//!   DAG; [`weighted_pll::WeightedPll`] builds bottleneck labels over
//!   an undirected weighted graph ([`weighted::WeightedGraph`]).
//! - [`dispatch::PartitionedSearch`] partitions the graph
//!   ([`partition`]) and routes every query through per-partition
//!   indices ([`algorithm::ReachIndex`]) and the partition meta-graph.
//! - [`hypergraph::Hypergraph`] reduces k-intersection reachability to
//!   disjoint-set or bottleneck-label queries on derived weighted
//!   graphs.
//! - [`cache`] persists every rebuildable artefact as a plain-text
//!   record; a stale or damaged record degrades to a rebuild.
//!
//! # Example
//!
//! ```
//! use reachgraph::graph::DiGraph;
//! use reachgraph::pll::Pll;
//!
//! let g = DiGraph::from_edges([(0, 1), (1, 2), (1, 3), (0, 4), (4, 3)]);
//! let labels = Pll::build(&g).unwrap();
//! assert!(labels.query(0, 3));
//! assert!(!labels.query(3, 0));
//! ```

pub mod algorithm;
pub mod bibfs;
pub mod cache;
pub mod csr;
pub mod dispatch;
mod error;
pub mod filters;
pub mod graph;
pub mod hypergraph;
pub mod io;
pub mod partition;
pub mod pll;
pub mod ratio;
pub mod unionfind;
mod util;
pub mod weighted;
pub mod weighted_pll;

pub use error::{Error, Result};

/// Dense vertex identifier. Ids without incident edges are tombstones:
/// addressable, skipped by iteration.
pub type VertexId = usize;

/// Partition tag attached to a vertex; [`UNASSIGNED`] when the vertex
/// has not been partitioned.
pub type PartitionId = i32;

/// The partition id of unpartitioned vertices.
pub const UNASSIGNED: PartitionId = -1;
