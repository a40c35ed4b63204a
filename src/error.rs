//! Error types shared across the crate.

use std::path::PathBuf;

use crate::VertexId;

/// Errors raised by builders, loaders and validating query paths.
///
/// Reachability queries on the top-level dispatcher never surface these;
/// they degrade to `false` and log the cause. Cache errors degrade to a
/// full rebuild at the call site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The vertex id is out of range, or the operation requires a live
    /// vertex and the slot is a tombstone.
    #[error("vertex {0} is out of range or not live")]
    InvalidVertex(VertexId),

    /// 2-hop label construction was attempted on a cyclic graph.
    #[error("graph contains a cycle; 2-hop labels require a DAG")]
    GraphHasCycle,

    /// A layered weighted graph was requested for a `k` that was never
    /// built.
    #[error("weighted layer k={0} has not been built")]
    LayerUnavailable(u32),

    /// A cache record does not match the live structure it would restore.
    #[error("cache file {}: expected {expected} entries, found {found}", path.display())]
    CacheMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// A file violated its grammar after the leading size handshake.
    #[error("corrupt input in {} at line {line}: {reason}", path.display())]
    CorruptInput {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The configured partitioner name is not known.
    #[error("unsupported partitioner `{0}`")]
    UnsupportedPartitioner(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
