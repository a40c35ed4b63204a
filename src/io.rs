//! Readers for the plain-text interchange formats: edge lists,
//! hypergraph files, simplex datasets, equivalence mappings and
//! partition assignments.
//!
//! All readers share the same tolerance: a line that does not parse as
//! its expected shape is skipped with a warning, never an error.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;

use crate::error::Result;
use crate::graph::DiGraph;
use crate::{PartitionId, VertexId};

/// Read a directed edge list: one `u v` pair per line, whitespace
/// separated, edge direction `u -> v`.
pub fn read_edge_list(path: &Path) -> Result<Vec<(VertexId, VertexId)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut edges = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut it = line.split_whitespace();
        match (
            it.next().and_then(|t| t.parse::<VertexId>().ok()),
            it.next().and_then(|t| t.parse::<VertexId>().ok()),
        ) {
            (Some(u), Some(v)) => edges.push((u, v)),
            _ => warn!(
                "{}:{}: skipping line that does not parse as two vertex ids",
                path.display(),
                line_no + 1
            ),
        }
    }
    Ok(edges)
}

/// Read an edge list straight into an adjacency graph.
pub fn read_graph(path: &Path) -> Result<DiGraph> {
    Ok(DiGraph::from_edges(read_edge_list(path)?))
}

/// Read a hypergraph file: one hyperedge per line as whitespace
/// separated vertex ids. Empty lines yield no hyperedge.
pub fn read_hyperedges(path: &Path) -> Result<Vec<Vec<VertexId>>> {
    let reader = BufReader::new(File::open(path)?);
    let mut hyperedges = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let mut edge = Vec::new();
        let mut bad = false;
        for tok in line.split_whitespace() {
            match tok.parse::<VertexId>() {
                Ok(v) => edge.push(v),
                Err(_) => {
                    bad = true;
                    break;
                }
            }
        }
        if bad {
            warn!(
                "{}:{}: skipping hyperedge line with a non-integer token",
                path.display(),
                line_no + 1
            );
            continue;
        }
        if !edge.is_empty() {
            hyperedges.push(edge);
        }
    }
    Ok(hyperedges)
}

/// Convert a simplex dataset (`*-nverts` + `*-simplices` companion
/// files) into the hypergraph file format: the i-th line of the output
/// holds the next `nverts[i]` vertex ids from the simplices file.
pub fn convert_simplex_dataset(
    nverts_path: &Path,
    simplices_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let nverts = BufReader::new(File::open(nverts_path)?);
    let mut simplices = BufReader::new(File::open(simplices_path)?).lines();
    let mut out = BufWriter::new(File::create(output_path)?);

    for (line_no, line) in nverts.lines().enumerate() {
        let line = line?;
        let count: usize = match line.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                warn!(
                    "{}:{}: skipping simplex with a non-integer vertex count",
                    nverts_path.display(),
                    line_no + 1
                );
                continue;
            }
        };
        for i in 0..count {
            let vertex = simplices.next().transpose()?.ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "simplices file ended before its nverts companion",
                )
            })?;
            if i > 0 {
                write!(out, " ")?;
            }
            write!(out, "{}", vertex.trim())?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Read an equivalence mapping: one `node equivalence_id` line per
/// entry.
pub fn read_equivalence(path: &Path) -> Result<Vec<(VertexId, VertexId)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut pairs = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut it = line.split_whitespace();
        match (
            it.next().and_then(|t| t.parse::<VertexId>().ok()),
            it.next().and_then(|t| t.parse::<VertexId>().ok()),
        ) {
            (Some(node), Some(class)) => pairs.push((node, class)),
            _ => warn!(
                "{}:{}: skipping malformed equivalence line",
                path.display(),
                line_no + 1
            ),
        }
    }
    Ok(pairs)
}

/// Read a partition assignment file: one `node partition_id` line per
/// entry.
pub fn read_partition_assignments(path: &Path) -> Result<Vec<(VertexId, PartitionId)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut pairs = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut it = line.split_whitespace();
        match (
            it.next().and_then(|t| t.parse::<VertexId>().ok()),
            it.next().and_then(|t| t.parse::<PartitionId>().ok()),
        ) {
            (Some(node), Some(partition)) => pairs.push((node, partition)),
            _ => warn!(
                "{}:{}: skipping malformed partition assignment",
                path.display(),
                line_no + 1
            ),
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn edge_list_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "edges.txt", "0 1\n% comment\n1 2\nnot numbers\n2\n3 4\n");
        let edges = read_edge_list(&path).unwrap();
        assert_eq!(edges, vec![(0, 1), (1, 2), (3, 4)]);
    }

    #[test]
    fn hyperedges_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "hg.txt", "0 1 2 3\n2 3 4\n\n4 5 6\n");
        let edges = read_hyperedges(&path).unwrap();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0], vec![0, 1, 2, 3]);
        assert_eq!(edges[2], vec![4, 5, 6]);
    }

    #[test]
    fn simplex_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let nverts = write_file(&dir, "x-nverts", "3\n2\n");
        let simplices = write_file(&dir, "x-simplices", "7\n8\n9\n1\n2\n");
        let out = dir.path().join("x-hg.txt");
        convert_simplex_dataset(&nverts, &simplices, &out).unwrap();
        let edges = read_hyperedges(&out).unwrap();
        assert_eq!(edges, vec![vec![7, 8, 9], vec![1, 2]]);
    }

    #[test]
    fn partition_assignments_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "parts.txt", "0 2\n1 2\n2 -1\nbad line\n");
        let pairs = read_partition_assignments(&path).unwrap();
        assert_eq!(pairs, vec![(0, 2), (1, 2), (2, -1)]);
    }
}
