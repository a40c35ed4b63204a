//! Plain-text cache records for rebuildable index artefacts.
//!
//! Every record opens with the element count of the structure it
//! restores; loaders check that count against the live graph and report
//! [`Error::CacheMismatch`] when it differs, so callers fall back to a
//! full rebuild instead of using stale data. Malformed body lines are
//! skipped with a warning, matching the tolerant reader used for edge
//! lists.
//!
//! Record grammars:
//!
//! - weighted labels: `N`, then per vertex `u count lm1 bw1 lm2 bw2 ...`
//! - disjoint set: `n`, then `n` lines `parent rank`
//! - weighted adjacency: `N`, then per vertex `u nbr1 w1 nbr2 w2 ...`
//! - directed 2-hop labels: `N`, then `N` IN lines `u count lm ...`,
//!   then `N` OUT lines in the same shape
//!
//! Save paths are derived from a caller-supplied prefix plus a suffix
//! unique per artefact (`_pll.idx`, `_lds_k<i>_adj.idx`,
//! `_lds_k<i>_ds.idx`, `_hg_ds.idx`, `_hop.idx`).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Error, Result};
use crate::unionfind::UnionFind;
use crate::weighted::Weight;
use crate::VertexId;

pub const SUFFIX_PLL: &str = "_pll.idx";
pub const SUFFIX_HOP: &str = "_hop.idx";
pub const SUFFIX_HG_DS: &str = "_hg_ds.idx";

pub fn layer_adj_suffix(k: Weight) -> String {
    format!("_lds_k{k}_adj.idx")
}

pub fn layer_ds_suffix(k: Weight) -> String {
    format!("_lds_k{k}_ds.idx")
}

/// Append an artefact suffix to a path prefix.
pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut os = prefix.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

fn corrupt(path: &Path, line: usize, reason: impl Into<String>) -> Error {
    Error::CorruptInput {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

// First line of every record: the element count, checked against the
// structure being restored.
fn read_header(
    lines: &mut impl Iterator<Item = std::io::Result<String>>,
    path: &Path,
    expected: usize,
) -> Result<()> {
    let first = lines
        .next()
        .ok_or_else(|| corrupt(path, 1, "empty cache file"))??;
    let found: usize = first
        .trim()
        .parse()
        .map_err(|_| corrupt(path, 1, "missing element count"))?;
    if found != expected {
        return Err(Error::CacheMismatch {
            path: path.to_path_buf(),
            expected,
            found,
        });
    }
    Ok(())
}

pub fn save_weighted_labels(path: &Path, labels: &[Vec<(VertexId, Weight)>]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", labels.len())?;
    for (u, label) in labels.iter().enumerate() {
        write!(out, "{} {}", u, label.len())?;
        for &(lm, bw) in label {
            write!(out, " {lm} {bw}")?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

pub fn load_weighted_labels(path: &Path, expected: usize) -> Result<Vec<Vec<(VertexId, Weight)>>> {
    let mut lines = BufReader::new(File::open(path)?).lines();
    read_header(&mut lines, path, expected)?;

    let mut labels: Vec<Vec<(VertexId, Weight)>> = vec![Vec::new(); expected];
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        let mut it = line.split_whitespace();
        let (Some(u), Some(count)) = (it.next(), it.next()) else {
            continue;
        };
        let (Ok(u), Ok(count)) = (u.parse::<usize>(), count.parse::<usize>()) else {
            warn!("skipping malformed label line {} in {}", line_no + 2, path.display());
            continue;
        };
        if u >= expected {
            warn!("skipping out-of-range vertex {u} in {}", path.display());
            continue;
        }
        let mut label = Vec::with_capacity(count);
        for _ in 0..count {
            let (Some(lm), Some(bw)) = (it.next(), it.next()) else {
                return Err(corrupt(path, line_no + 2, "truncated label entry"));
            };
            let lm: VertexId = lm
                .parse()
                .map_err(|_| corrupt(path, line_no + 2, "bad landmark id"))?;
            let bw: Weight = bw
                .parse()
                .map_err(|_| corrupt(path, line_no + 2, "bad bottleneck"))?;
            label.push((lm, bw));
        }
        label.sort_unstable();
        labels[u] = label;
    }
    Ok(labels)
}

pub fn save_disjoint_sets(path: &Path, ds: &UnionFind) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", ds.len())?;
    for (parent, rank) in ds.parent_slice().iter().zip(ds.rank_slice()) {
        writeln!(out, "{parent} {rank}")?;
    }
    out.flush()?;
    Ok(())
}

pub fn load_disjoint_sets(path: &Path, expected: usize) -> Result<UnionFind> {
    let mut lines = BufReader::new(File::open(path)?).lines();
    read_header(&mut lines, path, expected)?;

    let mut parent = Vec::with_capacity(expected);
    let mut rank = Vec::with_capacity(expected);
    for (line_no, line) in lines.enumerate() {
        if parent.len() == expected {
            break;
        }
        let line = line?;
        let mut it = line.split_whitespace();
        let (Some(p), Some(r)) = (it.next(), it.next()) else {
            return Err(corrupt(path, line_no + 2, "truncated parent/rank pair"));
        };
        parent.push(
            p.parse::<usize>()
                .map_err(|_| corrupt(path, line_no + 2, "bad parent"))?,
        );
        rank.push(
            r.parse::<u8>()
                .map_err(|_| corrupt(path, line_no + 2, "bad rank"))?,
        );
    }
    if parent.len() != expected {
        return Err(corrupt(path, expected + 1, "fewer entries than declared"));
    }
    UnionFind::from_parts(parent, rank)
        .ok_or_else(|| corrupt(path, 1, "parent entry out of range"))
}

pub fn save_weighted_adjacency(path: &Path, adj: &[Vec<(VertexId, Weight)>]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", adj.len())?;
    for (u, nbrs) in adj.iter().enumerate() {
        write!(out, "{u}")?;
        for &(v, w) in nbrs {
            write!(out, " {v} {w}")?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

pub fn load_weighted_adjacency(
    path: &Path,
    expected: usize,
) -> Result<Vec<Vec<(VertexId, Weight)>>> {
    let mut lines = BufReader::new(File::open(path)?).lines();
    read_header(&mut lines, path, expected)?;

    let mut adj: Vec<Vec<(VertexId, Weight)>> = vec![Vec::new(); expected];
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        let mut it = line.split_whitespace();
        let Some(u) = it.next() else { continue };
        let Ok(u) = u.parse::<usize>() else {
            warn!("skipping malformed adjacency line {} in {}", line_no + 2, path.display());
            continue;
        };
        if u >= expected {
            warn!("skipping out-of-range vertex {u} in {}", path.display());
            continue;
        }
        let mut nbrs = Vec::new();
        while let Some(v) = it.next() {
            let Some(w) = it.next() else {
                return Err(corrupt(path, line_no + 2, "dangling neighbor without weight"));
            };
            let v: VertexId = v
                .parse()
                .map_err(|_| corrupt(path, line_no + 2, "bad neighbor id"))?;
            let w: Weight = w
                .parse()
                .map_err(|_| corrupt(path, line_no + 2, "bad weight"))?;
            if v >= expected {
                warn!("skipping out-of-range neighbor {v} in {}", path.display());
                continue;
            }
            nbrs.push((v, w));
        }
        adj[u] = nbrs;
    }
    Ok(adj)
}

pub fn save_hop_labels(
    path: &Path,
    inn: &[Vec<VertexId>],
    out_labels: &[Vec<VertexId>],
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", inn.len())?;
    for block in [inn, out_labels] {
        for (u, label) in block.iter().enumerate() {
            write!(out, "{} {}", u, label.len())?;
            for &lm in label {
                write!(out, " {lm}")?;
            }
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn load_hop_labels(
    path: &Path,
    expected: usize,
) -> Result<(Vec<Vec<VertexId>>, Vec<Vec<VertexId>>)> {
    let mut lines = BufReader::new(File::open(path)?).lines();
    read_header(&mut lines, path, expected)?;

    let mut blocks = [vec![Vec::new(); expected], vec![Vec::new(); expected]];
    for (block_no, block) in blocks.iter_mut().enumerate() {
        for row in 0..expected {
            let line_no = 1 + block_no * expected + row;
            let line = lines
                .next()
                .ok_or_else(|| corrupt(path, line_no + 1, "fewer label lines than declared"))??;
            let mut it = line.split_whitespace();
            let (Some(u), Some(count)) = (it.next(), it.next()) else {
                return Err(corrupt(path, line_no + 1, "missing vertex or count"));
            };
            let u: usize = u
                .parse()
                .map_err(|_| corrupt(path, line_no + 1, "bad vertex id"))?;
            let count: usize = count
                .parse()
                .map_err(|_| corrupt(path, line_no + 1, "bad label count"))?;
            if u >= expected {
                warn!("skipping out-of-range vertex {u} in {}", path.display());
                continue;
            }
            let mut label = Vec::with_capacity(count);
            for _ in 0..count {
                let lm = it
                    .next()
                    .ok_or_else(|| corrupt(path, line_no + 1, "truncated label entry"))?;
                label.push(
                    lm.parse::<VertexId>()
                        .map_err(|_| corrupt(path, line_no + 1, "bad landmark id"))?,
                );
            }
            label.sort_unstable();
            block[u] = label;
        }
    }
    let [inn, out] = blocks;
    Ok((inn, out))
}
