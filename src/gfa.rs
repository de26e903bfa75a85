//! Minimal GFA loader for the CLI's "succinct graph container" collaborator
//! (spec.md §1 lists this as an external dependency, "assumed present;
//! contract below" — §6's `Graph` trait). Parses `S`/`L`/`P` lines into a
//! [`SeqGraph`].
//!
//! Grounded on the line-tag dispatch shape of
//! `other_examples/.../MoinSebi-gfa-reader__src-lib.rs.rs` (one parse
//! function per GFA record type, `memchr` for fast line/field splitting),
//! simplified to what `SeqGraph` needs: segment id + sequence, link
//! from/to (orientation is not modeled — spec.md's `Orientation` field
//! exists on `Path` but the core never queries it), and path node lists.

use std::fs;
use std::path::Path as FsPath;

use memchr::memchr;

use crate::error::{PangrepsError, Result};
use crate::graph::{NodeId, SeqGraph};

fn split_tabs(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let bytes = line.as_bytes();
    let mut start = 0;
    while let Some(pos) = memchr(b'\t', &bytes[start..]) {
        fields.push(&line[start..start + pos]);
        start += pos + 1;
    }
    fields.push(&line[start..]);
    fields
}

/// Strip a trailing `+`/`-` orientation marker from a GFA segment reference
/// (used in `L` and `P` lines).
fn strip_orientation(token: &str) -> &str {
    token.strip_suffix('+').or_else(|| token.strip_suffix('-')).unwrap_or(token)
}

/// Load a graph from a GFA file: `S` lines become nodes, `L` lines become
/// edges, `P` lines become embedded paths (spec.md §6's consumed `Graph`
/// contract, concretely backed by [`SeqGraph`]).
pub fn load_graph(path: impl AsRef<FsPath>) -> Result<SeqGraph> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| PangrepsError::io(path, e))?;

    let mut nodes: Vec<(NodeId, Vec<u8>)> = Vec::new();
    let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
    let mut raw_paths: Vec<Vec<NodeId>> = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let fields = split_tabs(line);
        match fields[0] {
            "S" => {
                if fields.len() < 3 {
                    return Err(PangrepsError::corruption(path, format!("malformed S line: {line}")));
                }
                let id: NodeId = fields[1]
                    .parse()
                    .map_err(|_| PangrepsError::corruption(path, format!("non-numeric segment id: {}", fields[1])))?;
                nodes.push((id, fields[2].as_bytes().to_vec()));
            }
            "L" => {
                if fields.len() < 4 {
                    return Err(PangrepsError::corruption(path, format!("malformed L line: {line}")));
                }
                let from: NodeId = fields[1]
                    .parse()
                    .map_err(|_| PangrepsError::corruption(path, format!("non-numeric link source: {}", fields[1])))?;
                let to: NodeId = fields[3]
                    .parse()
                    .map_err(|_| PangrepsError::corruption(path, format!("non-numeric link target: {}", fields[3])))?;
                edges.push((from, to));
            }
            "P" => {
                if fields.len() < 3 {
                    return Err(PangrepsError::corruption(path, format!("malformed P line: {line}")));
                }
                let mut nodes_on_path = Vec::new();
                for tok in fields[2].split(',') {
                    let id: NodeId = strip_orientation(tok)
                        .parse()
                        .map_err(|_| PangrepsError::corruption(path, format!("non-numeric path segment: {tok}")))?;
                    nodes_on_path.push(id);
                }
                raw_paths.push(nodes_on_path);
            }
            _ => {}
        }
    }

    nodes.sort_by_key(|&(id, _)| id);
    let mut graph = SeqGraph::new(nodes, &edges);
    for path in raw_paths {
        graph.add_path(path);
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_segments_links_and_paths() {
        let dir = tempfile::tempdir().unwrap();
        let gfa_path = dir.path().join("g.gfa");
        std::fs::write(
            &gfa_path,
            "H\tVN:Z:1.0\nS\t1\tA\nS\t2\tC\nS\t3\tG\nS\t4\tT\nL\t1\t+\t2\t+\t0M\nL\t1\t+\t3\t+\t0M\nL\t2\t+\t4\t+\t0M\nL\t3\t+\t4\t+\t0M\nP\tref\t1+,2+,4+\t*\n",
        )
        .unwrap();

        let g = load_graph(&gfa_path).unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.path_count(), 1);
    }

    #[test]
    fn rejects_non_numeric_segment_id() {
        let dir = tempfile::tempdir().unwrap();
        let gfa_path = dir.path().join("bad.gfa");
        std::fs::write(&gfa_path, "S\tnotanumber\tACGT\n").unwrap();
        assert!(load_graph(&gfa_path).is_err());
    }
}
