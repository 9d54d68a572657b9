//! Folding a size scan into per-directory totals.

use std::collections::HashMap;
use std::path::Path;

use cubby_core::events::file::parent_of;
use cubby_core::traits::{NodeKind, ScannedNode};
use cubby_core::types::path;

/// Sum regular-file sizes into every directory between the file and `base`.
///
/// `root` is the owner root the scan paths are relative to and `base` the
/// owner-relative directory that was scanned. Directory inodes contribute
/// nothing, so an empty directory totals `0` on every filesystem.
pub fn tally(root: &Path, base: &str, nodes: &[ScannedNode]) -> HashMap<String, u64> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    totals.insert(base.to_string(), 0);

    for node in nodes {
        let Some(relative) = node
            .path
            .strip_prefix(root)
            .ok()
            .and_then(|p| p.to_str())
            .and_then(path::normalize)
        else {
            continue;
        };
        if !path::is_at_or_under(&relative, base) {
            continue;
        }

        match node.kind {
            NodeKind::Directory => {
                totals.entry(relative).or_insert(0);
            }
            NodeKind::File => {
                let mut dir = parent_of(&relative);
                loop {
                    *totals.entry(dir.clone()).or_insert(0) += node.bytes;
                    if dir == base || dir == "/" {
                        break;
                    }
                    dir = parent_of(&dir);
                }
            }
            NodeKind::Other => {}
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn node(path: &str, bytes: u64, kind: NodeKind) -> ScannedNode {
        ScannedNode {
            path: PathBuf::from(path),
            bytes,
            kind,
        }
    }

    #[test]
    fn test_full_tally() {
        let nodes = vec![
            node("/r", 4096, NodeKind::Directory),
            node("/r/a", 4096, NodeKind::Directory),
            node("/r/a/x.bin", 100, NodeKind::File),
            node("/r/a/b", 4096, NodeKind::Directory),
            node("/r/a/b/y.bin", 20, NodeKind::File),
            node("/r/empty", 4096, NodeKind::Directory),
            node("/r/top.txt", 3, NodeKind::File),
            node("/r/link", 99, NodeKind::Other),
        ];
        let totals = tally(Path::new("/r"), "/", &nodes);
        assert_eq!(totals["/"], 123);
        assert_eq!(totals["/a"], 120);
        assert_eq!(totals["/a/b"], 20);
        assert_eq!(totals["/empty"], 0);
        assert!(!totals.contains_key("/link"));
    }

    #[test]
    fn test_partial_tally_stops_at_base() {
        let nodes = vec![
            node("/r/a", 4096, NodeKind::Directory),
            node("/r/a/x.bin", 100, NodeKind::File),
            node("/r/a/b/y.bin", 20, NodeKind::File),
        ];
        let totals = tally(Path::new("/r"), "/a", &nodes);
        assert_eq!(totals["/a"], 120);
        assert_eq!(totals["/a/b"], 20);
        assert!(!totals.contains_key("/"));
    }

    #[test]
    fn test_empty_scan_still_reports_base() {
        let totals = tally(Path::new("/r"), "/gone", &[]);
        assert_eq!(totals.get("/gone"), Some(&0));
    }
}
