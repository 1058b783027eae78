//! Derives folders from a flat key listing.
//!
//! Nothing here is persisted: every projection is recomputed from the keys it
//! is handed, so a folder disappears as soon as its last key does.

use crate::models::{FolderTreeNode, VirtualFolder};
use std::collections::HashMap;

/// Folders found in a listing plus the keys that sit at the root.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FolderProjection {
    /// Every ancestor folder, deduplicated, in first-seen order.
    pub folders: Vec<VirtualFolder>,
    pub root_files: Vec<String>,
}

/// Flat folder list with immediate-child file counts.
pub fn project<S: AsRef<str>>(keys: &[S]) -> FolderProjection {
    let mut projection = FolderProjection::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for key in keys {
        let key = key.as_ref();
        let parts: Vec<&str> = key.split('/').collect();
        if parts.len() < 2 {
            projection.root_files.push(key.to_string());
            continue;
        }

        let deepest = parts.len() - 2;
        for level in 0..=deepest {
            let path = parts[..=level].join("/");
            let slot = match index.get(&path) {
                Some(&slot) => slot,
                None => {
                    projection.folders.push(VirtualFolder {
                        name: parts[level].to_string(),
                        path: path.clone(),
                        file_count: 0,
                    });
                    index.insert(path, projection.folders.len() - 1);
                    projection.folders.len() - 1
                }
            };
            if level == deepest {
                projection.folders[slot].file_count += 1;
            }
        }
    }

    projection
}

/// Nested folder tree with recursive file counts.
///
/// Root-level keys have no folder and are skipped.
pub fn build_tree<S: AsRef<str>>(keys: &[S]) -> Vec<FolderTreeNode> {
    // Pass 1: count every key against each of its ancestor folders.
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in keys {
        let parts: Vec<&str> = key.as_ref().split('/').collect();
        for level in 0..parts.len().saturating_sub(1) {
            *counts.entry(parts[..=level].join("/")).or_default() += 1;
        }
    }

    // Pass 2: thread the structure.
    let mut roots: Vec<FolderTreeNode> = Vec::new();
    for key in keys {
        let parts: Vec<&str> = key.as_ref().split('/').collect();
        if parts.len() < 2 {
            continue;
        }
        let mut level_nodes = &mut roots;
        for level in 0..parts.len() - 1 {
            let name = parts[level];
            let position = match level_nodes.iter().position(|node| node.name == name) {
                Some(position) => position,
                None => {
                    let path = parts[..=level].join("/");
                    level_nodes.push(FolderTreeNode {
                        name: name.to_string(),
                        file_count: counts.get(&path).copied().unwrap_or_default(),
                        path,
                        children: Vec::new(),
                    });
                    level_nodes.len() - 1
                }
            };
            level_nodes = &mut level_nodes[position].children;
        }
    }

    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const KEY_SETS: &[&[&str]] = &[
        &[],
        &["a.txt", "b.txt"],
        &["invoices/report.pdf"],
        &[
            "root.txt",
            "invoices/a.pdf",
            "invoices/2025/q1.pdf",
            "invoices/2025/q2.pdf",
            "photos/cat.png",
            "invoices/2024/.folder",
        ],
        &["x/y/z/w/deep.bin", "x/shallow.bin", "y/only.bin", "x/y/mid.bin"],
    ];

    fn find<'a>(nodes: &'a [FolderTreeNode], path: &str) -> Option<&'a FolderTreeNode> {
        for node in nodes {
            if node.path == path {
                return Some(node);
            }
            if let Some(found) = find(&node.children, path) {
                return Some(found);
            }
        }
        None
    }

    #[test]
    fn root_keys_are_files_not_folders() {
        for keys in KEY_SETS {
            let projection = project(keys);
            for key in keys.iter().filter(|k| !k.contains('/')) {
                assert!(projection.root_files.iter().any(|f| f == key));
                assert!(projection.folders.iter().all(|f| f.path != *key));
            }
        }
    }

    #[test]
    fn registers_every_ancestor_once() {
        let keys = ["x/y/z/file.bin"];
        let projection = project(&keys);
        let paths: Vec<&str> = projection.folders.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["x", "x/y", "x/y/z"]);
        let counts: Vec<usize> = projection.folders.iter().map(|f| f.file_count).collect();
        assert_eq!(counts, vec![0, 0, 1]);
    }

    #[test]
    fn immediate_counts_match_brute_force() {
        for keys in KEY_SETS {
            let projection = project(keys);
            let unique: HashSet<&String> = projection.folders.iter().map(|f| &f.path).collect();
            assert_eq!(unique.len(), projection.folders.len());

            for folder in &projection.folders {
                let prefix = format!("{}/", folder.path);
                let expected = keys
                    .iter()
                    .filter(|k| k.strip_prefix(&prefix).is_some_and(|rest| !rest.contains('/')))
                    .count();
                assert_eq!(folder.file_count, expected, "{}", folder.path);
            }
        }
    }

    #[test]
    fn tree_counts_are_recursive() {
        for keys in KEY_SETS {
            let tree = build_tree(keys);
            for folder in project(keys).folders {
                let node = find(&tree, &folder.path).expect("folder missing from tree");
                let prefix = format!("{}/", folder.path);
                let expected = keys.iter().filter(|k| k.starts_with(&prefix)).count();
                assert_eq!(node.file_count, expected, "{}", folder.path);
            }
        }
    }

    #[test]
    fn tree_preserves_first_seen_order_and_skips_root_files() {
        let tree = build_tree(&["z/1", "root.txt", "a/2", "z/b/3"]);
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(tree[0].file_count, 2);
        assert_eq!(tree[0].children[0].path, "z/b");
        assert_eq!(tree[0].children[0].file_count, 1);
    }
}
