//! Virtual folders derived from flat object keys.

use super::{file_entry::FileEntry, pagination::Pagination};
use serde::{Deserialize, Serialize};

/// A folder that exists only because some key carries its path as a prefix.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VirtualFolder {
    pub name: String,
    pub path: String,
    /// Objects stored directly inside this folder.
    pub file_count: usize,
}

/// One node of the nested folder tree.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FolderTreeNode {
    pub name: String,
    pub path: String,
    /// Objects anywhere beneath this folder.
    pub file_count: usize,
    /// Sub-folders in first-seen order.
    pub children: Vec<FolderTreeNode>,
}

/// A direct sub-folder in a paginated folder listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
}

/// Whole-disk projection: every folder plus the files stored at the root.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FolderListing {
    pub folders: Vec<VirtualFolder>,
    pub files: Vec<FileEntry>,
}

/// One page of a folder: sub-folders first, then files.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FolderContents {
    pub files: Vec<FileEntry>,
    pub directories: Vec<DirectoryEntry>,
    pub pagination: Pagination,
}
