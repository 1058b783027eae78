//! Data shapes shared by the catalog service and the HTTP layer.
//!
//! The object store only knows flat keys; folders here are projections over
//! key prefixes and serialize straight into API responses via `serde`.

pub mod file_entry;
pub mod folder;
pub mod pagination;

pub use file_entry::{FileEntry, FileMetadata, FileType, UploadedObject};
pub use folder::{DirectoryEntry, FolderContents, FolderListing, FolderTreeNode, VirtualFolder};
pub use pagination::{Pagination, paginate};
