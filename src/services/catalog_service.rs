//! FileCatalogService: the file-manager operations over a configured disk.
//!
//! Every public operation follows the same shape:
//! 1. resolve and validate the disk configuration (never retried),
//! 2. sanitize every incoming path,
//! 3. drive the [`ObjectStoreGateway`] through the [`RetryPolicy`],
//! 4. invalidate the disk's listing cache on success.
//!
//! Folder-level mutations touch one key at a time and are not atomic. When a
//! single key fails the operation stops where it is and reports failure; keys
//! already moved or copied stay where they landed. Concurrent operations on
//! overlapping prefixes are not serialised either.

use crate::{
    config::{ConfigError, DiskConfig, FileManagerConfig},
    models::{
        DirectoryEntry, FileEntry, FileMetadata, FileType, FolderContents, FolderListing,
        FolderTreeNode, Pagination, UploadedObject, paginate,
    },
    services::{
        folder_projector,
        listing_cache::ListingCache,
        object_store::{
            FOLDER_MARKER, GatewayError, GatewayResult, ObjectStoreGateway, StoreConnector,
        },
        path_sanitizer::{base_name, join_path, parent_path, sanitize},
        retry::{DEFAULT_ATTEMPTS, RetryPolicy, UPLOAD_ATTEMPTS},
    },
};
use bytes::Bytes;
use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};
use thiserror::Error;
use tracing::{debug, error, info};

/// Catalog operations, as named in logs and error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    List,
    Preview,
    Metadata,
    Delete,
    Rename,
    Move,
    Copy,
    Create,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::List => "list",
            Operation::Preview => "preview",
            Operation::Metadata => "metadata",
            Operation::Delete => "delete",
            Operation::Rename => "rename",
            Operation::Move => "move",
            Operation::Copy => "copy",
            Operation::Create => "create",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// The store endpoint can never be reached as configured (DNS, malformed URL).
    #[error("object store misconfigured during {operation}: {source}")]
    StoreMisconfigured {
        operation: Operation,
        #[source]
        source: GatewayError,
    },
    #[error("object store unavailable during {operation}: {source}")]
    Connectivity {
        operation: Operation,
        #[source]
        source: GatewayError,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{operation} failed: {reason}")]
    OperationFailed { operation: Operation, reason: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    fn from_gateway(operation: Operation, err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(key) => CatalogError::NotFound(key),
            source @ (GatewayError::Dns(_) | GatewayError::InvalidEndpoint(_)) => {
                CatalogError::StoreMisconfigured { operation, source }
            }
            GatewayError::Status { status, message } if (400..500).contains(&status) => {
                CatalogError::OperationFailed {
                    operation,
                    reason: format!("store rejected the request (HTTP {status}): {message}"),
                }
            }
            source => CatalogError::Connectivity { operation, source },
        }
    }

    /// Listing failures that are reported as an empty result instead of an error.
    fn is_degradable(&self) -> bool {
        matches!(
            self,
            CatalogError::Connectivity { .. } | CatalogError::OperationFailed { .. }
        )
    }
}

/// Which way a folder transfer leaves the source keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Move,
    Copy,
}

#[derive(Clone)]
pub struct FileCatalogService {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    settings: Arc<FileManagerConfig>,
    connector: Arc<dyn StoreConnector>,
    gateways: Mutex<HashMap<String, Arc<dyn ObjectStoreGateway>>>,
    cache: ListingCache,
    retry: RetryPolicy,
}

/// Last timestamp handed out to an upload name; keeps names unique per process.
static LAST_UPLOAD_STAMP: AtomicI64 = AtomicI64::new(0);

impl FileCatalogService {
    pub fn new(settings: Arc<FileManagerConfig>, connector: Arc<dyn StoreConnector>) -> Self {
        Self::with_retry_policy(settings, connector, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        settings: Arc<FileManagerConfig>,
        connector: Arc<dyn StoreConnector>,
        retry: RetryPolicy,
    ) -> Self {
        let cache = ListingCache::new(settings.cache.enabled, settings.cache_ttl());
        Self {
            inner: Arc::new(CatalogInner {
                settings,
                connector,
                gateways: Mutex::new(HashMap::new()),
                cache,
                retry,
            }),
        }
    }

    pub fn settings(&self) -> &FileManagerConfig {
        &self.inner.settings
    }

    /// Store `body` under `folder_path` with a generated, collision-resistant name.
    pub async fn upload(
        &self,
        disk: &str,
        folder_path: Option<&str>,
        original_name: &str,
        declared_mime: Option<&str>,
        body: Bytes,
    ) -> CatalogResult<UploadedObject> {
        let (config, store) = self.resolve(disk, Operation::Upload)?;
        let settings = self.settings();

        let extension = extension_of(original_name)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !settings.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(CatalogError::Validation(format!(
                "File type `{}` is not allowed",
                extension
            )));
        }
        if body.len() as u64 > settings.max_upload_bytes() {
            return Err(CatalogError::Validation(format!(
                "File exceeds the maximum upload size of {} KB",
                settings.max_file_size
            )));
        }

        let folder = folder_path_or_root(folder_path.unwrap_or_default())?;
        let key = required_path(&join_path(&folder, &unique_object_name(original_name)), "file path")?;

        let size = body.len() as u64;
        let visibility = config.visibility;
        let stored = {
            let store = store.as_ref();
            let key = key.as_str();
            self.retried(Operation::Upload, UPLOAD_ATTEMPTS, "upload file", move || {
                store.put(key, body.clone(), visibility)
            })
            .await?
        };
        if !stored {
            error!(disk, key = %key, "store refused the upload");
            return Err(CatalogError::OperationFailed {
                operation: Operation::Upload,
                reason: "the store did not accept the object".into(),
            });
        }

        self.clear_file_list_cache(disk);
        info!(disk, key = %key, size, "file uploaded");

        let mime_type = declared_mime
            .filter(|mime| !mime.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(&key)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });

        Ok(UploadedObject {
            key,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            size,
            mime_type,
        })
    }

    /// One page of a folder, sub-folders first and then files.
    ///
    /// Store failures degrade to an empty first page.
    pub async fn list_files_in_folder(
        &self,
        disk: &str,
        folder_path: &str,
        page: usize,
        per_page: usize,
    ) -> CatalogResult<FolderContents> {
        let (_, store) = self.resolve(disk, Operation::List)?;
        let folder = folder_path_or_root(folder_path)?;

        let listing = async {
            let files = self.list_immediate_files(store.as_ref(), &folder).await?;
            let directories = self.list_immediate_directories(store.as_ref(), &folder).await?;
            Ok::<_, CatalogError>((directories, files))
        }
        .await;

        let (directories, files) = match listing {
            Ok(listing) => listing,
            Err(err) if err.is_degradable() => {
                error!(disk, folder = %folder, error = %err, "listing folder failed, returning an empty page");
                return Ok(FolderContents {
                    files: Vec::new(),
                    directories: Vec::new(),
                    pagination: Pagination::empty(per_page),
                });
            }
            Err(err) => return Err(err),
        };

        let merged: Vec<(bool, String)> = directories
            .into_iter()
            .map(|path| (true, path))
            .chain(files.into_iter().map(|key| (false, key)))
            .collect();
        let (page_items, pagination) = paginate(&merged, page, per_page);

        let mut page_directories = Vec::new();
        let mut page_files = Vec::new();
        for (is_directory, path) in page_items {
            if is_directory {
                page_directories.push(DirectoryEntry {
                    name: base_name(&path).to_string(),
                    path,
                });
            } else {
                page_files.push(path);
            }
        }

        Ok(FolderContents {
            files: self.describe_all(store.as_ref(), &page_files).await,
            directories: page_directories,
            pagination,
        })
    }

    /// Every folder on the disk plus the files at its root. Cached per disk.
    pub async fn list_files_with_folders(&self, disk: &str) -> CatalogResult<FolderListing> {
        let (_, store) = self.resolve(disk, Operation::List)?;
        if let Some(listing) = self.inner.cache.listing(disk) {
            debug!(disk, "folder listing served from cache");
            return Ok(listing);
        }
        let generation = self.inner.cache.generation(disk);

        let keys = match self.all_keys(store.as_ref(), None).await {
            Ok(keys) => keys,
            Err(err) if err.is_degradable() => {
                error!(disk, error = %err, "listing disk failed, returning an empty listing");
                return Ok(FolderListing::default());
            }
            Err(err) => return Err(err),
        };

        let projection = folder_projector::project(&keys);
        let root_files: Vec<String> = projection
            .root_files
            .into_iter()
            .filter(|key| !is_marker(key))
            .collect();
        let listing = FolderListing {
            folders: projection.folders,
            files: self.describe_all(store.as_ref(), &root_files).await,
        };

        self.inner.cache.store_listing(disk, generation, listing.clone());
        Ok(listing)
    }

    /// Nested folder tree for the whole disk. Cached per disk.
    pub async fn get_folder_tree(&self, disk: &str) -> CatalogResult<Vec<FolderTreeNode>> {
        let (_, store) = self.resolve(disk, Operation::List)?;
        if let Some(tree) = self.inner.cache.tree(disk) {
            debug!(disk, "folder tree served from cache");
            return Ok(tree);
        }
        let generation = self.inner.cache.generation(disk);

        let keys = match self.all_keys(store.as_ref(), None).await {
            Ok(keys) => keys,
            Err(err) if err.is_degradable() => {
                error!(disk, error = %err, "building folder tree failed, returning an empty tree");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let tree = folder_projector::build_tree(&keys);
        self.inner.cache.store_tree(disk, generation, tree.clone());
        Ok(tree)
    }

    /// Folders directly inside `folder_path`.
    pub async fn list_directories(
        &self,
        disk: &str,
        folder_path: &str,
    ) -> CatalogResult<Vec<DirectoryEntry>> {
        let (_, store) = self.resolve(disk, Operation::List)?;
        let folder = folder_path_or_root(folder_path)?;
        let directories = self.list_immediate_directories(store.as_ref(), &folder).await?;
        Ok(directories
            .into_iter()
            .map(|path| DirectoryEntry {
                name: base_name(&path).to_string(),
                path,
            })
            .collect())
    }

    /// Time-limited GET URL for an existing file.
    pub async fn generate_presigned_url(&self, disk: &str, file_path: &str) -> CatalogResult<String> {
        let (_, store) = self.resolve(disk, Operation::Preview)?;
        let key = required_path(file_path, "file path")?;
        self.ensure_exists(store.as_ref(), &key, Operation::Preview).await?;

        let ttl = self.settings().presigned_ttl();
        let store = store.as_ref();
        let key = key.as_str();
        self.retried(Operation::Preview, DEFAULT_ATTEMPTS, "generate presigned url", move || {
            store.signed_url(key, ttl)
        })
        .await
    }

    /// Size, modification time and MIME type. Store failures read as `exists: false`.
    pub async fn get_file_metadata(&self, disk: &str, file_path: &str) -> CatalogResult<FileMetadata> {
        let (_, store) = self.resolve(disk, Operation::Metadata)?;
        let key = required_path(file_path, "file path")?;
        let store = store.as_ref();
        let key = key.as_str();

        let metadata = async {
            if !self.key_exists(store, key, Operation::Metadata).await? {
                return Ok(FileMetadata::default());
            }
            let size = self
                .retried(Operation::Metadata, DEFAULT_ATTEMPTS, "read file size", move || store.size(key))
                .await?;
            let last_modified = self
                .retried(Operation::Metadata, DEFAULT_ATTEMPTS, "read last modified", move || {
                    store.last_modified(key)
                })
                .await?;
            let mime_type = self
                .retried(Operation::Metadata, DEFAULT_ATTEMPTS, "read mime type", move || {
                    store.mime_type(key)
                })
                .await?;
            Ok::<_, CatalogError>(FileMetadata {
                exists: true,
                size,
                last_modified: Some(last_modified),
                mime_type: Some(mime_type),
            })
        }
        .await;

        match metadata {
            Ok(metadata) => Ok(metadata),
            Err(err @ CatalogError::StoreMisconfigured { .. }) => Err(err),
            Err(err) => {
                error!(disk, key, error = %err, "reading file metadata failed");
                Ok(FileMetadata::default())
            }
        }
    }

    pub async fn file_exists(&self, disk: &str, file_path: &str) -> CatalogResult<bool> {
        let (_, store) = self.resolve(disk, Operation::Metadata)?;
        let key = required_path(file_path, "file path")?;
        self.key_exists(store.as_ref(), &key, Operation::Metadata).await
    }

    pub async fn delete_file(&self, disk: &str, file_path: &str) -> CatalogResult<()> {
        let (_, store) = self.resolve(disk, Operation::Delete)?;
        let key = required_path(file_path, "file path")?;
        self.ensure_exists(store.as_ref(), &key, Operation::Delete).await?;

        let deleted = {
            let store = store.as_ref();
            let key = key.as_str();
            self.retried(Operation::Delete, DEFAULT_ATTEMPTS, "delete file", move || store.delete(key))
                .await?
        };
        if !deleted {
            error!(disk, key = %key, "store refused the delete");
            return Err(CatalogError::OperationFailed {
                operation: Operation::Delete,
                reason: format!("`{}` could not be deleted", key),
            });
        }

        self.clear_file_list_cache(disk);
        info!(disk, key = %key, "file deleted");
        Ok(())
    }

    /// Delete every key beneath `folder_path`.
    ///
    /// All keys are attempted; the operation only succeeds if each delete did.
    pub async fn delete_folder(&self, disk: &str, folder_path: &str) -> CatalogResult<()> {
        let (_, store) = self.resolve(disk, Operation::Delete)?;
        let folder = required_folder(folder_path)?;
        let keys = self.all_keys(store.as_ref(), Some(&folder)).await?;
        if keys.is_empty() {
            return Err(CatalogError::NotFound(format!("folder `{}`", folder)));
        }

        let mut failed = 0usize;
        for key in &keys {
            let store = store.as_ref();
            let key = key.as_str();
            match self
                .retried(Operation::Delete, DEFAULT_ATTEMPTS, "delete folder object", move || {
                    store.delete(key)
                })
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    failed += 1;
                    error!(disk, key, "store refused the delete");
                }
                Err(err) => {
                    failed += 1;
                    error!(disk, key, error = %err, "deleting folder object failed");
                }
            }
        }

        if failed > 0 {
            return Err(CatalogError::OperationFailed {
                operation: Operation::Delete,
                reason: format!(
                    "{} of {} objects in `{}` could not be deleted",
                    failed,
                    keys.len(),
                    folder
                ),
            });
        }

        self.clear_file_list_cache(disk);
        info!(disk, folder = %folder, objects = keys.len(), "folder deleted");
        Ok(())
    }

    /// Rename a file in place; returns the new key.
    pub async fn rename_file(&self, disk: &str, file_path: &str, new_name: &str) -> CatalogResult<String> {
        let (_, store) = self.resolve(disk, Operation::Rename)?;
        let source = required_path(file_path, "file path")?;
        let name = valid_name(new_name)?;
        let destination = required_path(&join_path(parent_path(&source), &name), "new name")?;

        self.transfer_file(store.as_ref(), disk, &source, &destination, Operation::Rename)
            .await?;
        Ok(destination)
    }

    /// Rename a folder in place; returns the new folder path.
    pub async fn rename_folder(&self, disk: &str, folder_path: &str, new_name: &str) -> CatalogResult<String> {
        let (_, store) = self.resolve(disk, Operation::Rename)?;
        let source = required_folder(folder_path)?;
        let name = valid_name(new_name)?;
        let destination = required_folder(&join_path(parent_path(&source), &name))?;

        self.transfer_folder(store.as_ref(), disk, &source, &destination, Transfer::Move, Operation::Rename)
            .await?;
        Ok(destination)
    }

    pub async fn move_file(&self, disk: &str, source_path: &str, destination_path: &str) -> CatalogResult<()> {
        let (_, store) = self.resolve(disk, Operation::Move)?;
        let source = required_path(source_path, "source path")?;
        let destination = required_path(destination_path, "destination path")?;
        self.transfer_file(store.as_ref(), disk, &source, &destination, Operation::Move)
            .await
    }

    pub async fn copy_file(&self, disk: &str, source_path: &str, destination_path: &str) -> CatalogResult<()> {
        let (_, store) = self.resolve(disk, Operation::Copy)?;
        let source = required_path(source_path, "source path")?;
        let destination = required_path(destination_path, "destination path")?;
        self.transfer_file(store.as_ref(), disk, &source, &destination, Operation::Copy)
            .await
    }

    /// Move every key under `source_path` to the same relative path under `destination_path`.
    pub async fn move_folder(&self, disk: &str, source_path: &str, destination_path: &str) -> CatalogResult<()> {
        let (_, store) = self.resolve(disk, Operation::Move)?;
        let source = required_folder(source_path)?;
        let destination = required_folder(destination_path)?;
        self.transfer_folder(store.as_ref(), disk, &source, &destination, Transfer::Move, Operation::Move)
            .await
    }

    /// Copy every key under `source_path` to the same relative path under `destination_path`.
    pub async fn copy_folder(&self, disk: &str, source_path: &str, destination_path: &str) -> CatalogResult<()> {
        let (_, store) = self.resolve(disk, Operation::Copy)?;
        let source = required_folder(source_path)?;
        let destination = required_folder(destination_path)?;
        self.transfer_folder(store.as_ref(), disk, &source, &destination, Transfer::Copy, Operation::Copy)
            .await
    }

    /// Make an empty folder visible by writing its marker object.
    pub async fn create_folder(&self, disk: &str, folder_path: &str) -> CatalogResult<String> {
        let (config, store) = self.resolve(disk, Operation::Create)?;
        let visibility = config.visibility;
        let folder = required_folder(folder_path)?;
        self.ensure_folder_absent(disk, &folder).await?;

        let marker = join_path(&folder, FOLDER_MARKER);
        let created = {
            let store = store.as_ref();
            let marker = marker.as_str();
            self.retried(Operation::Create, DEFAULT_ATTEMPTS, "create folder", move || {
                store.put(marker, Bytes::new(), visibility)
            })
            .await?
        };
        if !created {
            return Err(CatalogError::OperationFailed {
                operation: Operation::Create,
                reason: format!("marker for `{}` was not written", folder),
            });
        }

        self.clear_file_list_cache(disk);
        info!(disk, folder = %folder, "folder created");
        Ok(folder)
    }

    pub fn clear_file_list_cache(&self, disk: &str) {
        self.inner.cache.invalidate(disk);
    }

    /// Validated disk configuration and its gateway.
    fn resolve(
        &self,
        disk: &str,
        operation: Operation,
    ) -> CatalogResult<(&DiskConfig, Arc<dyn ObjectStoreGateway>)> {
        let config = self.inner.settings.disk(disk)?;

        let mut gateways = self.inner.gateways.lock();
        if let Some(store) = gateways.get(disk) {
            return Ok((config, store.clone()));
        }
        let store = self
            .inner
            .connector
            .connect(disk, config)
            .map_err(|err| CatalogError::from_gateway(operation, err))?;
        gateways.insert(disk.to_string(), store.clone());
        Ok((config, store))
    }

    async fn retried<T, F, Fut>(
        &self,
        operation: Operation,
        attempts: u32,
        name: &str,
        call: F,
    ) -> CatalogResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        self.inner
            .retry
            .execute(attempts, name, call)
            .await
            .map_err(|err| CatalogError::from_gateway(operation, err))
    }

    async fn list_immediate_files(
        &self,
        store: &dyn ObjectStoreGateway,
        folder: &str,
    ) -> CatalogResult<Vec<String>> {
        let files = self
            .retried(Operation::List, DEFAULT_ATTEMPTS, "list files in folder", move || {
                store.list_files(folder)
            })
            .await?;
        Ok(files.into_iter().filter(|key| !is_marker(key)).collect())
    }

    async fn list_immediate_directories(
        &self,
        store: &dyn ObjectStoreGateway,
        folder: &str,
    ) -> CatalogResult<Vec<String>> {
        self.retried(Operation::List, DEFAULT_ATTEMPTS, "list directories", move || {
            store.list_directories(folder)
        })
        .await
    }

    async fn all_keys(
        &self,
        store: &dyn ObjectStoreGateway,
        folder: Option<&str>,
    ) -> CatalogResult<Vec<String>> {
        self.retried(Operation::List, DEFAULT_ATTEMPTS, "list all files", move || {
            store.list_all_keys(folder)
        })
        .await
    }

    async fn key_exists(
        &self,
        store: &dyn ObjectStoreGateway,
        key: &str,
        operation: Operation,
    ) -> CatalogResult<bool> {
        self.retried(operation, DEFAULT_ATTEMPTS, "check file exists", move || {
            store.exists(key)
        })
        .await
    }

    async fn ensure_exists(
        &self,
        store: &dyn ObjectStoreGateway,
        key: &str,
        operation: Operation,
    ) -> CatalogResult<()> {
        if self.key_exists(store, key, operation).await? {
            Ok(())
        } else {
            Err(CatalogError::NotFound(format!("file `{}`", key)))
        }
    }

    /// Fails when a folder named like `folder` already sits in its parent.
    async fn ensure_folder_absent(&self, disk: &str, folder: &str) -> CatalogResult<()> {
        let siblings = self.list_directories(disk, parent_path(folder)).await?;
        if siblings.iter().any(|sibling| sibling.path == folder) {
            return Err(CatalogError::AlreadyExists(format!("folder `{}`", folder)));
        }
        Ok(())
    }

    async fn transfer_file(
        &self,
        store: &dyn ObjectStoreGateway,
        disk: &str,
        source: &str,
        destination: &str,
        operation: Operation,
    ) -> CatalogResult<()> {
        if source == destination {
            return Err(CatalogError::Validation(
                "Source and destination are the same".into(),
            ));
        }
        self.ensure_exists(store, source, operation).await?;
        if self.file_exists(disk, destination).await? {
            return Err(CatalogError::AlreadyExists(format!("file `{}`", destination)));
        }

        let transferred = self
            .retried(operation, DEFAULT_ATTEMPTS, operation.as_str(), move || {
                if operation == Operation::Copy {
                    store.copy_object(source, destination)
                } else {
                    store.move_object(source, destination)
                }
            })
            .await?;
        if !transferred {
            error!(disk, source, destination, %operation, "store refused the transfer");
            return Err(CatalogError::OperationFailed {
                operation,
                reason: format!("`{}` could not be transferred to `{}`", source, destination),
            });
        }

        self.clear_file_list_cache(disk);
        info!(disk, source, destination, %operation, "file transferred");
        Ok(())
    }

    async fn transfer_folder(
        &self,
        store: &dyn ObjectStoreGateway,
        disk: &str,
        source: &str,
        destination: &str,
        transfer: Transfer,
        operation: Operation,
    ) -> CatalogResult<()> {
        let source_prefix = format!("{}/", source);
        if destination == source || destination.starts_with(&source_prefix) {
            return Err(CatalogError::Validation(
                "A folder cannot be moved or copied into itself".into(),
            ));
        }
        self.ensure_folder_absent(disk, destination).await?;

        let keys = self.all_keys(store, Some(source)).await?;
        if keys.is_empty() {
            return Err(CatalogError::NotFound(format!("folder `{}`", source)));
        }

        for (done, key) in keys.iter().enumerate() {
            let relative = key.strip_prefix(&source_prefix).unwrap_or(key);
            let target = join_path(destination, relative);
            let from = key.as_str();
            let to = target.as_str();

            let outcome = self
                .retried(operation, DEFAULT_ATTEMPTS, operation.as_str(), move || match transfer {
                    Transfer::Move => store.move_object(from, to),
                    Transfer::Copy => store.copy_object(from, to),
                })
                .await;
            let reason = match outcome {
                Ok(true) => continue,
                Ok(false) => format!("store refused `{}`", from),
                Err(err) => err.to_string(),
            };

            error!(
                disk,
                source,
                destination,
                key = from,
                completed = done,
                total = keys.len(),
                %operation,
                "folder transfer aborted, completed objects were left in place"
            );
            return Err(CatalogError::OperationFailed {
                operation,
                reason: format!(
                    "stopped after {} of {} objects: {}",
                    done,
                    keys.len(),
                    reason
                ),
            });
        }

        self.clear_file_list_cache(disk);
        info!(disk, source, destination, objects = keys.len(), %operation, "folder transferred");
        Ok(())
    }

    /// Listing entries for `keys`; metadata that cannot be read yields an `unknown` entry.
    async fn describe_all(&self, store: &dyn ObjectStoreGateway, keys: &[String]) -> Vec<FileEntry> {
        join_all(keys.iter().map(|key| self.describe(store, key))).await
    }

    async fn describe(&self, store: &dyn ObjectStoreGateway, key: &str) -> FileEntry {
        let size = self
            .retried(Operation::Metadata, DEFAULT_ATTEMPTS, "read file size", move || store.size(key))
            .await;
        let last_modified = self
            .retried(Operation::Metadata, DEFAULT_ATTEMPTS, "read last modified", move || {
                store.last_modified(key)
            })
            .await;

        match (size, last_modified) {
            (Ok(size), Ok(last_modified)) => FileEntry {
                path: key.to_string(),
                name: base_name(key).to_string(),
                size,
                file_type: FileType::from_path(key),
                last_modified: Some(last_modified),
            },
            (size, last_modified) => {
                let err = size.err().or(last_modified.err());
                debug!(key, error = ?err, "file metadata unavailable");
                FileEntry {
                    path: key.to_string(),
                    name: base_name(key).to_string(),
                    size: 0,
                    file_type: FileType::Unknown,
                    last_modified: None,
                }
            }
        }
    }
}

/// `.folder` markers and the `folder/` placeholders other S3 tools write.
fn is_marker(key: &str) -> bool {
    key.ends_with('/') || base_name(key) == FOLDER_MARKER
}

/// A sanitized path that must not be the root.
fn required_path(raw: &str, what: &str) -> CatalogResult<String> {
    let clean = sanitize(raw);
    if clean.is_empty() {
        return Err(CatalogError::Validation(format!("Invalid {}", what)));
    }
    Ok(clean)
}

/// A sanitized folder path; blank input denotes the root.
fn folder_path_or_root(raw: &str) -> CatalogResult<String> {
    let clean = sanitize(raw);
    let clean = clean.trim_end_matches('/');
    if clean.is_empty() && !raw.trim().trim_matches('/').is_empty() {
        return Err(CatalogError::Validation("Invalid folder path".into()));
    }
    Ok(clean.to_string())
}

/// A sanitized folder path other than the root.
fn required_folder(raw: &str) -> CatalogResult<String> {
    let folder = folder_path_or_root(raw)?;
    if folder.is_empty() {
        return Err(CatalogError::Validation(
            "The root folder cannot be used here".into(),
        ));
    }
    Ok(folder)
}

/// A single path segment usable as a file or folder name.
fn valid_name(raw: &str) -> CatalogResult<String> {
    let name = raw.trim();
    if name.is_empty() || name.contains('/') {
        return Err(CatalogError::Validation(
            "Name must be non-empty and must not contain `/`".into(),
        ));
    }
    let clean = sanitize(name);
    if clean != name {
        return Err(CatalogError::Validation(format!("Invalid name `{}`", name)));
    }
    Ok(clean)
}

fn extension_of(name: &str) -> Option<&str> {
    match base_name(name).rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// `{stem}-{timestamp}.{ext}` with the stem reduced to `[A-Za-z0-9._-]`.
///
/// Timestamps are unix seconds, bumped forward when two uploads land in the
/// same second so generated names never repeat within the process.
fn unique_object_name(original_name: &str) -> String {
    let name = base_name(original_name);
    let (stem, extension) = match extension_of(name) {
        Some(ext) => (&name[..name.len() - ext.len() - 1], Some(ext)),
        None => (name, None),
    };

    let mut cleaned = String::with_capacity(stem.len());
    for c in stem.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '_'
        };
        // A run of dots would read as traversal to the sanitizer.
        if c == '.' && cleaned.ends_with('.') {
            continue;
        }
        cleaned.push(c);
    }
    // Keys must start with an alphanumeric character.
    let stem = cleaned.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
    let stem = if stem.is_empty() { "file" } else { stem };

    let now = Utc::now().timestamp();
    let previous = LAST_UPLOAD_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    let stamp = now.max(previous + 1);

    match extension {
        Some(ext) => format!("{}-{}.{}", stem, stamp, ext),
        None => format!("{}-{}", stem, stamp),
    }
}
