//! Capability interface over an S3-compatible object store.
//!
//! The catalog never talks to a concrete SDK; it resolves a disk to an
//! [`ObjectStoreGateway`] through a [`StoreConnector`] and drives everything
//! through the trait. Two adapters ship with the service:
//! - [`s3::S3ObjectStore`] speaks the S3 REST API with SigV4 signing.
//! - [`memory::MemoryObjectStore`] keeps objects in process memory.
//!
//! Folder paths passed to the listing methods carry no trailing slash and `""`
//! denotes the bucket root. Returned keys and folder paths are full paths.

pub mod memory;
pub mod s3;

use crate::config::DiskConfig;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;

/// Marker object that keeps an otherwise empty folder visible.
pub const FOLDER_MARKER: &str = ".folder";

/// Store-layer failures, classified by what went wrong on the wire.
///
/// Retry decisions are made on these variants rather than on message text.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("could not resolve store host: {0}")]
    Dns(String),
    #[error("invalid store endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("connection refused: {0}")]
    ConnectionRefused(String),
    #[error("store request timed out: {0}")]
    Timeout(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("store responded with HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Canned ACL applied to written objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_acl(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public-read",
        }
    }
}

/// Operations the catalog needs from an object store, scoped to one bucket.
#[async_trait]
pub trait ObjectStoreGateway: Send + Sync {
    /// Write `body` at `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Bytes, visibility: Visibility) -> GatewayResult<bool>;

    /// Remove `key`. Returns `false` when the store reports nothing was deleted.
    async fn delete(&self, key: &str) -> GatewayResult<bool>;

    async fn exists(&self, key: &str) -> GatewayResult<bool>;

    async fn size(&self, key: &str) -> GatewayResult<u64>;

    async fn last_modified(&self, key: &str) -> GatewayResult<DateTime<Utc>>;

    async fn mime_type(&self, key: &str) -> GatewayResult<String>;

    /// Every key beneath `folder` (recursively), or the whole bucket for `None`,
    /// in the store's listing order.
    async fn list_all_keys(&self, folder: Option<&str>) -> GatewayResult<Vec<String>>;

    /// Keys stored directly inside `folder`.
    async fn list_files(&self, folder: &str) -> GatewayResult<Vec<String>>;

    /// Paths of the folders directly inside `folder`.
    async fn list_directories(&self, folder: &str) -> GatewayResult<Vec<String>>;

    async fn copy_object(&self, from: &str, to: &str) -> GatewayResult<bool>;

    async fn move_object(&self, from: &str, to: &str) -> GatewayResult<bool>;

    /// Time-limited GET URL for `key`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> GatewayResult<String>;
}

/// Builds a gateway for a validated disk configuration.
pub trait StoreConnector: Send + Sync {
    fn connect(&self, disk: &str, config: &DiskConfig)
    -> GatewayResult<Arc<dyn ObjectStoreGateway>>;
}

/// Serves every disk from its own process-local [`memory::MemoryObjectStore`].
#[derive(Default)]
pub struct MemoryConnector {
    stores: Mutex<HashMap<String, Arc<memory::MemoryObjectStore>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct handle to a disk's store, created on first use.
    pub fn store(&self, disk: &str) -> Arc<memory::MemoryObjectStore> {
        self.stores
            .lock()
            .entry(disk.to_string())
            .or_insert_with(|| Arc::new(memory::MemoryObjectStore::new(disk)))
            .clone()
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(
        &self,
        disk: &str,
        _config: &DiskConfig,
    ) -> GatewayResult<Arc<dyn ObjectStoreGateway>> {
        let store: Arc<dyn ObjectStoreGateway> = self.store(disk);
        Ok(store)
    }
}
