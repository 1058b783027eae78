//! Process-local object store.
//!
//! Keys live in a `BTreeMap`, so listings come back in lexicographic order just
//! like an S3 ListObjectsV2 response. Used by `--in-memory` mode and by tests.

use super::{GatewayError, GatewayResult, ObjectStoreGateway, Visibility};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::{collections::BTreeMap, time::Duration};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

pub struct MemoryObjectStore {
    disk: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(disk: impl Into<String>) -> Self {
        Self {
            disk: disk.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    #[cfg(test)]
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    fn folder_prefix(folder: &str) -> String {
        let folder = folder.trim_end_matches('/');
        if folder.is_empty() {
            String::new()
        } else {
            format!("{}/", folder)
        }
    }

    fn with_object<T>(&self, key: &str, f: impl FnOnce(&StoredObject) -> T) -> GatewayResult<T> {
        self.objects
            .read()
            .get(key)
            .map(f)
            .ok_or_else(|| GatewayError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl ObjectStoreGateway for MemoryObjectStore {
    // Objects are never served directly, so visibility has no effect here.
    async fn put(&self, key: &str, body: Bytes, _visibility: Visibility) -> GatewayResult<bool> {
        let content_type = mime_guess::from_path(key)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type,
                last_modified: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> GatewayResult<bool> {
        Ok(self.objects.write().remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> GatewayResult<bool> {
        Ok(self.objects.read().contains_key(key))
    }

    async fn size(&self, key: &str) -> GatewayResult<u64> {
        self.with_object(key, |obj| obj.body.len() as u64)
    }

    async fn last_modified(&self, key: &str) -> GatewayResult<DateTime<Utc>> {
        self.with_object(key, |obj| obj.last_modified)
    }

    async fn mime_type(&self, key: &str) -> GatewayResult<String> {
        self.with_object(key, |obj| obj.content_type.clone())
    }

    async fn list_all_keys(&self, folder: Option<&str>) -> GatewayResult<Vec<String>> {
        let prefix = folder.map(Self::folder_prefix).unwrap_or_default();
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn list_files(&self, folder: &str) -> GatewayResult<Vec<String>> {
        let prefix = Self::folder_prefix(folder);
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|key| {
                key.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .cloned()
            .collect())
    }

    async fn list_directories(&self, folder: &str) -> GatewayResult<Vec<String>> {
        let prefix = Self::folder_prefix(folder);
        let mut directories: Vec<String> = Vec::new();
        for key in self.objects.read().keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if let Some((child, _)) = rest.split_once('/') {
                let path = format!("{}{}", prefix, child);
                if directories.last() != Some(&path) {
                    directories.push(path);
                }
            }
        }
        Ok(directories)
    }

    async fn copy_object(&self, from: &str, to: &str) -> GatewayResult<bool> {
        let mut objects = self.objects.write();
        let Some(source) = objects.get(from).cloned() else {
            return Ok(false);
        };
        objects.insert(
            to.to_string(),
            StoredObject {
                last_modified: Utc::now(),
                ..source
            },
        );
        Ok(true)
    }

    async fn move_object(&self, from: &str, to: &str) -> GatewayResult<bool> {
        let mut objects = self.objects.write();
        let Some(source) = objects.remove(from) else {
            return Ok(false);
        };
        objects.insert(to.to_string(), source);
        Ok(true)
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> GatewayResult<String> {
        if !self.objects.read().contains_key(key) {
            return Err(GatewayError::NotFound(key.to_string()));
        }
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let signature = md5::compute(format!("{}/{}:{}", self.disk, key, expires));
        Ok(format!(
            "memory://{}/{}?expires={}&signature={:x}",
            self.disk,
            urlencoding::encode(key),
            expires,
            signature
        ))
    }
}
