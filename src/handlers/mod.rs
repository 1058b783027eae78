//! HTTP handlers. Each one validates the request shape, runs the
//! malicious-path boundary check and hands off to `FileCatalogService`.

pub mod browse_handlers;
pub mod context;
pub mod file_handlers;
pub mod folder_handlers;
pub mod health_handlers;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support {
    use super::context::ClientContext;
    use crate::{
        config::{DiskConfig, FileManagerConfig},
        services::{
            catalog_service::FileCatalogService,
            object_store::{MemoryConnector, ObjectStoreGateway, Visibility, memory::MemoryObjectStore},
            retry::RetryPolicy,
        },
    };
    use axum::http::HeaderMap;
    use bytes::Bytes;
    use std::{sync::Arc, time::Duration};

    pub fn ctx() -> ClientContext {
        ClientContext::from_headers(&HeaderMap::new(), Some(([127, 0, 0, 1], 4000).into()))
    }

    /// Catalog over an in-memory `media` disk seeded with `keys`.
    pub async fn catalog_with(keys: &[&str]) -> (FileCatalogService, Arc<MemoryObjectStore>) {
        let mut settings = FileManagerConfig::default();
        settings.disks.insert(
            "media".into(),
            DiskConfig {
                bucket: "media-bucket".into(),
                ..DiskConfig::default()
            },
        );

        let connector = Arc::new(MemoryConnector::new());
        let store = connector.store("media");
        for key in keys {
            store
                .put(key, Bytes::from_static(b"data"), Visibility::Private)
                .await
                .unwrap();
        }

        let catalog = FileCatalogService::with_retry_policy(
            Arc::new(settings),
            connector,
            RetryPolicy::with_base_delay(Duration::from_millis(1)),
        );
        (catalog, store)
    }
}
