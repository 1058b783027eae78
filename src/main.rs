use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use services::{
    catalog_service::FileCatalogService,
    object_store::{MemoryConnector, StoreConnector, s3::S3Connector},
};

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

/// Per-request timeout for calls to the object store.
const STORE_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse process config + file-manager settings ---
    let cfg = config::AppConfig::from_env_and_args()?;
    tracing::info!("Starting s3-file-browser with config: {:?}", cfg);

    let settings = Arc::new(config::FileManagerConfig::load(&cfg.config_path)?);
    for (name, disk) in &settings.disks {
        match disk.validate(name) {
            Ok(()) => tracing::info!(disk = %name, bucket = %disk.bucket, "disk configured"),
            Err(err) => tracing::warn!(disk = %name, error = %err, "disk is misconfigured"),
        }
    }

    // --- Object store connector ---
    let connector: Arc<dyn StoreConnector> = if cfg.in_memory {
        tracing::warn!("Serving every disk from process memory; nothing is persisted");
        Arc::new(MemoryConnector::new())
    } else {
        Arc::new(S3Connector::new(STORE_REQUEST_TIMEOUT)?)
    };

    // --- Initialize core service ---
    let catalog = FileCatalogService::new(settings.clone(), connector);

    // --- Build router ---
    let app: Router = routes::routes::routes(&settings).with_state(catalog);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        "Server listening on http://{}{}",
        listener.local_addr()?,
        settings.route_prefix
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
