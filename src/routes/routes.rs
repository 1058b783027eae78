//! Defines routes for the file-browser API.
//!
//! ## Structure
//! - **Probes** (mounted at root)
//!   - `GET  /healthz`, `GET /readyz`
//!
//! - **Browse** (under `route_prefix`, default `/api/s3-files`)
//!   - `POST folder-contents`, `POST preview-url`
//!   - `POST folder-structure`, `POST folder-tree`
//!
//! - **Files**
//!   - `POST upload` (multipart), `DELETE file`
//!   - `POST rename-file`, `POST move-file`, `POST copy-file`
//!
//! - **Folders**
//!   - `DELETE folder`, `POST create-folder`
//!   - `POST rename-folder`, `POST move-folder`, `POST copy-folder`
//!
//! Every API route has its own per-IP limiter; uploads use the tighter limit
//! and a body cap derived from `max_file_size`.

use super::middleware::{RateLimiter, catch_panics, enforce_rate_limit};
use crate::{
    config::FileManagerConfig,
    handlers::{
        browse_handlers::{folder_contents, folder_structure, folder_tree, preview_url},
        file_handlers::{copy_file, delete_file, move_file, rename_file, upload_file},
        folder_handlers::{copy_folder, create_folder, delete_folder, move_folder, rename_folder},
        health_handlers::{healthz, readyz},
    },
    services::catalog_service::FileCatalogService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{MethodRouter, delete, get, post},
};

/// Room for multipart framing and the text fields around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the router. The caller supplies the `FileCatalogService` state.
pub fn routes(settings: &FileManagerConfig) -> Router<FileCatalogService> {
    let default_limit = settings.rate_limits.default_per_minute;
    let upload_limit = settings.rate_limits.upload_per_minute;
    let upload_body_limit = usize::try_from(settings.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let limited = |route: MethodRouter<FileCatalogService>, per_minute: u32| {
        route.layer(middleware::from_fn_with_state(
            RateLimiter::per_minute(per_minute, &settings.trusted_proxies),
            enforce_rate_limit,
        ))
    };

    let api = Router::new()
        .route("/folder-contents", limited(post(folder_contents), default_limit))
        .route("/preview-url", limited(post(preview_url), default_limit))
        .route("/folder-structure", limited(post(folder_structure), default_limit))
        .route("/folder-tree", limited(post(folder_tree), default_limit))
        .route(
            "/upload",
            limited(post(upload_file), upload_limit).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/file", limited(delete(delete_file), default_limit))
        .route("/folder", limited(delete(delete_folder), default_limit))
        .route("/rename-file", limited(post(rename_file), default_limit))
        .route("/rename-folder", limited(post(rename_folder), default_limit))
        .route("/move-file", limited(post(move_file), default_limit))
        .route("/move-folder", limited(post(move_folder), default_limit))
        .route("/copy-file", limited(post(copy_file), default_limit))
        .route("/copy-folder", limited(post(copy_folder), default_limit))
        .route("/create-folder", limited(post(create_folder), default_limit));

    let probes = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz));

    let prefix = settings.route_prefix.trim().trim_end_matches('/');
    let router = if prefix.is_empty() {
        probes.merge(api)
    } else if prefix.starts_with('/') {
        probes.nest(prefix, api)
    } else {
        probes.nest(&format!("/{}", prefix), api)
    };

    router.layer(middleware::from_fn(catch_panics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::catalog_with;
    use std::net::{IpAddr, SocketAddr};
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });
        format!("http://{}", addr)
    }

    async fn app_trusting(default_per_minute: u32, trusted_proxies: &[IpAddr]) -> String {
        let (catalog, _) = catalog_with(&["docs/a.txt"]).await;
        let mut settings = catalog.settings().clone();
        settings.rate_limits.default_per_minute = default_per_minute;
        settings.trusted_proxies = trusted_proxies.to_vec();
        serve(routes(&settings).with_state(catalog)).await
    }

    async fn app(default_per_minute: u32) -> String {
        app_trusting(default_per_minute, &[]).await
    }

    async fn post_json(base: &str, path: &str, body: &str) -> (u16, serde_json::Value) {
        post_json_from(base, path, body, None).await
    }

    async fn post_json_from(
        base: &str,
        path: &str,
        body: &str,
        forwarded_for: Option<&str>,
    ) -> (u16, serde_json::Value) {
        let mut request = reqwest::Client::new()
            .post(format!("{}{}", base, path))
            .header("content-type", "application/json")
            .body(body.to_string());
        if let Some(chain) = forwarded_for {
            request = request.header("x-forwarded-for", chain);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        let text = response.text().await.unwrap();
        (status, serde_json::from_str(&text).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn api_is_mounted_under_the_prefix() {
        let base = app(60).await;
        let (status, body) = post_json(
            &base,
            "/api/s3-files/folder-contents",
            r#"{"folder_path":"docs","disk":"media"}"#,
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["files"][0]["path"], "docs/a.txt");

        let health = reqwest::get(format!("{}/healthz", base)).await.unwrap();
        assert_eq!(health.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let base = app(60).await;
        let (status, body) = post_json(&base, "/api/s3-files/preview-url", r#"{"disk":"media"}"#).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_type"], "validation");
    }

    #[tokio::test]
    async fn routes_are_rate_limited_per_route() {
        let base = app(2).await;
        let request = r#"{"disk":"media"}"#;
        for _ in 0..2 {
            let (status, _) = post_json(&base, "/api/s3-files/folder-tree", request).await;
            assert_eq!(status, 200);
        }
        let (status, body) = post_json(&base, "/api/s3-files/folder-tree", request).await;
        assert_eq!(status, 429);
        assert_eq!(body["error_type"], "rate_limited");

        let (status, _) = post_json(&base, "/api/s3-files/folder-structure", request).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn rotating_forwarded_for_does_not_escape_the_limit() {
        let base = app(2).await;
        let request = r#"{"disk":"media"}"#;
        let mut statuses = Vec::new();
        for i in 0..5 {
            let chain = format!("10.9.9.{}", i);
            let (status, _) =
                post_json_from(&base, "/api/s3-files/folder-tree", request, Some(&chain)).await;
            statuses.push(status);
        }
        assert_eq!(statuses, vec![200, 200, 429, 429, 429]);
    }

    #[tokio::test]
    async fn trusted_proxy_limits_each_forwarded_client() {
        let base = app_trusting(1, &[IpAddr::from([127, 0, 0, 1])]).await;
        let request = r#"{"disk":"media"}"#;
        let path = "/api/s3-files/folder-tree";

        let (status, _) = post_json_from(&base, path, request, Some("203.0.113.1")).await;
        assert_eq!(status, 200);
        let (status, _) = post_json_from(&base, path, request, Some("203.0.113.1")).await;
        assert_eq!(status, 429);
        let (status, _) = post_json_from(&base, path, request, Some("203.0.113.2")).await;
        assert_eq!(status, 200);
    }

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn panics_become_unexpected_errors() {
        let router = Router::new()
            .route("/boom", get(explode))
            .layer(middleware::from_fn(catch_panics));
        let base = serve(router).await;

        let response = reqwest::get(format!("{}/boom", base)).await.unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let body: serde_json::Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(body["error_type"], "unexpected");
    }
}
