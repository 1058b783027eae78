//! Read-only endpoints: folder pages, preview URLs and whole-disk views.

use super::{
    context::ClientContext,
    validation::{json_body, optional_path, page_bounds, require_disk, require_path},
};
use crate::{
    errors::AppError, models::FileType, services::catalog_service::FileCatalogService,
};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct FolderContentsRequest {
    pub folder_path: Option<String>,
    pub disk: String,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub file_path: String,
    pub disk: String,
}

#[derive(Debug, Deserialize)]
pub struct DiskRequest {
    pub disk: String,
}

/// `POST folder-contents`
pub async fn folder_contents(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<FolderContentsRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;
    optional_path(&ctx, "folder_path", req.folder_path.as_deref())?;
    let (page, per_page) = page_bounds(req.page, req.per_page)?;

    let contents = catalog
        .list_files_in_folder(
            &req.disk,
            req.folder_path.as_deref().unwrap_or_default(),
            page,
            per_page,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "files": contents.files,
        "directories": contents.directories,
        "pagination": contents.pagination,
    })))
}

/// `POST preview-url`
pub async fn preview_url(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;
    require_path(&ctx, "file_path", &req.file_path)?;

    let url = catalog
        .generate_presigned_url(&req.disk, &req.file_path)
        .await?;
    let metadata = catalog.get_file_metadata(&req.disk, &req.file_path).await?;

    Ok(Json(json!({
        "success": true,
        "url": url,
        "type": FileType::from_path(&req.file_path),
        "metadata": metadata,
        "expires_in": catalog.settings().presigned_url_expiration,
    })))
}

/// `POST folder-structure`
pub async fn folder_structure(
    State(catalog): State<FileCatalogService>,
    payload: Result<Json<DiskRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;

    let listing = catalog.list_files_with_folders(&req.disk).await?;
    Ok(Json(json!({
        "success": true,
        "folders": listing.folders,
        "files": listing.files,
    })))
}

/// `POST folder-tree`
pub async fn folder_tree(
    State(catalog): State<FileCatalogService>,
    payload: Result<Json<DiskRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;

    let tree = catalog.get_folder_tree(&req.disk).await?;
    Ok(Json(json!({ "success": true, "tree": tree })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{catalog_with, ctx};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn lists_a_folder_page() {
        let (catalog, _) = catalog_with(&["docs/a.txt", "docs/sub/b.txt"]).await;
        let Json(body) = folder_contents(
            State(catalog),
            ctx(),
            Ok(Json(FolderContentsRequest {
                folder_path: Some("docs".into()),
                disk: "media".into(),
                page: None,
                per_page: None,
            })),
        )
        .await
        .unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(body["directories"][0]["path"], "docs/sub");
        assert_eq!(body["files"][0]["name"], "a.txt");
        assert_eq!(body["files"][0]["type"], "document");
        assert_eq!(body["pagination"]["total"], 2);
        assert_eq!(body["pagination"]["per_page"], 50);
    }

    #[tokio::test]
    async fn rejects_unknown_disk_and_malicious_folder() {
        let (catalog, _) = catalog_with(&[]).await;
        let err = folder_contents(
            State(catalog.clone()),
            ctx(),
            Ok(Json(FolderContentsRequest {
                folder_path: None,
                disk: "elsewhere".into(),
                page: None,
                per_page: None,
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid storage disk specified.");

        let err = folder_contents(
            State(catalog),
            ctx(),
            Ok(Json(FolderContentsRequest {
                folder_path: Some("docs/%2e%2e/secret".into()),
                disk: "media".into(),
                page: None,
                per_page: None,
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn preview_includes_type_metadata_and_expiry() {
        let (catalog, _) = catalog_with(&["photos/cat.png"]).await;
        let Json(body) = preview_url(
            State(catalog),
            ctx(),
            Ok(Json(PreviewRequest {
                file_path: "photos/cat.png".into(),
                disk: "media".into(),
            })),
        )
        .await
        .unwrap();

        assert_eq!(body["type"], "image");
        assert_eq!(body["metadata"]["exists"], true);
        assert_eq!(body["expires_in"], 3600);
        assert!(body["url"].as_str().unwrap().starts_with("memory://media/"));
    }

    #[tokio::test]
    async fn preview_of_missing_file_is_404() {
        let (catalog, _) = catalog_with(&[]).await;
        let err = preview_url(
            State(catalog),
            ctx(),
            Ok(Json(PreviewRequest {
                file_path: "nope.png".into(),
                disk: "media".into(),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn structure_and_tree() {
        let (catalog, _) = catalog_with(&["a/b/c.txt", "top.txt"]).await;
        let Json(structure) = folder_structure(
            State(catalog.clone()),
            Ok(Json(DiskRequest { disk: "media".into() })),
        )
        .await
        .unwrap();
        assert_eq!(structure["folders"].as_array().unwrap().len(), 2);
        assert_eq!(structure["files"][0]["path"], "top.txt");

        let Json(tree) = folder_tree(State(catalog), Ok(Json(DiskRequest { disk: "media".into() })))
            .await
            .unwrap();
        assert_eq!(tree["tree"][0]["name"], "a");
        assert_eq!(tree["tree"][0]["children"][0]["file_count"], 1);
    }
}
