//! Folder endpoints. Every operation here spans all keys under a prefix and
//! is not atomic: a failure part-way leaves earlier keys where they landed.

use super::{
    context::ClientContext,
    file_handlers::{TransferRequest, check_transfer},
    validation::{json_body, require_disk, require_name, require_path},
};
use crate::{errors::AppError, services::catalog_service::FileCatalogService};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct FolderRequest {
    pub folder_path: String,
    pub disk: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameFolderRequest {
    pub folder_path: String,
    pub new_name: String,
    pub disk: String,
}

/// `DELETE folder`
pub async fn delete_folder(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<FolderRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;
    require_path(&ctx, "folder_path", &req.folder_path)?;

    catalog.delete_folder(&req.disk, &req.folder_path).await?;
    Ok(Json(json!({ "success": true, "message": "Folder deleted successfully" })))
}

/// `POST rename-folder`
pub async fn rename_folder(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<RenameFolderRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;
    require_path(&ctx, "folder_path", &req.folder_path)?;
    require_name(&req.new_name)?;
    ctx.reject_malicious("new_name", &req.new_name)?;

    let new_path = catalog
        .rename_folder(&req.disk, &req.folder_path, &req.new_name)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Folder renamed successfully",
        "new_path": new_path,
    })))
}

/// `POST move-folder`
pub async fn move_folder(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    check_transfer(&catalog, &ctx, &req)?;

    catalog
        .move_folder(&req.disk, &req.source_path, &req.destination_path)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Folder moved successfully" })))
}

/// `POST copy-folder`
pub async fn copy_folder(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    check_transfer(&catalog, &ctx, &req)?;

    catalog
        .copy_folder(&req.disk, &req.source_path, &req.destination_path)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Folder copied successfully" })))
}

/// `POST create-folder`
pub async fn create_folder(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<FolderRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;
    require_path(&ctx, "folder_path", &req.folder_path)?;

    let folder_path = catalog.create_folder(&req.disk, &req.folder_path).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Folder created successfully",
        "folder_path": folder_path,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{catalog_with, ctx};
    use axum::http::StatusCode;

    fn folder(path: &str) -> Result<Json<FolderRequest>, JsonRejection> {
        Ok(Json(FolderRequest {
            folder_path: path.into(),
            disk: "media".into(),
        }))
    }

    #[tokio::test]
    async fn create_then_delete_folder() {
        let (catalog, store) = catalog_with(&[]).await;
        let Json(body) = create_folder(State(catalog.clone()), ctx(), folder("reports"))
            .await
            .unwrap();
        assert_eq!(body["folder_path"], "reports");
        assert_eq!(store.keys(), vec!["reports/.folder"]);

        let err = create_folder(State(catalog.clone()), ctx(), folder("reports"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.error_type, "conflict");

        delete_folder(State(catalog), ctx(), folder("reports"))
            .await
            .unwrap();
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn rename_move_and_copy_folders() {
        let (catalog, store) = catalog_with(&["src/a.txt", "src/b/c.txt"]).await;

        let Json(body) = rename_folder(
            State(catalog.clone()),
            ctx(),
            Ok(Json(RenameFolderRequest {
                folder_path: "src".into(),
                new_name: "lib".into(),
                disk: "media".into(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(body["new_path"], "lib");

        let transfer = |source: &str, destination: &str| {
            Ok(Json(TransferRequest {
                source_path: source.into(),
                destination_path: destination.into(),
                disk: "media".into(),
            }))
        };
        copy_folder(State(catalog.clone()), ctx(), transfer("lib", "backup"))
            .await
            .unwrap();
        move_folder(State(catalog.clone()), ctx(), transfer("backup", "archive/backup"))
            .await
            .unwrap();
        assert_eq!(
            store.keys(),
            vec![
                "archive/backup/a.txt",
                "archive/backup/b/c.txt",
                "lib/a.txt",
                "lib/b/c.txt"
            ]
        );

        let err = move_folder(State(catalog), ctx(), transfer("lib", "lib/inner"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_a_missing_folder_is_404() {
        let (catalog, _) = catalog_with(&["other/x.txt"]).await;
        let err = delete_folder(State(catalog), ctx(), folder("ghost"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
