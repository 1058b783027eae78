//! File endpoints: upload, delete, rename, move and copy.

use super::{
    context::ClientContext,
    validation::{json_body, optional_path, require_disk, require_name, require_path},
};
use crate::{
    errors::AppError, models::FileType, services::catalog_service::FileCatalogService,
};
use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub file_path: String,
    pub disk: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameFileRequest {
    pub file_path: String,
    pub new_name: String,
    pub disk: String,
}

/// Body of the move and copy endpoints, for files and folders alike.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub source_path: String,
    pub destination_path: String,
    pub disk: String,
}

struct UploadForm {
    file_name: String,
    content_type: Option<String>,
    body: Bytes,
    folder_path: Option<String>,
    disk: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut folder_path = None;
    let mut disk = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let body = field.bytes().await?;
                file = Some((file_name, content_type, body));
            }
            Some("folder_path") => folder_path = Some(field.text().await?),
            Some("disk") => disk = Some(field.text().await?),
            _ => {}
        }
    }

    let (file_name, content_type, body) =
        file.ok_or_else(|| AppError::validation("The file field is required."))?;
    if file_name.trim().is_empty() {
        return Err(AppError::validation("The uploaded file has no name."));
    }

    Ok(UploadForm {
        file_name,
        content_type,
        body,
        folder_path: folder_path.filter(|path| !path.trim().is_empty()),
        disk: disk.filter(|disk| !disk.trim().is_empty()),
    })
}

/// `POST upload` (multipart: `file`, `folder_path?`, `disk?`)
pub async fn upload_file(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let form = read_upload_form(multipart).await?;
    let disk = form
        .disk
        .unwrap_or_else(|| catalog.settings().default_disk.clone());
    require_disk(&catalog, &disk)?;
    optional_path(&ctx, "folder_path", form.folder_path.as_deref())?;
    ctx.reject_unsafe_file_name(&form.file_name)?;

    let uploaded = catalog
        .upload(
            &disk,
            form.folder_path.as_deref(),
            &form.file_name,
            form.content_type.as_deref(),
            form.body,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "file": {
            "path": uploaded.key,
            "name": form.file_name,
            "size": uploaded.size,
            "type": FileType::from_path(&uploaded.key),
        },
        "message": "File uploaded successfully",
    })))
}

/// `DELETE file`
pub async fn delete_file(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;
    require_path(&ctx, "file_path", &req.file_path)?;

    catalog.delete_file(&req.disk, &req.file_path).await?;
    Ok(Json(json!({ "success": true, "message": "File deleted successfully" })))
}

/// `POST rename-file`
pub async fn rename_file(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<RenameFileRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    require_disk(&catalog, &req.disk)?;
    require_path(&ctx, "file_path", &req.file_path)?;
    require_name(&req.new_name)?;
    ctx.reject_malicious("new_name", &req.new_name)?;

    let new_path = catalog
        .rename_file(&req.disk, &req.file_path, &req.new_name)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "File renamed successfully",
        "new_path": new_path,
    })))
}

/// `POST move-file`
pub async fn move_file(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    check_transfer(&catalog, &ctx, &req)?;

    catalog
        .move_file(&req.disk, &req.source_path, &req.destination_path)
        .await?;
    Ok(Json(json!({ "success": true, "message": "File moved successfully" })))
}

/// `POST copy-file`
pub async fn copy_file(
    State(catalog): State<FileCatalogService>,
    ctx: ClientContext,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req = json_body(payload)?;
    check_transfer(&catalog, &ctx, &req)?;

    catalog
        .copy_file(&req.disk, &req.source_path, &req.destination_path)
        .await?;
    Ok(Json(json!({ "success": true, "message": "File copied successfully" })))
}

pub(super) fn check_transfer(
    catalog: &FileCatalogService,
    ctx: &ClientContext,
    req: &TransferRequest,
) -> Result<(), AppError> {
    require_disk(catalog, &req.disk)?;
    require_path(ctx, "source_path", &req.source_path)?;
    require_path(ctx, "destination_path", &req.destination_path)
}
