//! Request-level checks shared by the API handlers.
//!
//! These run before the catalog is called: shape and length limits, a known
//! disk name, and the malicious-path boundary check.

use super::context::ClientContext;
use crate::{errors::AppError, services::catalog_service::FileCatalogService};
use axum::{Json, extract::rejection::JsonRejection};

pub const MAX_PATH_LEN: usize = 500;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_PAGE: usize = 1000;
pub const MAX_PER_PAGE: usize = 100;
pub const DEFAULT_PER_PAGE: usize = crate::models::pagination::DEFAULT_PER_PAGE;

/// Unwrap a JSON body, turning extractor rejections into validation errors.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

pub fn require_disk(catalog: &FileCatalogService, disk: &str) -> Result<(), AppError> {
    if disk.trim().is_empty() || !catalog.settings().has_disk(disk) {
        return Err(AppError::validation("Invalid storage disk specified."));
    }
    Ok(())
}

/// A non-empty path within the length limit that passes the boundary check.
pub fn require_path(ctx: &ClientContext, field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("The {} field is required.", field)));
    }
    optional_path(ctx, field, Some(value))
}

pub fn optional_path(ctx: &ClientContext, field: &str, value: Option<&str>) -> Result<(), AppError> {
    let Some(value) = value else {
        return Ok(());
    };
    if value.chars().count() > MAX_PATH_LEN {
        return Err(AppError::validation(format!(
            "The {} may not be longer than {} characters.",
            field, MAX_PATH_LEN
        )));
    }
    ctx.reject_malicious(field, value)
}

pub fn require_name(value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation("The new name field is required."));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "The new name may not be longer than {} characters.",
            MAX_NAME_LEN
        )));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(AppError::validation("New name cannot contain path separators."));
    }
    Ok(())
}

/// Resolve `page`/`per_page`, defaulting to the first page of 50.
pub fn page_bounds(page: Option<usize>, per_page: Option<usize>) -> Result<(usize, usize), AppError> {
    let page = page.unwrap_or(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
    if !(1..=MAX_PAGE).contains(&page) {
        return Err(AppError::validation(format!(
            "The page must be between 1 and {}.",
            MAX_PAGE
        )));
    }
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(AppError::validation(format!(
            "The per page must be between 1 and {}.",
            MAX_PER_PAGE
        )));
    }
    Ok((page, per_page))
}
