//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that validates every configured disk

use crate::services::catalog_service::FileCatalogService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::BTreeMap;

/// `GET /healthz`
///
/// Always 200; performs no I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Checks each disk's configuration the same way the catalog does before an
/// operation. HTTP 200 when every disk is usable, 503 otherwise (including
/// when no disk is configured at all).
pub async fn readyz(State(catalog): State<FileCatalogService>) -> impl IntoResponse {
    let settings = catalog.settings();

    let checks: BTreeMap<String, CheckStatus> = settings
        .disks
        .iter()
        .map(|(name, disk)| {
            let check = match disk.validate(name) {
                Ok(()) => CheckStatus {
                    ok: true,
                    error: None,
                },
                Err(err) => CheckStatus {
                    ok: false,
                    error: Some(err.to_string()),
                },
            };
            (name.clone(), check)
        })
        .collect();

    let overall_ok = !checks.is_empty() && checks.values().all(|check| check.ok);
    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: BTreeMap<String, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
