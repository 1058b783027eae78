use crate::services::{
    catalog_service::{CatalogError, Operation},
    retry::is_retryable,
};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Error returned by every API handler.
///
/// Renders as `{success: false, message, error_type, retryable?}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub error_type: String,
    pub retryable: Option<bool>,
}

impl AppError {
    pub fn new(status: StatusCode, error_type: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            error_type: error_type.into(),
            retryable: None,
        }
    }

    /// 400 for input that failed validation.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation", msg)
    }

    pub fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "Too many requests. Please slow down.",
        )
        .with_retryable(true)
    }

    /// Generic 500; the detail stays in the logs.
    pub fn unexpected() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unexpected",
            "An unexpected error occurred. Please try again later.",
        )
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "message": self.message,
            "error_type": self.error_type,
        });
        if let Some(retryable) = self.retryable {
            body["retryable"] = retryable.into();
        }

        (self.status, Json(body)).into_response()
    }
}

fn failure_type(operation: Operation) -> &'static str {
    match operation {
        Operation::Upload => "upload_failed",
        Operation::List => "list_failed",
        Operation::Preview => "preview_failed",
        Operation::Metadata => "metadata_failed",
        Operation::Delete => "delete_failed",
        Operation::Rename => "rename_failed",
        Operation::Move => "move_failed",
        Operation::Copy => "copy_failed",
        Operation::Create => "create_failed",
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => AppError::validation(msg),
            CatalogError::NotFound(what) => {
                AppError::new(StatusCode::NOT_FOUND, "not_found", format!("The {} was not found", what))
            }
            CatalogError::AlreadyExists(what) => AppError::new(
                StatusCode::CONFLICT,
                "conflict",
                format!("A {} already exists", what),
            ),
            CatalogError::Configuration(err) => {
                tracing::error!(error = %err, "storage configuration error");
                AppError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration",
                    format!("Storage is misconfigured: {}", err),
                )
                .with_retryable(false)
            }
            CatalogError::StoreMisconfigured { operation, source } => {
                tracing::error!(%operation, error = %source, "object store endpoint misconfigured");
                AppError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration",
                    format!("Storage is misconfigured: {}", source),
                )
                .with_retryable(false)
            }
            CatalogError::Connectivity { operation, source } => {
                tracing::error!(%operation, error = %source, "object store unreachable");
                AppError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "s3_connection",
                    "Unable to connect to storage. Please try again shortly.",
                )
                .with_retryable(is_retryable(&source))
            }
            CatalogError::OperationFailed { operation, reason } => {
                tracing::error!(%operation, reason = %reason, "storage operation failed");
                AppError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    failure_type(operation),
                    format!("The {} operation failed: {}", operation, reason),
                )
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::validation(format!("Malformed upload: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ConfigError, services::object_store::GatewayError};

    #[test]
    fn maps_catalog_errors_to_statuses() {
        let cases = [
            (CatalogError::Validation("bad".into()), StatusCode::BAD_REQUEST, "validation"),
            (CatalogError::NotFound("file `a`".into()), StatusCode::NOT_FOUND, "not_found"),
            (CatalogError::AlreadyExists("file `a`".into()), StatusCode::CONFLICT, "conflict"),
            (
                CatalogError::OperationFailed {
                    operation: Operation::Rename,
                    reason: "x".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "rename_failed",
            ),
            (
                CatalogError::Configuration(ConfigError::UnknownDisk("d".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration",
            ),
        ];
        for (err, status, error_type) in cases {
            let app = AppError::from(err);
            assert_eq!(app.status, status);
            assert_eq!(app.error_type, error_type);
        }
    }

    #[test]
    fn connectivity_is_retryable_503() {
        let app = AppError::from(CatalogError::Connectivity {
            operation: Operation::List,
            source: GatewayError::Timeout("slow".into()),
        });
        assert_eq!(app.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(app.error_type, "s3_connection");
        assert_eq!(app.retryable, Some(true));

        let config = AppError::from(CatalogError::Configuration(ConfigError::MissingBucket("d".into())));
        assert_eq!(config.retryable, Some(false));
    }

    #[test]
    fn unreachable_endpoints_are_configuration_errors() {
        for source in [
            GatewayError::InvalidEndpoint("not a url".into()),
            GatewayError::Dns("no such host".into()),
        ] {
            let app = AppError::from(CatalogError::StoreMisconfigured {
                operation: Operation::List,
                source,
            });
            assert_eq!(app.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(app.error_type, "configuration");
            assert_eq!(app.retryable, Some(false));
        }
    }
}
