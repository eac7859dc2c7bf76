use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use parcelhub_core::{DomainError, FieldErrors};
use parcelhub_infra::DispatchError;

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::InvalidFields(fields) => validation_error(fields),
        DispatchError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DispatchError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "warehouse not found"),
        DispatchError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Concurrency(msg) => json_error(
            StatusCode::CONFLICT,
            "conflict",
            format!("the account's warehouses changed concurrently, reload and retry ({msg})"),
        ),
        err @ (DispatchError::TenantIsolation(_) | DispatchError::Deserialize(_) | DispatchError::Store(_)) => {
            tracing::error!(error = %err, "warehouse store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    dispatch_error_to_response(err.into())
}

/// A body that is not the expected JSON shape is a validation failure, not a 422.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}

pub fn validation_error(fields: FieldErrors) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": fields.to_string(),
            "fields": fields,
        })),
    )
        .into_response()
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
