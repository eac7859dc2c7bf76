use std::time::Instant;

use axum::{
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use parcelhub_core::TenantId;

use crate::app::errors::json_error;
use crate::context::AccountContext;

/// Header carrying the caller's account id (UUID).
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Resolve the account from [`ACCOUNT_HEADER`] or answer `401 account_required`.
pub async fn account_middleware(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let tenant_id = match extract_account(req.headers()) {
        Ok(id) => id,
        Err(message) => return json_error(StatusCode::UNAUTHORIZED, "account_required", message),
    };

    req.extensions_mut().insert(AccountContext::new(tenant_id));

    next.run(req).await
}

fn extract_account(headers: &HeaderMap) -> Result<TenantId, &'static str> {
    let value = headers
        .get(ACCOUNT_HEADER)
        .ok_or("missing X-Account-Id header")?;

    let value = value.to_str().map_err(|_| "X-Account-Id is not valid text")?;

    value.parse().map_err(|_| "X-Account-Id must be a UUID")
}

/// One log line per request with method, path, status and latency.
pub async fn log_requests(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );

    response
}
