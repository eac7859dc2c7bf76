use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AccountContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route("/pickup", post(resolve_pickup))
        .route(
            "/:id",
            get(get_warehouse).patch(update_warehouse).delete(delete_warehouse),
        )
        .route("/:id/default", post(set_default_warehouse))
        .route("/:id/active", put(set_warehouse_active))
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
) -> axum::response::Response {
    match services.warehouses.list(account.tenant_id()).await {
        Ok(items) => Json(dto::WarehouseList { items }).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_warehouse_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.warehouses.get(account.tenant_id(), id).await {
        Ok(warehouse) => Json(warehouse).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    body: Result<Json<dto::CreateWarehouseRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services
        .warehouses
        .create(account.tenant_id(), body.details, body.is_default)
        .await
    {
        Ok(warehouse) => (StatusCode::CREATED, Json(warehouse)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn update_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateWarehouseRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match dto::parse_warehouse_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services
        .warehouses
        .update(account.tenant_id(), id, body.into())
        .await
    {
        Ok(warehouse) => Json(warehouse).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn delete_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_warehouse_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.warehouses.delete(account.tenant_id(), id).await {
        Ok(()) => Json(dto::DeletedResponse { id, deleted: true }).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn set_default_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_warehouse_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.warehouses.set_default(account.tenant_id(), id).await {
        Ok(change) => Json(dto::DefaultChangedResponse::from(change)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn set_warehouse_active(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::SetActiveRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match dto::parse_warehouse_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services
        .warehouses
        .set_active(account.tenant_id(), id, body.active)
        .await
    {
        Ok(warehouse) => Json(warehouse).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// POST /warehouses/pickup: choose the pickup warehouse for a new shipment.
///
/// An empty body selects the account's default. Any other body must be a JSON
/// object that parses cleanly, otherwise nothing is recorded.
pub async fn resolve_pickup(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let body = match pickup_request(&headers, &body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let id = match body.warehouse_id.as_deref().map(dto::parse_warehouse_id).transpose() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.warehouses.resolve_pickup(account.tenant_id(), id).await {
        Ok(resolution) => Json(dto::PickupResponse::from(resolution)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

fn pickup_request(headers: &HeaderMap, body: &[u8]) -> Result<dto::ResolvePickupRequest, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(dto::ResolvePickupRequest::default());
    }
    if !has_json_content_type(headers) {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "expected request with `Content-Type: application/json`",
        ));
    }

    Json::<dto::ResolvePickupRequest>::from_bytes(body)
        .map(|Json(req)| req)
        .map_err(errors::json_rejection_to_response)
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}
