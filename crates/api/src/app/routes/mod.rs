use axum::{Router, routing::get};

pub mod system;
pub mod warehouses;

/// Router for all account-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/stream", get(system::stream))
        .nest("/warehouses", warehouses::router())
}
