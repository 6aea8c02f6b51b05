use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use stockroom_auth::permissions;
use stockroom_core::SupplierId;
use stockroom_parties::{NewSupplier, SupplierPatch};

use crate::app::errors::{domain_error_to_response, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

const CATALOG_WRITE: &[&str] = &[permissions::MANAGE_WAREHOUSES, permissions::EDIT_ALL];

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/:id", get(get_supplier).patch(update_supplier).delete(delete_supplier))
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    match services.catalog.list_suppliers().await {
        Ok(suppliers) => Json(serde_json::json!({ "suppliers": suppliers })).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    let id: SupplierId = match parse_id(&id, "supplier") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.get_supplier(id).await {
        Ok(supplier) => Json(supplier).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewSupplier>,
) -> Response {
    if let Err(res) = authz::require(&principal, CATALOG_WRITE) {
        return res;
    }
    match services.catalog.create_supplier(body).await {
        Ok(supplier) => (StatusCode::CREATED, Json(supplier)).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<SupplierPatch>,
) -> Response {
    if let Err(res) = authz::require(&principal, CATALOG_WRITE) {
        return res;
    }
    let id: SupplierId = match parse_id(&id, "supplier") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.update_supplier(id, patch).await {
        Ok(supplier) => Json(supplier).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, CATALOG_WRITE) {
        return res;
    }
    let id: SupplierId = match parse_id(&id, "supplier") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.delete_supplier(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_to_response(e),
    }
}
