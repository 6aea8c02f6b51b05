use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use stockroom_auth::permissions;
use stockroom_core::WarehouseId;
use stockroom_inventory::{NewWarehouse, WarehousePatch};

use crate::app::errors::{domain_error_to_response, outcome_response, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

const WAREHOUSE_WRITE: &[&str] = &[permissions::MANAGE_WAREHOUSES, permissions::EDIT_ALL];

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route("/:id", get(get_warehouse).patch(update_warehouse))
        .route("/:id/info", get(warehouse_info))
}

/// Warehouses with their totals and utilization.
pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    outcome_response(services.warehouses.list_warehouses().await, StatusCode::OK)
}

pub async fn get_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    let id: WarehouseId = match parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.get_warehouse(id).await {
        Ok(warehouse) => Json(warehouse).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn warehouse_info(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    let id: WarehouseId = match parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(res) => return res,
    };
    outcome_response(services.warehouses.warehouse_info(id).await, StatusCode::OK)
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewWarehouse>,
) -> Response {
    if let Err(res) = authz::require(&principal, WAREHOUSE_WRITE) {
        return res;
    }
    match services.catalog.create_warehouse(body).await {
        Ok(warehouse) => (StatusCode::CREATED, Json(warehouse)).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn update_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<WarehousePatch>,
) -> Response {
    if let Err(res) = authz::require(&principal, WAREHOUSE_WRITE) {
        return res;
    }
    let id: WarehouseId = match parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.update_warehouse(id, patch).await {
        Ok(warehouse) => Json(warehouse).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}
