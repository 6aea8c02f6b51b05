use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
};

use stockroom_auth::permissions;
use stockroom_core::{ProductId, WarehouseId};
use stockroom_infra::InventoryFilter;
use stockroom_inventory::{InventoryPatch, NewInventoryRecord};

use crate::app::errors::{outcome_response, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_inventory).post(add_inventory))
        .route(
            "/:product_id/:warehouse_id",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/:product_id/:warehouse_id/quantity", get(get_quantity))
}

fn pair(product_id: &str, warehouse_id: &str) -> Result<(ProductId, WarehouseId), Response> {
    Ok((parse_id(product_id, "product")?, parse_id(warehouse_id, "warehouse")?))
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<InventoryFilter>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    outcome_response(services.inventory.list_inventory(filter).await, StatusCode::OK)
}

pub async fn add_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewInventoryRecord>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::ADD_INVENTORY]) {
        return res;
    }
    let outcome = services
        .inventory
        .add_inventory(body, Some(principal.user_id()))
        .await;
    outcome_response(outcome, StatusCode::CREATED)
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((product_id, warehouse_id)): Path<(String, String)>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    let (product_id, warehouse_id) = match pair(&product_id, &warehouse_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };
    outcome_response(
        services.inventory.get_inventory_item(product_id, warehouse_id).await,
        StatusCode::OK,
    )
}

pub async fn get_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((product_id, warehouse_id)): Path<(String, String)>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    let (product_id, warehouse_id) = match pair(&product_id, &warehouse_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };
    outcome_response(
        services.inventory.get_quantity(product_id, warehouse_id).await,
        StatusCode::OK,
    )
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((product_id, warehouse_id)): Path<(String, String)>,
    Json(patch): Json<InventoryPatch>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::EDIT_INVENTORY]) {
        return res;
    }
    let (product_id, warehouse_id) = match pair(&product_id, &warehouse_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };
    let outcome = services
        .inventory
        .update_inventory(product_id, warehouse_id, patch, Some(principal.user_id()))
        .await;
    outcome_response(outcome, StatusCode::OK)
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((product_id, warehouse_id)): Path<(String, String)>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::EDIT_INVENTORY]) {
        return res;
    }
    let (product_id, warehouse_id) = match pair(&product_id, &warehouse_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };
    let outcome = services
        .inventory
        .delete_inventory(product_id, warehouse_id, Some(principal.user_id()))
        .await;
    outcome_response(outcome, StatusCode::OK)
}
