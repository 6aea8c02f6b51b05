use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use stockroom_auth::permissions;
use stockroom_core::ProductId;
use stockroom_products::{NewProduct, ProductPatch};

use crate::app::errors::{domain_error_to_response, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

const CATALOG_WRITE: &[&str] = &[permissions::MANAGE_WAREHOUSES, permissions::EDIT_ALL];

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).patch(update_product).delete(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    match services.catalog.list_products().await {
        Ok(products) => Json(serde_json::json!({ "products": products })).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    let id: ProductId = match parse_id(&id, "product") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.get_product(id).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewProduct>,
) -> Response {
    if let Err(res) = authz::require(&principal, CATALOG_WRITE) {
        return res;
    }
    match services.catalog.create_product(body).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Response {
    if let Err(res) = authz::require(&principal, CATALOG_WRITE) {
        return res;
    }
    let id: ProductId = match parse_id(&id, "product") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.update_product(id, patch).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, CATALOG_WRITE) {
        return res;
    }
    let id: ProductId = match parse_id(&id, "product") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_to_response(e),
    }
}
