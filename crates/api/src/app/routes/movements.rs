use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
};

use stockroom_auth::permissions;
use stockroom_infra::MovementQuery;
use stockroom_inventory::ManualMovement;

use crate::app::errors::outcome_response;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_movements).post(record_movement))
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<MovementQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    outcome_response(services.inventory.list_movements(query).await, StatusCode::OK)
}

/// Manual IN/OUT/RETURN/DAMAGED entry. The acting user comes from the token.
pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(mut body): Json<ManualMovement>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::UPDATE_STOCK]) {
        return res;
    }
    body.user_id = Some(principal.user_id());
    outcome_response(services.inventory.record_movement(body).await, StatusCode::CREATED)
}
