use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::post,
};

use stockroom_auth::permissions;
use stockroom_inventory::TransferRequest;

use crate::app::dto::TransferHistoryQuery;
use crate::app::errors::outcome_response;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", post(transfer).get(history))
}

pub async fn transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(mut body): Json<TransferRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::EDIT_INVENTORY]) {
        return res;
    }
    body.user_id = Some(principal.user_id());
    outcome_response(services.warehouses.transfer(body).await, StatusCode::OK)
}

pub async fn history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<TransferHistoryQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_INVENTORY]) {
        return res;
    }
    let outcome = services
        .warehouses
        .transfer_history(query.warehouse_id, query.days_back)
        .await;
    outcome_response(outcome, StatusCode::OK)
}
