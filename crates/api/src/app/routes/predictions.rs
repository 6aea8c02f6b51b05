use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
};

use stockroom_auth::permissions;

use crate::app::dto::{DemandQuery, ReorderQuery};
use crate::app::errors::outcome_response;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/demand", get(demand))
        .route("/reorder", get(reorder))
}

pub async fn demand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<DemandQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_REPORTS]) {
        return res;
    }
    let outcome = services
        .forecasts
        .predict_demand(query.product_id, query.warehouse_id, query.days)
        .await;
    outcome_response(outcome, StatusCode::OK)
}

pub async fn reorder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<ReorderQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_REPORTS]) {
        return res;
    }
    let outcome = services
        .forecasts
        .reorder_recommendation(query.product_id, query.warehouse_id)
        .await;
    outcome_response(outcome, StatusCode::OK)
}
