use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::post,
};

use stockroom_auth::permissions;
use stockroom_inventory::AdjustmentRequest;

use crate::app::errors::outcome_response;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", post(adjust))
}

pub async fn adjust(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(mut body): Json<AdjustmentRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::UPDATE_STOCK]) {
        return res;
    }
    body.user_id = Some(principal.user_id());
    outcome_response(services.warehouses.adjust(body).await, StatusCode::OK)
}
