use std::sync::Arc;

use axum::{Router, extract::Extension, http::StatusCode, response::Response, routing::get};

use stockroom_auth::permissions;

use crate::app::errors::outcome_response;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/capacity", get(capacity))
        .route("/distribution", get(distribution))
        .route("/dashboard", get(dashboard))
}

pub async fn capacity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_REPORTS]) {
        return res;
    }
    outcome_response(services.warehouses.capacity_report().await, StatusCode::OK)
}

pub async fn distribution(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_REPORTS]) {
        return res;
    }
    outcome_response(services.warehouses.optimize_distribution().await, StatusCode::OK)
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_REPORTS]) {
        return res;
    }
    outcome_response(services.forecasts.dashboard_summary().await, StatusCode::OK)
}
