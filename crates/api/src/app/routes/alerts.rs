use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use stockroom_auth::permissions;
use stockroom_core::AlertId;

use crate::app::dto::AlertQuery;
use crate::app::errors::{domain_error_to_response, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_alerts))
        .route("/scan", post(scan))
        .route("/:id/read", post(mark_read))
}

pub async fn list_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<AlertQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_ALERTS]) {
        return res;
    }
    match services.alerts.list(query.unread_only).await {
        Ok(alerts) => Json(serde_json::json!({ "alerts": alerts })).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::VIEW_ALERTS]) {
        return res;
    }
    let id: AlertId = match parse_id(&id, "alert") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.alerts.mark_read(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn scan(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::EDIT_INVENTORY]) {
        return res;
    }
    match services.alerts.scan_stock_alerts().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}
