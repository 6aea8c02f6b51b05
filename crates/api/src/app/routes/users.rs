use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use stockroom_auth::{NewUser, UserPatch, permissions};
use stockroom_core::UserId;

use crate::app::errors::{domain_error_to_response, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::MANAGE_USERS]) {
        return res;
    }
    match services.catalog.list_users().await {
        Ok(users) => Json(serde_json::json!({ "users": users })).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: UserId = match parse_id(&id, "user") {
        Ok(v) => v,
        Err(res) => return res,
    };
    // Everyone may read their own account.
    if id != principal.user_id() {
        if let Err(res) = authz::require(&principal, &[permissions::MANAGE_USERS]) {
            return res;
        }
    }
    match services.catalog.get_user(id).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewUser>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::MANAGE_USERS]) {
        return res;
    }
    match services.catalog.create_user(principal.role(), body).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::MANAGE_USERS]) {
        return res;
    }
    let id: UserId = match parse_id(&id, "user") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.update_user(principal.role(), id, patch).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &[permissions::MANAGE_USERS]) {
        return res;
    }
    let id: UserId = match parse_id(&id, "user") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.delete_user(principal.role(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_to_response(e),
    }
}
