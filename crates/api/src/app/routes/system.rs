use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use stockroom_auth::Permission;

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    let permissions: Vec<String> = principal
        .principal()
        .permissions()
        .iter()
        .map(|p: &Permission| p.as_str().to_string())
        .collect();
    Json(serde_json::json!({
        "user_id": principal.user_id().to_string(),
        "role": principal.role().as_str(),
        "permissions": permissions,
    }))
}
