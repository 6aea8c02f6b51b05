//! Consistent JSON error and outcome responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use stockroom_core::{DomainError, ErrorKind, Outcome};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound | ErrorKind::ProductNotInSource => StatusCode::NOT_FOUND,
        ErrorKind::InsufficientStock | ErrorKind::NegativeResultRejected => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::DuplicateEntry => StatusCode::CONFLICT,
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render an outcome, keeping the `success:false` body on failure.
pub fn outcome_response<T: Serialize>(outcome: Outcome<T>, success: StatusCode) -> Response {
    let status = match outcome.error {
        Some(kind) => status_for(kind),
        None if outcome.success => success,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(outcome)).into_response()
}

/// Render a catalog error in the same envelope shape as a failed outcome.
pub fn domain_error_to_response(err: DomainError) -> Response {
    let kind = err.kind();
    (
        status_for(kind),
        Json(json!({
            "success": false,
            "message": err.to_string(),
            "error": kind,
        })),
    )
        .into_response()
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path segment into a typed id.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::ProductId;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(status_for(ErrorKind::ProductNotInSource), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::InsufficientStock), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::DuplicateEntry), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::ValidationError), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn failed_outcome_uses_error_status() {
        let outcome: Outcome<()> = Outcome::failed(&DomainError::not_found("nope"));
        let res = outcome_response(outcome, StatusCode::OK);
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let res = parse_id::<ProductId>("not-a-uuid", "product").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(parse_id::<ProductId>(&ProductId::new().to_string(), "product").is_ok());
    }
}
