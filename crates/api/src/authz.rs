//! API-side authorization guard.
//!
//! Handlers check the caller's role before touching a service, keeping the
//! services themselves auth-agnostic.

use axum::http::StatusCode;
use axum::response::Response;

use stockroom_auth::{AuthzError, Permission, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Require at least one of `any_of`.
pub fn check(principal: &PrincipalContext, any_of: &[&'static str]) -> Result<(), AuthzError> {
    let mut denied = None;
    for name in any_of {
        match authorize(principal.principal(), &Permission::from_static(name)) {
            Ok(()) => return Ok(()),
            Err(e) => denied = denied.or(Some(e)),
        }
    }
    Err(denied.unwrap_or_else(|| AuthzError::Forbidden("<none>".into())))
}

/// [`check`], rendered as a 403 response for handlers.
pub fn require(principal: &PrincipalContext, any_of: &[&'static str]) -> Result<(), Response> {
    check(principal, any_of).map_err(|e| {
        tracing::warn!(user_id = %principal.user_id(), role = %principal.role(), error = %e, "request forbidden");
        errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_auth::{Principal, Role, permissions};
    use stockroom_core::UserId;

    fn ctx(role: Role) -> PrincipalContext {
        PrincipalContext::new(Principal {
            user_id: UserId::new(),
            role,
        })
    }

    #[test]
    fn any_listed_permission_suffices() {
        let manager = ctx(Role::Manager);
        assert!(check(&manager, &[permissions::MANAGE_WAREHOUSES, permissions::EDIT_INVENTORY]).is_ok());
    }

    #[test]
    fn first_denial_is_reported() {
        let employee = ctx(Role::Employee);
        assert_eq!(
            check(&employee, &[permissions::VIEW_REPORTS, permissions::MANAGE_USERS]),
            Err(AuthzError::Forbidden("view_reports".into()))
        );
    }
}
