use serde::Serialize;
use thiserror::Error;

use stockroom_core::UserId;

use crate::{JwtClaims, Permission, Role};

/// The authenticated caller, as resolved from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl From<&JwtClaims> for Principal {
    fn from(claims: &JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

impl Principal {
    pub fn permissions(&self) -> Vec<Permission> {
        self.role.permissions()
    }

    pub fn has(&self, required: &Permission) -> bool {
        self.role.permissions().iter().any(|granted| granted.implies(required))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Pure policy check: no IO, no panics.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.has(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
