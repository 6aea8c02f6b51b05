//! `stockroom-auth`: users, roles and the authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Password
//! material and token issuance live outside the system; only token
//! *validation* happens here.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use roles::Role;
pub use user::{NewUser, User, UserPatch, ensure_can_assign};
