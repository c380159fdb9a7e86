//! `pickline-auth`: authentication/authorization boundary.
//!
//! Token issuance lives elsewhere; this crate only verifies already-issued
//! tokens and decides whether a principal may run an operation. It is
//! decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use roles::Role;
