use serde::Serialize;
use thiserror::Error;

use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// Built from verified claims; construction is decoupled from transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(username: impl Into<String>, roles: Vec<Role>) -> Self {
        let mut permissions: Vec<Permission> = roles.iter().flat_map(Role::permissions).collect();
        permissions.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        permissions.dedup();

        Self {
            username: username.into(),
            roles,
            permissions,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Operation-side authorization contract, checked before the operation runs.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.permissions.iter().any(|p| p.grants(required)) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
