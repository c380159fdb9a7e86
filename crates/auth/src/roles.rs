use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role carried in a token.
///
/// Roles are opaque strings on the wire; [`Role::permissions`] is the policy
/// that turns them into grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Full control over orders and the roster.
    pub fn admin() -> Self {
        Self::new("admin")
    }

    /// Read-only access to order listings and exports.
    pub fn supervisor() -> Self {
        Self::new("supervisor")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Static role → permission policy. Unknown roles grant nothing.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![Permission::WILDCARD],
            "supervisor" => vec![Permission::ORDERS_READ, Permission::ORDERS_EXPORT],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
