use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. `"orders.assign"`).
///
/// The wildcard `"*"` grants everything; it is what the `admin` role maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub const ORDERS_CREATE: Permission = Permission(Cow::Borrowed("orders.create"));
    pub const ORDERS_ASSIGN: Permission = Permission(Cow::Borrowed("orders.assign"));
    pub const ORDERS_READ: Permission = Permission(Cow::Borrowed("orders.read"));
    pub const ORDERS_EXPORT: Permission = Permission(Cow::Borrowed("orders.export"));
    pub const ROSTER_CREATE: Permission = Permission(Cow::Borrowed("roster.create"));
    pub const ROSTER_DEACTIVATE: Permission = Permission(Cow::Borrowed("roster.deactivate"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Whether holding `self` satisfies a requirement for `required`.
    pub fn grants(&self, required: &Permission) -> bool {
        self.is_wildcard() || self == required
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
