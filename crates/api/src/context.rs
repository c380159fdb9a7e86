use pickline_auth::Role;

/// Principal context for a request (authenticated identity + roles).
///
/// Inserted by the auth middleware; only present on admin routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    username: String,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            username: username.into(),
            roles,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
