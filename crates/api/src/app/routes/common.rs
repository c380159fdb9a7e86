use axum::http::StatusCode;

use pickline_auth::{CommandAuthorization, Permission};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Small helper wrapper to associate required permissions with a command.
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CmdAuth<C> {
    pub fn new(inner: C, required: Permission) -> Self {
        Self {
            inner,
            required: vec![required],
        }
    }

    /// Authorize and unwrap the command, or produce the 403 response.
    pub fn authorize(self, principal: &PrincipalContext) -> Result<C, axum::response::Response> {
        match crate::authz::authorize_command(principal, &self) {
            Ok(()) => Ok(self.inner),
            Err(e) => Err(errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())),
        }
    }
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}
