//! API-side authorization guard for commands.
//!
//! This enforces authorization at the operation boundary (before the engine
//! runs), while keeping the domain crates and infra auth-agnostic.

use pickline_auth::{AuthzError, CommandAuthorization, Principal, authorize};

use crate::context::PrincipalContext;

/// Check authorization for a command in the current request context.
///
/// This is intended to be called **before** executing the operation.
pub fn authorize_command<C: CommandAuthorization>(
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let principal = Principal::new(principal.username(), principal.roles().to_vec());

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}
