use axum::{Router, routing::get};

pub mod common;
pub mod orders;
pub mod roster;
pub mod system;

/// Router for all authenticated (admin) endpoints.
pub fn admin_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(orders::admin_router())
        .merge(roster::admin_router())
}

/// Router for endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(orders::stage_router())
        .merge(roster::public_router())
}
