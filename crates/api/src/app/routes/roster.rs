//! Picker/checker roster endpoints.
//!
//! Listing is public (the floor selection screens use it); creation and
//! removal are admin-only. Removal is a soft delete.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::Utc;

use pickline_auth::Permission;
use pickline_roster::ActorKind;

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn public_router() -> Router {
    Router::new()
        .route("/pickers", get(list_pickers))
        .route("/checkers", get(list_checkers))
}

pub fn admin_router() -> Router {
    Router::new()
        .route("/pickers", post(create_picker))
        .route("/pickers/:id", delete(deactivate_picker))
        .route("/checkers", post(create_checker))
        .route("/checkers/:id", delete(deactivate_checker))
}

pub async fn list_pickers(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    list_active(&services, ActorKind::Picker).await
}

pub async fn list_checkers(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    list_active(&services, ActorKind::Checker).await
}

pub async fn create_picker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateActorRequest>,
) -> axum::response::Response {
    create(&services, &principal, ActorKind::Picker, body).await
}

pub async fn create_checker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateActorRequest>,
) -> axum::response::Response {
    create(&services, &principal, ActorKind::Checker, body).await
}

pub async fn deactivate_picker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    deactivate(&services, &principal, ActorKind::Picker, &id).await
}

pub async fn deactivate_checker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    deactivate(&services, &principal, ActorKind::Checker, &id).await
}

async fn list_active(services: &AppServices, kind: ActorKind) -> axum::response::Response {
    match services.directory().list_active(kind).await {
        Ok(actors) => {
            let body: Vec<dto::ActorSummary> = actors.into_iter().map(Into::into).collect();
            Json(body).into_response()
        }
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn create(
    services: &AppServices,
    principal: &PrincipalContext,
    kind: ActorKind,
    body: dto::CreateActorRequest,
) -> axum::response::Response {
    let body = match CmdAuth::new(body, Permission::ROSTER_CREATE).authorize(principal) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    match services.directory().create(kind, &body.name, Utc::now()).await {
        Ok(actor) => (StatusCode::CREATED, Json(actor)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn deactivate(
    services: &AppServices,
    principal: &PrincipalContext,
    kind: ActorKind,
    raw_id: &str,
) -> axum::response::Response {
    let id = match dto::parse_actor_id(raw_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id = match CmdAuth::new(id, Permission::ROSTER_DEACTIVATE).authorize(principal) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let message = match kind {
        ActorKind::Picker => "Picker removed",
        ActorKind::Checker => "Checker removed",
    };
    match services.directory().deactivate(kind, id).await {
        Ok(_) => Json(serde_json::json!({ "message": message })).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
