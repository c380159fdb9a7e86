use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;

use pickline_auth::Permission;
use pickline_orders::{AssignPicker, EndChecking, EndPicking, NewOrder, StartChecking, StartPicking};

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

/// Admin order endpoints (behind the auth middleware).
pub fn admin_router() -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/export", get(export_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/assign", patch(assign_picker))
}

/// Stage endpoints. Reachable without a token; the stage guard checks the actor id.
pub fn stage_router() -> Router {
    Router::new()
        .route("/orders/:id/start-picking", patch(start_picking))
        .route("/orders/:id/end-picking", patch(end_picking))
        .route("/orders/:id/start-checking", patch(start_checking))
        .route("/orders/:id/end-checking", patch(end_checking))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let new_order = match CmdAuth::new(body, Permission::ORDERS_CREATE).authorize(&principal) {
        Ok(body) => NewOrder::new(body.so_number, body.size, body.delivery_type, Utc::now()),
        Err(resp) => return resp,
    };
    let new_order = match new_order {
        Ok(o) => o,
        Err(e) => return errors::engine_error_to_response(e.into()),
    };

    match services.engine.create_order(new_order).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = CmdAuth::new((), Permission::ORDERS_READ).authorize(&principal) {
        return resp;
    }

    match services.reports.list_orders().await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = CmdAuth::new((), Permission::ORDERS_READ).authorize(&principal) {
        return resp;
    }
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let order = match services.engine.get_order(order_id).await {
        Ok(o) => o,
        Err(e) => return errors::engine_error_to_response(e),
    };
    match services.reports.order(order).await {
        Ok(listing) => Json(listing).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn export_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ExportQuery>,
) -> axum::response::Response {
    if let Err(resp) = CmdAuth::new((), Permission::ORDERS_EXPORT).authorize(&principal) {
        return resp;
    }
    let date = match dto::parse_export_date(query.date.as_deref()) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match services.reports.export(date).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn assign_picker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PickerRequest>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = AssignPicker {
        order_id,
        picker_id: body.picker_id,
        occurred_at: Utc::now(),
    };
    let cmd = match CmdAuth::new(cmd, Permission::ORDERS_ASSIGN).authorize(&principal) {
        Ok(cmd) => cmd,
        Err(resp) => return resp,
    };

    match services.engine.assign(cmd).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn start_picking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::PickerRequest>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = StartPicking {
        order_id,
        picker_id: body.picker_id,
        occurred_at: Utc::now(),
    };

    match services.engine.start_picking(cmd).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn end_picking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::PickerRequest>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = EndPicking {
        order_id,
        picker_id: body.picker_id,
        occurred_at: Utc::now(),
    };

    match services.engine.end_picking(cmd).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn start_checking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CheckerRequest>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = StartChecking {
        order_id,
        checker_id: body.checker_id,
        occurred_at: Utc::now(),
    };

    match services.engine.start_checking(cmd).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn end_checking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CheckerRequest>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = EndChecking {
        order_id,
        checker_id: body.checker_id,
        occurred_at: Utc::now(),
    };

    match services.engine.end_checking(cmd).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
