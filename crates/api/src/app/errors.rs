use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pickline_infra::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::InvalidTransition(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_transition", msg),
        EngineError::NotReady(msg) => json_error(StatusCode::BAD_REQUEST, "not_ready", msg),
        EngineError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        EngineError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        EngineError::Store(e) => {
            tracing::error!(error = %e, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal storage error",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickline_infra::store::StoreError;

    #[test]
    fn rejections_are_client_errors_and_failures_are_opaque() {
        let cases = [
            (EngineError::InvalidTransition("x".into()), StatusCode::BAD_REQUEST),
            (EngineError::NotReady("x".into()), StatusCode::BAD_REQUEST),
            (EngineError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (EngineError::NotFound("order 1".into()), StatusCode::NOT_FOUND),
            (
                EngineError::Store(StoreError::Backend("password=hunter2".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(engine_error_to_response(err).status(), status);
        }
    }
}
