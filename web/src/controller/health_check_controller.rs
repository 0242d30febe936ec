use crate::controller::ApiResponse;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use service::AppState;

/// GET liveness plus a diagnostic count of connected WebSocket clients.
///
/// The count is an approximate snapshot for dashboards and log
/// correlation; it is not a correctness signal.
pub(crate) async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse::success(json!({
            "status": "ok",
            "websocket_clients": app_state.hub.client_count(),
        }))),
    )
}
