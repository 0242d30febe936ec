use crate::controller::health_check_controller;
use crate::websocket;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use service::config::Config;
use service::AppState;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub fn init_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .route("/ws", get(websocket::handler::websocket_handler))
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
        .allow_credentials(true)
}
