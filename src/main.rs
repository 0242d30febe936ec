use log::info;
use service::config::Config;
use service::logging::Logger;
use service::AppState;
use ws::Hub;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    // One hub per process; its coordinating task runs until shutdown.
    let hub = Hub::new();
    let app_state = AppState::new(config.clone(), hub.clone());

    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let address = format!("{host}:{port}", port = config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {address}: {e}"));
    info!("Server starting on {address}");

    let router = web::init_router(app_state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await
        .expect("Server failed while running");
}

/// Wait for Ctrl-C, then close the hub so every client queue closes and
/// the outbound pumps shut their connections before the process exits.
async fn shutdown_signal(hub: Hub) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received; closing WebSocket hub");
        hub.shutdown();
    }
}
