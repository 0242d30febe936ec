use crate::websocket::adapter::{WebSocketSink, WebSocketSource};
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::StreamExt;
use log::*;
use service::AppState;
use ws::ClientSession;

/// Upgrade the request and bridge the connection to the broadcast hub.
///
/// The session owns the socket from here on: it registers itself, pumps
/// broadcasts out and liveness frames in, and deregisters on any failure.
pub(crate) async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    let queue_capacity = app_state.config.ws_send_queue_capacity;
    ws.on_upgrade(move |socket| serve_connection(socket, app_state, queue_capacity))
}

async fn serve_connection(socket: WebSocket, app_state: AppState, queue_capacity: usize) {
    let (sink, stream) = socket.split();
    let mut session = ClientSession::with_queue_capacity(
        app_state.hub.clone(),
        WebSocketSink::new(sink),
        WebSocketSource::new(stream),
        queue_capacity,
    );
    session.register();

    let id = session.id();
    debug!("WebSocket connection established as session {id}");
    session.run().await;
    debug!("WebSocket session {id} finished");
}
