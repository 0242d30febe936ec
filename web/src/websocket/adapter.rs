use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use ws::transport::{MessageSink, MessageSource, TransportError};

/// Write half of an upgraded Axum WebSocket.
pub(crate) struct WebSocketSink(SplitSink<WebSocket, Message>);

impl WebSocketSink {
    pub(crate) fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self(sink)
    }
}

#[async_trait]
impl MessageSink for WebSocketSink {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        self.0
            .send(Message::Text(frame.to_owned()))
            .await
            .map_err(|e| TransportError::new(e.to_string()))
    }

    async fn close(&mut self) {
        // The peer may already be gone; a failed close handshake is fine.
        let _ = self.0.close().await;
    }
}

/// Read half of an upgraded Axum WebSocket.
pub(crate) struct WebSocketSource(SplitStream<WebSocket>);

impl WebSocketSource {
    pub(crate) fn new(stream: SplitStream<WebSocket>) -> Self {
        Self(stream)
    }
}

#[async_trait]
impl MessageSource for WebSocketSource {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.0.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                // Axum answers pings itself; pings, pongs, and binary
                // frames only matter as proof the peer is alive.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Err(e)) => return Err(TransportError::new(e.to_string())),
            }
        }
    }
}
