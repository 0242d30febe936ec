//! Per-connection session state and its two pump loops.
//!
//! A [`ClientSession`] bridges one connection to the hub's broadcast
//! stream in both directions. The pumps are deliberately independent —
//! they share no mutable flags. Teardown converges on two idempotent
//! signals instead: the outbound queue closing (ends the outbound pump)
//! and `Hub::unregister` (safe to request from either side, any number of
//! times).

use crate::hub::{Hub, OutboundReceiver, OutboundSender, SessionId};
use crate::transport::{MessageSink, MessageSource};
use log::debug;
use tokio::sync::mpsc;

/// Frames buffered per client before the hub treats it as a slow consumer
/// and drops it.
pub const SEND_QUEUE_CAPACITY: usize = 256;

/// One connected client: identity, bounded outbound queue, and the two
/// halves of its connection.
pub struct ClientSession<S, R> {
    id: SessionId,
    hub: Hub,
    sink: S,
    source: R,
    outbound: OutboundReceiver,
    /// Moves to the hub on `register`; once it is gone, the hub holds the
    /// only sender and dropping it closes the queue.
    pending_sender: Option<OutboundSender>,
}

impl<S, R> ClientSession<S, R>
where
    S: MessageSink,
    R: MessageSource,
{
    /// Wrap a freshly accepted connection. The session is not a hub member
    /// until [`register`](Self::register) is called.
    pub fn new(hub: Hub, sink: S, source: R) -> Self {
        Self::with_queue_capacity(hub, sink, source, SEND_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(hub: Hub, sink: S, source: R, capacity: usize) -> Self {
        let (sender, outbound) = mpsc::channel(capacity);
        Self {
            id: SessionId::new(),
            hub,
            sink,
            source,
            outbound,
            pending_sender: Some(sender),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Enter the hub's registry so subsequent broadcasts reach this
    /// session. Idempotent: the queue sender moves to the hub exactly once.
    pub fn register(&mut self) {
        if let Some(sender) = self.pending_sender.take() {
            self.hub.register(self.id, sender);
        }
    }

    /// Drive both pumps until the connection dies, the hub drops this
    /// session, or the hub shuts down. Always leaves the registry clean
    /// and the connection closed.
    pub async fn run(mut self) {
        self.register();
        let Self {
            id,
            hub,
            sink,
            source,
            outbound,
            ..
        } = self;

        let outbound_pump = tokio::spawn(run_outbound(id, outbound, sink));
        run_inbound(id, source).await;

        // Whichever pump noticed the failure first, the cleanup request is
        // the same and redundant calls are no-ops.
        hub.unregister(id);
        let _ = outbound_pump.await;
    }
}

/// Drain the outbound queue onto the connection.
///
/// `recv` keeps yielding buffered frames after the hub drops its sender,
/// so a session that is unregistered mid-stream still flushes what it was
/// promised before the queue reports closed.
async fn run_outbound<S: MessageSink>(id: SessionId, mut outbound: OutboundReceiver, mut sink: S) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(&frame).await {
            debug!("Write to client {id} failed: {e}");
            break;
        }
    }
    // Queue closed or write failed; closing the connection here is what
    // unblocks the inbound pump on the forced-drop path.
    sink.close().await;
}

/// Drain the connection for liveness.
///
/// Clients cannot issue real-time requests, so inbound frames are
/// discarded; their only significance is proving the peer is still there.
async fn run_inbound<R: MessageSource>(id: SessionId, mut source: R) {
    loop {
        match source.recv().await {
            Ok(Some(_)) => continue,
            Ok(None) => {
                debug!("Client {id} closed the connection");
                break;
            }
            Err(e) => {
                debug!("Read from client {id} failed: {e}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::{sleep, timeout};

    /// In-memory connection double. Writes land in a channel the test can
    /// drain; closing either half wakes the source, mirroring how closing
    /// a real socket fails the blocked read.
    struct TestSink {
        written: mpsc::UnboundedSender<String>,
        closed_tx: watch::Sender<bool>,
        fail_sends: bool,
    }

    struct TestSource {
        inbound: mpsc::UnboundedReceiver<String>,
        closed_rx: watch::Receiver<bool>,
    }

    #[async_trait]
    impl MessageSink for TestSink {
        async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
            if self.fail_sends {
                return Err(TransportError::new("simulated write failure"));
            }
            self.written
                .send(frame.to_owned())
                .map_err(|_| TransportError::new("test receiver gone"))
        }

        async fn close(&mut self) {
            let _ = self.closed_tx.send(true);
        }
    }

    #[async_trait]
    impl MessageSource for TestSource {
        async fn recv(&mut self) -> Result<Option<String>, TransportError> {
            tokio::select! {
                frame = self.inbound.recv() => Ok(frame),
                res = self.closed_rx.wait_for(|closed| *closed) => {
                    let _ = res;
                    Ok(None)
                }
            }
        }
    }

    struct TestConnection {
        sink: TestSink,
        source: TestSource,
        written: mpsc::UnboundedReceiver<String>,
        peer: mpsc::UnboundedSender<String>,
        closed: watch::Receiver<bool>,
    }

    fn test_connection(fail_sends: bool) -> TestConnection {
        let (written_tx, written_rx) = mpsc::unbounded_channel();
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);
        TestConnection {
            sink: TestSink {
                written: written_tx,
                closed_tx,
                fail_sends,
            },
            source: TestSource {
                inbound: peer_rx,
                closed_rx: closed_rx.clone(),
            },
            written: written_rx,
            peer: peer_tx,
            closed: closed_rx,
        }
    }

    async fn eventually(mut condition: impl FnMut() -> bool, what: &str) {
        timeout(Duration::from_secs(5), async {
            while !condition() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
    }

    async fn next_written(written: &mut mpsc::UnboundedReceiver<String>) -> String {
        timeout(Duration::from_secs(5), written.recv())
            .await
            .expect("timed out waiting for a written frame")
            .expect("connection write side closed unexpectedly")
    }

    #[tokio::test]
    async fn delivers_broadcasts_in_order() {
        let hub = Hub::new();
        let mut conn = test_connection(false);
        let session = ClientSession::new(
            hub.clone(),
            conn.sink,
            conn.source,
        );
        let running = tokio::spawn(session.run());
        eventually(|| hub.client_count() == 1, "registration").await;

        hub.broadcast("A".to_owned());
        hub.broadcast("B".to_owned());
        assert_eq!(next_written(&mut conn.written).await, "A");
        assert_eq!(next_written(&mut conn.written).await, "B");

        hub.shutdown();
        let _ = running.await;
    }

    #[tokio::test]
    async fn register_is_idempotent() {
        let hub = Hub::new();
        let conn = test_connection(false);
        let mut session = ClientSession::new(hub.clone(), conn.sink, conn.source);
        session.register();
        session.register();
        eventually(|| hub.client_count() == 1, "single registration").await;

        // Still exactly one member after the coordinating task settles.
        sleep(Duration::from_millis(20)).await;
        assert_eq!(hub.client_count(), 1);
    }

    #[tokio::test]
    async fn peer_close_unregisters_and_closes_connection() {
        let hub = Hub::new();
        let conn = test_connection(false);
        let mut closed = conn.closed.clone();
        let peer = conn.peer.clone();
        let session = ClientSession::new(hub.clone(), conn.sink, conn.source);
        let running = tokio::spawn(session.run());
        eventually(|| hub.client_count() == 1, "registration").await;

        // Inbound traffic is discarded but keeps the session alive.
        peer.send("ping".to_owned()).unwrap();
        drop(peer);
        drop(conn.peer);

        timeout(Duration::from_secs(5), running)
            .await
            .expect("session did not tear down")
            .unwrap();
        eventually(|| hub.client_count() == 0, "unregistration").await;
        assert!(*closed.borrow_and_update());
    }

    #[tokio::test]
    async fn write_failure_tears_the_session_down() {
        let hub = Hub::new();
        let conn = test_connection(true);
        let session = ClientSession::new(hub.clone(), conn.sink, conn.source);
        let running = tokio::spawn(session.run());
        eventually(|| hub.client_count() == 1, "registration").await;

        hub.broadcast("doomed".to_owned());

        timeout(Duration::from_secs(5), running)
            .await
            .expect("session did not tear down")
            .unwrap();
        eventually(|| hub.client_count() == 0, "unregistration").await;
    }

    #[tokio::test]
    async fn stalled_session_is_dropped_and_connection_closed() {
        let hub = Hub::new();
        let conn = test_connection(false);
        let mut closed = conn.closed.clone();
        // Queue capacity 2 and the pumps start only after the overflow, so
        // the session stalls exactly like a wedged consumer.
        let mut session =
            ClientSession::with_queue_capacity(hub.clone(), conn.sink, conn.source, 2);
        session.register();
        eventually(|| hub.client_count() == 1, "registration").await;

        hub.broadcast("1".to_owned());
        hub.broadcast("2".to_owned());
        hub.broadcast("3".to_owned());
        eventually(|| hub.client_count() == 0, "forced drop").await;

        // Once the pumps do run they flush the two buffered frames, see
        // the closed queue, and close the connection.
        let mut written = conn.written;
        let running = tokio::spawn(session.run());
        assert_eq!(next_written(&mut written).await, "1");
        assert_eq!(next_written(&mut written).await, "2");
        timeout(Duration::from_secs(5), running)
            .await
            .expect("session did not tear down")
            .unwrap();
        assert!(*closed.borrow_and_update());
    }

    #[tokio::test]
    async fn hub_shutdown_ends_running_sessions() {
        let hub = Hub::new();
        let conn = test_connection(false);
        let session = ClientSession::new(hub.clone(), conn.sink, conn.source);
        let running = tokio::spawn(session.run());
        eventually(|| hub.client_count() == 1, "registration").await;

        hub.shutdown();
        timeout(Duration::from_secs(5), running)
            .await
            .expect("session did not tear down")
            .unwrap();
    }
}
