//! The broadcast hub: one coordinating task owning the membership registry.
//!
//! [`Hub`] is a cheap, cloneable handle. Every operation is message
//! passing: the handle sends a command, the coordinating task applies it.
//! The membership map is never shared, so there is no lock to contend on
//! and no ordering hazard between registration and fan-out — the task
//! processes one command at a time, in arrival order.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity of one registered client connection.
///
/// Single-use: a reconnecting client gets a fresh id, never the old one
/// back. Used only for registry membership and equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sender half of one session's bounded outbound queue. Held only by the
/// coordinating task; dropping it is what closes the queue.
pub(crate) type OutboundSender = mpsc::Sender<Arc<String>>;
/// Receiver half, consumed by that session's outbound pump alone.
pub(crate) type OutboundReceiver = mpsc::Receiver<Arc<String>>;

enum Command {
    Register {
        id: SessionId,
        sender: OutboundSender,
    },
    Unregister {
        id: SessionId,
    },
    Broadcast {
        frame: Arc<String>,
    },
    Shutdown,
}

/// Handle to the hub's coordinating task.
///
/// Clone freely; all clones talk to the same registry. The hub runs for
/// the life of the process — [`Hub::shutdown`] (or dropping every handle)
/// is the only way to stop it.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::UnboundedSender<Command>,
    member_count: Arc<AtomicUsize>,
}

impl Hub {
    /// Create a hub and spawn its coordinating task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let member_count = Arc::new(AtomicUsize::new(0));
        tokio::spawn(coordinate(inbox, Arc::clone(&member_count)));
        Self {
            commands,
            member_count,
        }
    }

    /// Add a session to the registry. Driven by [`crate::ClientSession`];
    /// callers must not register the same id twice.
    pub(crate) fn register(&self, id: SessionId, sender: OutboundSender) {
        let _ = self.commands.send(Command::Register { id, sender });
    }

    /// Remove a session if present, closing its outbound queue exactly
    /// once. Safe to call redundantly: both pumps of a dying session may
    /// race to request this.
    pub(crate) fn unregister(&self, id: SessionId) {
        let _ = self.commands.send(Command::Unregister { id });
    }

    /// Queue a frame for delivery to every currently registered session.
    ///
    /// Returns as soon as the frame is handed to the coordinating task;
    /// callers never wait for delivery. A session registering concurrently
    /// with this call may or may not see the frame.
    pub fn broadcast(&self, frame: String) {
        let _ = self.commands.send(Command::Broadcast {
            frame: Arc::new(frame),
        });
    }

    /// Approximate count of connected clients, for diagnostics only.
    ///
    /// May lag registry mutations still queued for the coordinating task;
    /// never treat it as exact under concurrent activity.
    pub fn client_count(&self) -> usize {
        self.member_count.load(Ordering::Relaxed)
    }

    /// Close the hub's intake and drop every registered session.
    ///
    /// Each session's outbound queue closes, its pump drains whatever was
    /// buffered, and its connection is closed on the way out.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// The coordinating loop. Exclusive owner of the membership map.
async fn coordinate(
    mut inbox: mpsc::UnboundedReceiver<Command>,
    member_count: Arc<AtomicUsize>,
) {
    let mut members: HashMap<SessionId, OutboundSender> = HashMap::new();

    while let Some(command) = inbox.recv().await {
        match command {
            Command::Register { id, sender } => {
                if members.insert(id, sender).is_some() {
                    // Precondition violation; ids are single-use.
                    warn!("Session {id} registered twice; previous queue replaced");
                }
                member_count.store(members.len(), Ordering::Relaxed);
                info!("WebSocket client connected. Total clients: {}", members.len());
            }
            Command::Unregister { id } => {
                if members.remove(&id).is_some() {
                    member_count.store(members.len(), Ordering::Relaxed);
                    info!(
                        "WebSocket client disconnected. Total clients: {}",
                        members.len()
                    );
                }
            }
            Command::Broadcast { frame } => {
                // try_send keeps one stalled client from delaying everyone
                // else: a full queue drops that client instead of blocking
                // or buffering without bound.
                members.retain(|id, sender| match sender.try_send(Arc::clone(&frame)) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("Dropping slow WebSocket client {id}: send queue full");
                        false
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                });
                member_count.store(members.len(), Ordering::Relaxed);
            }
            Command::Shutdown => break,
        }
    }

    // Reached on Shutdown or once every handle is gone. Dropping the
    // senders closes each remaining outbound queue; the pumps drain and
    // close their connections.
    let remaining = members.len();
    members.clear();
    member_count.store(0, Ordering::Relaxed);
    debug!("Hub coordinating task stopped, released {remaining} client(s)");
}
