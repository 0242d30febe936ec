//! Real-time WebSocket broadcast infrastructure for the Catalog Platform.
//!
//! This crate pushes change notifications (product/category mutations) to
//! every currently connected client, best effort. It is transport-agnostic:
//! the web layer supplies the concrete connection via the [`transport`]
//! traits.
//!
//! # Architecture
//!
//! - **Single coordinating task per hub**: all registry mutations
//!   (register, unregister, broadcast fan-out) are funneled through one
//!   task that exclusively owns the membership map. Callers only ever send
//!   commands; nothing shares the map.
//! - **Bounded per-client queues**: each session buffers at most
//!   [`session::SEND_QUEUE_CAPACITY`] frames. A client whose queue is full
//!   at broadcast time is forcibly dropped rather than allowed to stall or
//!   bloat the hub — a slow consumer only ever hurts itself.
//! - **Two pumps per session**: an outbound pump drains the queue onto the
//!   connection and an inbound pump drains the connection for liveness.
//!   Either one failing tears the whole session down; teardown converges
//!   through a single idempotent unregister.
//! - **Ephemeral delivery**: no persistence, no replay. A client that
//!   disconnects reconnects and sees only future events.
//!
//! # Message flow
//!
//! 1. A mutation handler completes a successful write
//! 2. It calls [`publish::publish_event`] with the event type and entity
//! 3. The envelope is serialized once and handed to the coordinating task
//! 4. The task enqueues the shared frame onto every member's queue
//! 5. Each session's outbound pump writes the frame to its connection
//!
//! # Modules
//!
//! - `hub`: the [`Hub`] handle and its coordinating task
//! - `session`: per-connection state and the two pump loops
//! - `transport`: sink/source abstraction over one duplex connection
//! - `publish`: fire-and-forget envelope publishing for mutation handlers

pub mod hub;
pub mod publish;
pub mod session;
pub mod transport;

pub use hub::{Hub, SessionId};
pub use publish::publish_event;
pub use session::ClientSession;
