//! HTTP layer for the Catalog Platform's real-time service.
//!
//! Exposes the WebSocket endpoint clients connect to for change
//! notifications, plus a health check. The CRUD/auth surface lives in its
//! own service; this crate only bridges connections to the broadcast hub.

pub use service::AppState;

pub(crate) mod controller;
mod router;
pub(crate) mod websocket;

pub use router::init_router;
