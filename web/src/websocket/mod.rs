//! WebSocket HTTP handling for the web layer.
//!
//! This module contains only the Axum upgrade handler and the adapter that
//! turns an upgraded socket into the `ws` crate's sink/source pair. The
//! core broadcast infrastructure (Hub, ClientSession, publish path) lives
//! in the `ws` crate and stays transport-agnostic.

pub(crate) mod adapter;
pub(crate) mod handler;
