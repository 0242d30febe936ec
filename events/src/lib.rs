//! Event envelope types for the Catalog Platform's real-time layer.
//!
//! Every change notification pushed to connected WebSocket clients is the
//! JSON serialization of exactly one [`Envelope`]: a `type` tag drawn from
//! a fixed vocabulary plus the serialized domain entity as opaque `data`.
//! The broadcast hub never sends raw domain objects.
//!
//! This crate has no dependencies on internal crates, so any layer that
//! completes a mutation can build an envelope without a circular
//! dependency. Entity data is carried as serialized JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Change-notification types emitted after successful domain mutations.
///
/// Clients ignore types they do not recognize, so new variants can be
/// added without any versioning concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "product:created")]
    ProductCreated,
    #[serde(rename = "product:updated")]
    ProductUpdated,
    #[serde(rename = "product:deleted")]
    ProductDeleted,
    #[serde(rename = "category:created")]
    CategoryCreated,
    #[serde(rename = "category:updated")]
    CategoryUpdated,
    #[serde(rename = "category:deleted")]
    CategoryDeleted,
}

impl EventType {
    /// The wire string clients see in the envelope's `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ProductCreated => "product:created",
            EventType::ProductUpdated => "product:updated",
            EventType::ProductDeleted => "product:deleted",
            EventType::CategoryCreated => "category:created",
            EventType::CategoryUpdated => "category:updated",
            EventType::CategoryDeleted => "category:deleted",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The uniform broadcast payload: `{"type": ..., "data": ...}`.
///
/// For create/update events `data` is the full mutated entity so clients
/// can update their UI without a follow-up API call. For deletes it is an
/// object carrying the deleted identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: Value,
}

impl Envelope {
    pub fn new(event_type: EventType, data: Value) -> Self {
        Self { event_type, data }
    }

    /// Serialize to the wire form sent as one frame per connected client.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
