//! Events module - listener registration and dispatch.
//!
//! Provides:
//! - [`ListenerRegistry`] - ordered per-event listener lists
//! - [`EventPayload`] - what a listener receives when an event fires
//!
//! Callbacks are `Arc`-wrapped so registration hands out cheap clones
//! and removal can match on reference identity.
//!
//! # Example
//!
//! ```
//! use evsock_client::events::{callback, EventPayload, ListenerRegistry};
//!
//! let mut registry = ListenerRegistry::new();
//! registry.on("status", callback(|payload| {
//!     println!("status: {:?}", payload.as_json());
//! }));
//! registry.emit("status", &EventPayload::Json(serde_json::json!("ready")));
//! ```

mod registry;

pub use registry::{ListenerId, ListenerRegistry};

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

/// Data handed to a listener when its event fires.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// Event fired with no payload (e.g. `open`).
    None,
    /// JSON value from a text frame or a local notification.
    Json(Value),
    /// Raw payload bytes recovered from a binary frame.
    Binary(Bytes),
}

impl EventPayload {
    /// The JSON value, if this is a JSON payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            EventPayload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The raw bytes, if this is a binary payload.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            EventPayload::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A registered event callback.
pub type Callback = Arc<dyn Fn(&EventPayload) + Send + Sync + 'static>;

/// Wrap a closure as a [`Callback`].
///
/// Keep a clone of the returned `Arc` to remove the listener later by
/// reference identity.
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&EventPayload) + Send + Sync + 'static,
{
    Arc::new(f)
}
