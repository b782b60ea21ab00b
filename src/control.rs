//! Control plane: reserved event names, control payloads, and the
//! per-connection session state they drive.
//!
//! Control events ride the same `{event, data}` envelopes as
//! application traffic but are namespaced with the `__evsock__::`
//! prefix and interpreted by the dispatcher instead of being forwarded
//! to listeners. The literals are interop-critical and must match the
//! server byte for byte.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved wire event names.
pub mod wire {
    /// Namespace prefix shared by every reserved event.
    pub const PREFIX: &str = "__evsock__::";

    /// Inbound: connection bootstrap carrying the assigned id.
    pub const SYNC: &str = "__evsock__::sync";
    /// Outbound: authentication reply triggered by sync.
    pub const AUTHENTICATE: &str = "__evsock__::authenticate";
    /// Inbound: server confirmed a channel join.
    pub const CHANNEL_JOIN: &str = "__evsock__::channeljoin";
    /// Inbound: server confirmed a channel leave.
    pub const CHANNEL_LEAVE: &str = "__evsock__::channelleave";
    /// Outbound: request to join a channel by name.
    pub const JOIN_CHANNEL: &str = "__evsock__::join-channel";
    /// Outbound: request to leave the current channel.
    pub const LEAVE_CHANNEL: &str = "__evsock__::leave-channel";
    /// Outbound: fan a wrapped event out to channel members.
    pub const BROADCAST: &str = "__evsock__::broadcast";

    /// Whether an event name sits in the reserved namespace.
    pub fn is_control(event: &str) -> bool {
        event.starts_with(PREFIX)
    }
}

/// Locally emitted event names (never sent on the wire).
pub mod local {
    /// Connection bootstrapped (fired on the first sync, not on socket
    /// open).
    pub const OPEN: &str = "open";
    /// Transport closed.
    pub const CLOSE: &str = "close";
    /// Transport or per-message dispatch failure.
    pub const ERROR: &str = "error";
    /// Joined a channel; payload is the channel name.
    pub const CHANNEL_JOIN: &str = "channeljoin";
    /// Left a channel; payload is the server-supplied value.
    pub const CHANNEL_LEAVE: &str = "channelleave";
}

/// Payload of the inbound sync control event.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncPayload {
    /// Connection id assigned by the server.
    pub id: String,
    /// Whether the server expects an authenticate reply.
    #[serde(default, rename = "hasAuth")]
    pub has_auth: bool,
}

/// Data member of an outbound broadcast envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    /// Event name delivered to channel members.
    #[serde(rename = "evName")]
    pub event: String,
    /// Payload delivered alongside it.
    pub data: Value,
}

/// Session state owned by one connection.
///
/// Mutated only by the dispatcher reacting to inbound control frames.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    id: Option<String>,
    channel_name: String,
}

impl ConnectionState {
    /// Fresh state: no id, not in a channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// The server-assigned connection id, once sync has arrived.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Current channel name; empty when not joined.
    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Whether the connection is currently in a channel.
    pub fn is_joined(&self) -> bool {
        !self.channel_name.is_empty()
    }

    /// Assign the connection id. The first assignment wins; returns
    /// false (leaving the id untouched) if one is already set.
    pub fn assign_id(&mut self, id: &str) -> bool {
        if self.id.is_some() {
            return false;
        }
        self.id = Some(id.to_string());
        true
    }

    /// Record a confirmed channel join.
    pub fn join_channel(&mut self, name: &str) {
        self.channel_name = name.to_string();
    }

    /// Clear channel membership.
    pub fn leave_channel(&mut self) {
        self.channel_name.clear();
    }
}
