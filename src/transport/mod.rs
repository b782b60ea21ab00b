//! Transport module - the capability the protocol core rides on.
//!
//! The core needs exactly four things from a transport: send a text or
//! binary frame, close, and a stream of open/frame/close/error
//! notifications. Anything satisfying [`Transport`] plus a
//! [`NotificationReceiver`] plugs in; [`WsTransport`] is the built-in
//! WebSocket implementation.

mod ws;

pub use ws::WsTransport;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// One discrete unit of data exchanged with the transport.
///
/// The two-variant sum type is the whole classification story: an
/// inbound frame is text or binary by construction, never anything
/// else.
#[derive(Debug, Clone, PartialEq)]
pub enum WireFrame {
    /// UTF-8 text frame (JSON envelope).
    Text(String),
    /// Binary frame (metadata header + opaque payload).
    Binary(Bytes),
}

/// Notification surfaced by a transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The transport finished connecting.
    Open,
    /// A complete inbound frame.
    Frame(WireFrame),
    /// The transport closed, with the peer's close code and reason if
    /// one was sent.
    Closed {
        /// Close code from the peer, if any.
        code: Option<u16>,
        /// Close reason from the peer; empty if none.
        reason: String,
    },
    /// The transport failed.
    Error(String),
}

/// Receiving end of a transport's notification stream.
pub type NotificationReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Sending end of a transport's notification stream.
pub type NotificationSender = mpsc::UnboundedSender<TransportEvent>;

/// Outbound half of a transport.
///
/// Both operations are non-blocking: implementations queue work to a
/// writer task rather than performing I/O inline.
pub trait Transport: Send + Sync + 'static {
    /// Queue a frame for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionClosed`] if the transport has
    /// shut down.
    fn send(&self, frame: WireFrame) -> Result<()>;

    /// Initiate a close handshake.
    fn close(&self) -> Result<()>;
}
