//! Error types for evsock-client.

use thiserror::Error;

/// Main error type for all evsock operations.
#[derive(Debug, Error)]
pub enum Error {
    /// JSON serialization/deserialization error (envelopes and metadata).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket transport error (handshake, I/O, protocol violations).
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Metadata string does not fit the one-byte length field.
    #[error("metadata string is {len} UTF-16 code units, limit is 255")]
    MetadataTooLong {
        /// Length of the rejected string in UTF-16 code units.
        len: usize,
    },

    /// Binary frame shorter than its declared metadata header.
    #[error("truncated binary frame: header needs {needed} bytes, frame has {actual}")]
    TruncatedFrame {
        /// Bytes required by the declared header.
        needed: usize,
        /// Bytes actually present in the frame.
        actual: usize,
    },

    /// Protocol error (malformed control payload, invalid metadata, etc.).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Connection closed while sending.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
