//! The `{event, data}` JSON envelope carried by text frames.
//!
//! Binary frames reuse the same shape with the `data` member omitted:
//! the serialized envelope becomes the frame's metadata string and the
//! payload travels as the frame's raw tail bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::JsonCodec;
use crate::error::Result;

/// Logical message: an event name plus an optional JSON value.
///
/// `data` is omitted from the serialized form when `None`, so the
/// metadata-only envelope serializes exactly as `{"event":"..."}`.
///
/// # Example
///
/// ```
/// use evsock_client::protocol::Envelope;
///
/// let envelope = Envelope::event_only("chunk");
/// assert_eq!(envelope.to_text().unwrap(), r#"{"event":"chunk"}"#);
///
/// let parsed = Envelope::parse(r#"{"event":"msg","data":42}"#).unwrap();
/// assert_eq!(parsed.event, "msg");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name.
    pub event: String,
    /// Payload value; absent for binary-frame metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Create an envelope carrying a data value.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data: Some(data),
        }
    }

    /// Create an envelope with no data member.
    pub fn event_only(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: None,
        }
    }

    /// Serialize to the JSON text carried on the wire.
    pub fn to_text(&self) -> Result<String> {
        JsonCodec::encode(self)
    }

    /// Parse wire text into an envelope.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the text is not valid JSON or does not
    /// carry a string `event` member.
    pub fn parse(text: &str) -> Result<Self> {
        JsonCodec::decode(text)
    }
}
