//! JSON codec using `serde_json`.
//!
//! All text-plane traffic is JSON; envelopes and control payloads go
//! through this codec so serialization stays in one place.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// JSON codec for envelopes and control payloads.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON text.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: Serialize>(value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    /// Decode JSON text to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the text cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
        Ok(serde_json::from_str(text)?)
    }
}
