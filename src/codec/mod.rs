//! Codec module - serialization for the text plane.
//!
//! Implemented as a marker struct with static methods rather than trait
//! objects, allowing compile-time codec selection. Binary payloads are
//! opaque `bytes::Bytes` and need no codec.

mod json;

pub use json::JsonCodec;
