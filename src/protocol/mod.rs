//! Protocol module - wire format and message envelopes.
//!
//! This module implements the two frame representations:
//! - Binary frames: metadata string prepended to an opaque payload
//! - Text frames: JSON `{event, data}` envelopes

pub mod binary;
mod envelope;

pub use envelope::Envelope;
