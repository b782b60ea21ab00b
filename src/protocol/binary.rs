//! Binary frame encoding and decoding.
//!
//! A binary frame carries a short metadata string ahead of an opaque
//! payload:
//!
//! ```text
//! ┌───────────┬──────────────────────┬─────────────────┐
//! │ Length    │ Metadata string      │ Payload         │
//! │ 1 byte    │ 2 bytes per unit     │ remaining bytes │
//! │ u8        │ UTF-16 code unit, LE │ verbatim        │
//! └───────────┴──────────────────────┴─────────────────┘
//! ```
//!
//! Byte 0 holds the metadata length in UTF-16 *code units* (not bytes),
//! so the string is capped at 255 units. Each unit is stored as an
//! unsigned 16-bit little-endian value.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Size of the length field in bytes.
pub const LEN_FIELD_SIZE: usize = 1;

/// Maximum metadata length in UTF-16 code units (one-byte length field).
pub const MAX_METADATA_UNITS: usize = 255;

/// Prepend a metadata string to a payload.
///
/// Empty metadata returns the payload unchanged: a frame with
/// zero-length metadata is bit-identical to an unframed buffer, so
/// callers passing possibly-empty strings must track out-of-band
/// whether framing was applied. Protocol senders never hit this case
/// because frame metadata is always a JSON envelope.
///
/// # Errors
///
/// Returns [`Error::MetadataTooLong`] if `metadata` exceeds 255 UTF-16
/// code units.
///
/// # Example
///
/// ```
/// use evsock_client::protocol::binary;
///
/// let frame = binary::attach(b"payload", "ab").unwrap();
/// assert_eq!(frame[0], 2);
/// assert_eq!(&frame[1..5], &[b'a', 0, b'b', 0]);
/// assert_eq!(&frame[5..], b"payload");
/// ```
pub fn attach(payload: &[u8], metadata: &str) -> Result<Bytes> {
    if metadata.is_empty() {
        return Ok(Bytes::copy_from_slice(payload));
    }

    let units: Vec<u16> = metadata.encode_utf16().collect();
    if units.len() > MAX_METADATA_UNITS {
        return Err(Error::MetadataTooLong { len: units.len() });
    }

    let mut buf = BytesMut::with_capacity(LEN_FIELD_SIZE + units.len() * 2 + payload.len());
    buf.put_u8(units.len() as u8);
    for unit in &units {
        buf.put_u16_le(*unit);
    }
    buf.put_slice(payload);

    Ok(buf.freeze())
}

/// Strip the metadata header from a frame, returning the payload.
///
/// The returned `Bytes` is a zero-copy slice of the input.
///
/// # Errors
///
/// Returns [`Error::TruncatedFrame`] if the frame is shorter than its
/// declared header.
pub fn detach(frame: &Bytes) -> Result<Bytes> {
    let header = header_size(frame)?;
    Ok(frame.slice(header..))
}

/// Read the metadata string back out of a frame.
///
/// # Errors
///
/// Returns [`Error::TruncatedFrame`] if the frame is shorter than its
/// declared header, or [`Error::Protocol`] if the stored code units are
/// not valid UTF-16.
pub fn extract_metadata(frame: &[u8]) -> Result<String> {
    let header = header_size(frame)?;
    let count = (header - LEN_FIELD_SIZE) / 2;

    let mut units = Vec::with_capacity(count);
    for i in 0..count {
        let offset = LEN_FIELD_SIZE + i * 2;
        units.push(u16::from_le_bytes([frame[offset], frame[offset + 1]]));
    }

    String::from_utf16(&units)
        .map_err(|_| Error::Protocol("frame metadata is not valid UTF-16".to_string()))
}

/// Compute the header size (length field + metadata) declared by a frame.
fn header_size(frame: &[u8]) -> Result<usize> {
    let Some(&count) = frame.first() else {
        return Err(Error::TruncatedFrame {
            needed: LEN_FIELD_SIZE,
            actual: 0,
        });
    };

    let header = LEN_FIELD_SIZE + count as usize * 2;
    if frame.len() < header {
        return Err(Error::TruncatedFrame {
            needed: header,
            actual: frame.len(),
        });
    }

    Ok(header)
}
