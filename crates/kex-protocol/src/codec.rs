//! Base64 transport encoding for opaque key material
//!
//! The codec never looks inside the bytes; length checks belong to the KEM layer.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{ProtocolError, ProtocolResult};

/// Encode bytes for a JSON field
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 JSON field, naming the field in the error
pub fn decode_field(field: &'static str, value: &str) -> ProtocolResult<Vec<u8>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::MissingField(field));
    }

    STANDARD
        .decode(trimmed)
        .map_err(|source| ProtocolError::InvalidEncoding { field, source })
}
