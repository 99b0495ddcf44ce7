//! Error types for the protocol

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol error
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid base64 in field `{field}`: {source}")]
    InvalidEncoding {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl ProtocolError {
    /// Stable error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidEncoding { .. } => ErrorCode::InvalidEncoding,
            Self::MissingField(_) => ErrorCode::InvalidKeyMaterial,
        }
    }
}

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Stable, machine-readable failure category.
///
/// These strings are part of the public API: callers branch on them to tell
/// an expired session apart from malformed input or a degraded backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Key or ciphertext has the wrong length for the configured algorithm
    InvalidKeyMaterial,
    /// Key material was not valid base64
    InvalidEncoding,
    /// The KEM backend could not be initialized
    ProviderUnavailable,
    /// A cryptographic call failed unexpectedly
    KemOperationFailed,
    /// Unknown or expired session
    SessionNotFound,
    /// Session exists but holds no private key
    MissingPrivateKey,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidKeyMaterial => "invalid_key_material",
            Self::InvalidEncoding => "invalid_encoding",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::KemOperationFailed => "kem_operation_failed",
            Self::SessionNotFound => "session_not_found",
            Self::MissingPrivateKey => "missing_private_key",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
