//! KEM session error types

use kex_protocol::ErrorCode;
use thiserror::Error;

/// Which piece of key material failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMaterial {
    PublicKey,
    PrivateKey,
    Ciphertext,
}

impl std::fmt::Display for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::PublicKey => "public key",
            Self::PrivateKey => "private key",
            Self::Ciphertext => "ciphertext",
        })
    }
}

/// Cryptographic operation error
#[derive(Debug, Error)]
pub enum KemError {
    #[error("Invalid {kind} length: expected {expected}, got {actual}")]
    InvalidKeyMaterial {
        kind: KeyMaterial,
        expected: usize,
        actual: usize,
    },

    #[error("KEM provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("KEM {operation} failed: {reason}")]
    KemOperationFailed {
        operation: &'static str,
        reason: String,
    },
}

impl KemError {
    pub(crate) fn operation_failed(operation: &'static str, reason: impl ToString) -> Self {
        Self::KemOperationFailed {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidKeyMaterial { .. } => ErrorCode::InvalidKeyMaterial,
            Self::ProviderUnavailable(_) => ErrorCode::ProviderUnavailable,
            Self::KemOperationFailed { .. } => ErrorCode::KemOperationFailed,
        }
    }
}

pub type KemResult<T> = Result<T, KemError>;

/// Session store error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session TTL must be greater than zero")]
    InvalidTtl,

    #[error("Session TTL of {requested_secs}s exceeds the maximum of {max_secs}s")]
    TtlTooLong { requested_secs: u64, max_secs: u64 },

    #[error("Session TTL overflows the clock")]
    TtlOverflow,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key exchange error
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No private key found in session {0}")]
    MissingPrivateKey(String),

    #[error(transparent)]
    Kem(#[from] KemError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ExchangeError {
    /// Stable error code for callers
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SessionNotFound(_) => ErrorCode::SessionNotFound,
            Self::MissingPrivateKey(_) => ErrorCode::MissingPrivateKey,
            Self::Kem(e) => e.code(),
            Self::Store(_) => ErrorCode::Internal,
        }
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
